use code_event::CodeEventType;
use serde::{Deserialize, Deserializer, Serialize};

use crate::Result;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default, rename = "loop")]
    pub event_loop: LoopConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Kinds to deliver; everything when unset. Accepts a list of names or a
    /// comma-separated string.
    #[serde(default, deserialize_with = "deserialize_accept")]
    pub accept: Option<Vec<CodeEventType>>,
}

impl BridgeConfig {
    pub fn accepts(&self, kind: CodeEventType) -> bool {
        self.accept
            .as_ref()
            .map_or(true, |accept| accept.contains(&kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            max_events: default_max_events(),
        }
    }
}

fn default_max_events() -> usize {
    16
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AcceptSpec {
    List(Vec<String>),
    Csv(String),
}

fn deserialize_accept<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<CodeEventType>>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match Option::<AcceptSpec>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(AcceptSpec::List(names)) => names,
        Some(AcceptSpec::Csv(csv)) => csv.split(',').map(str::to_owned).collect(),
    };

    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| name.parse().map_err(serde::de::Error::custom))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Some)
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
