use handoff::HandoffError;
use thiserror::Error;

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod event_loop;

pub use bridge::{BridgeBuilder, BridgeState, EventBridge};
pub use code_event::{CodeEvent, CodeEventType, EventRecord, RawCodeEvent};
pub use config::{BridgeConfig, Config, LoopConfig};
pub use dispatcher::{CodeEventDispatcher, CodeEventHandler, Instrumentation, RegistrationId};
pub use event_loop::{EventLoop, Token};

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("System error: {0}")]
    Nix(#[from] nix::Error),
    #[error("handoff error: {0}")]
    Handoff(#[from] HandoffError),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("registration rejected: {0}")]
    Registration(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
