use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of code a VM reports through its code-event interface.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeEventType {
    Unknown,
    Builtin,
    Callback,
    Eval,
    Function,
    InterpretedFunction,
    Handler,
    BytecodeHandler,
    LazyCompile,
    RegExp,
    Script,
    Stub,
    Relocation,
}

impl CodeEventType {
    pub const ALL: [CodeEventType; 13] = [
        CodeEventType::Unknown,
        CodeEventType::Builtin,
        CodeEventType::Callback,
        CodeEventType::Eval,
        CodeEventType::Function,
        CodeEventType::InterpretedFunction,
        CodeEventType::Handler,
        CodeEventType::BytecodeHandler,
        CodeEventType::LazyCompile,
        CodeEventType::RegExp,
        CodeEventType::Script,
        CodeEventType::Stub,
        CodeEventType::Relocation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CodeEventType::Unknown => "Unknown",
            CodeEventType::Builtin => "Builtin",
            CodeEventType::Callback => "Callback",
            CodeEventType::Eval => "Eval",
            CodeEventType::Function => "Function",
            CodeEventType::InterpretedFunction => "InterpretedFunction",
            CodeEventType::Handler => "Handler",
            CodeEventType::BytecodeHandler => "BytecodeHandler",
            CodeEventType::LazyCompile => "LazyCompile",
            CodeEventType::RegExp => "RegExp",
            CodeEventType::Script => "Script",
            CodeEventType::Stub => "Stub",
            CodeEventType::Relocation => "Relocation",
        }
    }
}

impl Display for CodeEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown code event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for CodeEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodeEventType::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Producer-side view of a code event.
///
/// Implementations typically borrow VM-owned memory that is only valid while
/// the VM's callback is running. Use [`EventRecord::capture`] to keep any of
/// it past that point.
pub trait CodeEvent {
    fn code_start_address(&self) -> usize;

    /// Start address the code had before it was moved, for VMs that report it.
    fn previous_code_start_address(&self) -> Option<usize> {
        None
    }

    fn code_size(&self) -> usize;
    fn function_name(&self) -> &str;
    fn script_name(&self) -> &str;
    fn script_line(&self) -> i32;
    fn script_column(&self) -> i32;
    fn code_type(&self) -> CodeEventType;
    fn comment(&self) -> &str;
}

/// Borrowed descriptor for embedders that assemble events from their own
/// structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCodeEvent<'a> {
    pub address: usize,
    pub previous_address: Option<usize>,
    pub size: usize,
    pub function_name: &'a str,
    pub script_name: &'a str,
    pub line: i32,
    pub column: i32,
    pub code_type: CodeEventType,
    pub comment: &'a str,
}

impl<'a> RawCodeEvent<'a> {
    pub fn new(code_type: CodeEventType, address: usize, size: usize) -> Self {
        RawCodeEvent {
            address,
            previous_address: None,
            size,
            function_name: "",
            script_name: "",
            line: 0,
            column: 0,
            code_type,
            comment: "",
        }
    }
}

impl<'a> CodeEvent for RawCodeEvent<'a> {
    fn code_start_address(&self) -> usize {
        self.address
    }

    fn previous_code_start_address(&self) -> Option<usize> {
        self.previous_address
    }

    fn code_size(&self) -> usize {
        self.size
    }

    fn function_name(&self) -> &str {
        self.function_name
    }

    fn script_name(&self) -> &str {
        self.script_name
    }

    fn script_line(&self) -> i32 {
        self.line
    }

    fn script_column(&self) -> i32 {
        self.column
    }

    fn code_type(&self) -> CodeEventType {
        self.code_type
    }

    fn comment(&self) -> &str {
        self.comment
    }
}

/// Owned copy of a code event, safe to move to another thread and keep.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    address: usize,
    previous_address: Option<usize>,
    size: usize,
    function_name: String,
    script_name: String,
    line: i32,
    column: i32,
    #[serde(rename = "type")]
    event_type: CodeEventType,
    comment: String,
}

impl EventRecord {
    /// Copies every field out of `event`. Must run inside the VM callback
    /// that handed out `event`.
    pub fn capture<E: CodeEvent + ?Sized>(event: &E) -> Self {
        EventRecord {
            address: event.code_start_address(),
            previous_address: event.previous_code_start_address(),
            size: event.code_size(),
            function_name: event.function_name().to_owned(),
            script_name: event.script_name().to_owned(),
            line: event.script_line(),
            column: event.script_column(),
            event_type: event.code_type(),
            comment: event.comment().to_owned(),
        }
    }

    pub fn address(&self) -> usize {
        self.address
    }

    /// `None` when the producing VM does not report previous addresses.
    pub fn previous_address(&self) -> Option<usize> {
        self.previous_address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn line(&self) -> i32 {
        self.line
    }

    pub fn column(&self) -> i32 {
        self.column
    }

    pub fn event_type(&self) -> CodeEventType {
        self.event_type
    }

    pub fn type_name(&self) -> &'static str {
        self.event_type.name()
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}
