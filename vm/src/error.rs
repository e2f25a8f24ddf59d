use core::fmt;

use syntax::SemanticIssue;
use thiserror::Error;

/// Category of a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MessageNotUnderstood,
    ClassMessageSentToInstance,
    IndexOutOfRange,
    BlockCannotReturn,
    StackUnderflow,
    UndefinedGlobal,
    MismatchedBlockArg,
    UnknownClass,
    UnknownField,
    TypeError,
    /// Malformed code or a broken VM invariant.
    InternalVmException,
    /// Raised by program code (`error:`) and arithmetic faults.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A runtime failure with the frame chain at the point it was raised.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct VmError {
    pub kind: ErrorKind,
    pub message: String,
    /// One line per active frame, innermost first. Empty until the
    /// interpreter attaches it.
    pub trace: String,
}

impl VmError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: String::new(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalVmException, message)
    }

    pub fn stack_underflow() -> Self {
        Self::new(ErrorKind::StackUnderflow, "operand stack is empty")
    }

    pub fn type_error(expected: &str, got: &object::Value) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("expected {expected}, got {}", got.debug_string()),
        )
    }

    /// Message followed by the stack trace.
    pub fn report(&self) -> String {
        if self.trace.is_empty() {
            self.to_string()
        } else {
            format!("{self}\n{}", self.trace.trim_end())
        }
    }
}

impl From<bytecode::DecodeError> for VmError {
    fn from(err: bytecode::DecodeError) -> Self {
        VmError::internal(err.to_string())
    }
}

/// Every problem found while compiling a file.
#[derive(Debug, Clone, Error)]
#[error("{}", render_issues(.issues))]
pub struct CompileError {
    pub issues: Vec<SemanticIssue>,
}

fn render_issues(issues: &[SemanticIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] VmError),
}

pub type Result<T, E = VmError> = std::result::Result<T, E>;
