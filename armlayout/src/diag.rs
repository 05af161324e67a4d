//! Non-fatal diagnostics. Modeled after the teacher's hand-rolled `Error`
//! (message + optional boxed cause) rather than `thiserror`: layout keeps
//! running after one of these so a caller sees the complete list in a
//! single pass, the same way the original linker's `diag()` calls never
//! unwind.

use std::error::Error as StdError;
use std::fmt;

/// A single malformed-input diagnostic collected during layout.
pub struct Diagnostic {
    message: String,
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Diagnostic {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diagnostic({})", self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Diagnostic {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}

/// A fatal diagnostic: the layout cannot continue (an oversized
/// instruction, or an opcode the table has no entry for at all). The
/// original linker calls `sysfatal` for these; here the driver returns
/// `Err` immediately instead of aborting the process.
#[derive(Debug)]
pub struct Fatal(pub String);

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for Fatal {}
