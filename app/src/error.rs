//! The CLI's own error type: a message plus an optional boxed cause,
//! matching the library crates' hand-rolled `Fatal`/`QrError` rather than
//! reaching for `anyhow` at this one call site.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

pub struct Error(Box<ErrorInner>);

struct ErrorInner {
    message: Cow<'static, str>,
    cause: Option<Box<dyn StdError + 'static>>,
}

impl Error {
    pub fn msg<M>(message: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        Error(Box::new(ErrorInner {
            message: message.into(),
            cause: None,
        }))
    }

    pub fn new<M>(message: M, cause: Box<dyn StdError + 'static>) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        Error(Box::new(ErrorInner {
            message: message.into(),
            cause: Some(cause),
        }))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.cause.as_deref()
    }
}

impl From<armlayout::Fatal> for Error {
    fn from(fatal: armlayout::Fatal) -> Self {
        Error::new("layout failed", Box::new(fatal))
    }
}

impl From<qrgen::QrError> for Error {
    fn from(err: qrgen::QrError) -> Self {
        Error::new("QR encoding failed", Box::new(err))
    }
}
