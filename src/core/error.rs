use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    Internal,
    CorruptIndex,        // Decoded postings or file structure violate invariants
    UnsupportedNode,     // Cursor lacks a capability the operation needs
    ConfigLoad,          // Session configuration or synthetic counts unusable
    InvalidCursorState,  // Reading a Done cursor, or count() off a match
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn corrupt_index(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::CorruptIndex, context.into())
    }

    pub fn unsupported_node(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::UnsupportedNode, context.into())
    }

    pub fn config_load(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::ConfigLoad, context.into())
    }

    pub fn invalid_cursor_state(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidCursorState, context.into())
    }

    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidArgument, context.into())
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::CorruptIndex,
            context: format!("Header decode failed: {}", err),
        }
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error {
            kind: ErrorKind::CorruptIndex,
            context: format!("FST error: {}", err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::ConfigLoad,
            context: format!("Invalid configuration: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
