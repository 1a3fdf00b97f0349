use crate::hardware::DriverError;

/// Errors surfaced to HTTP and RPC callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("No valid strip named {0}")]
    StripNotFound(String),

    #[error("Invalid requested action '{0}'")]
    InvalidAction(String),

    #[error("Unsupported request: {0}")]
    UnsupportedRequest(String),

    #[error("No arguments provided")]
    NoArguments,

    #[error("Missing argument '{0}'")]
    MissingArgument(String),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Pixel index {index} out of range for strip {strip} (1..={chain_count})")]
    PixelOutOfRange {
        strip: String,
        index: usize,
        chain_count: usize,
    },

    #[error("{strip}: driver error: {source}")]
    Driver { strip: String, source: DriverError },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
