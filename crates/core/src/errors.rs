use thiserror::Error;

/// Failure of a single JSON-RPC exchange with the media center.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("media center transport failure: {0}")]
    Transport(String),
    #[error("media center returned HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("media center response could not be decoded: {0}")]
    Decode(String),
    #[error("media center rejected `{method}` ({code}): {message}")]
    Rpc { method: String, code: i64, message: String },
    #[error("media center response to `{0}` carried no result")]
    MissingResult(String),
}

impl GatewayError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Transport(_) | Self::HttpStatus { .. } => "transport",
            Self::Decode(_) | Self::MissingResult(_) => "decode",
            Self::Rpc { .. } => "rpc",
        }
    }

    /// True when the server answered but refused the call, as opposed to being unreachable.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rpc { .. })
    }
}
