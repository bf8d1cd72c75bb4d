use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal conditions of a generation call. Unsupported statements are not
/// errors; they are skipped during traversal.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("render failed: {0}")]
    Render(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}
