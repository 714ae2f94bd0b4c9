use thiserror::Error;

/// Errors raised while resolving, fetching, or caching subtitles.
#[derive(Error, Debug)]
pub enum QvError {
    #[error("invalid YouTube URL: {0}")]
    Validation(String),

    #[error("could not extract video ID from: {0}")]
    IdExtraction(String),

    #[error("no subtitles available for video {0}")]
    SubtitleUnavailable(String),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QvError {
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        QvError::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QvError>;
