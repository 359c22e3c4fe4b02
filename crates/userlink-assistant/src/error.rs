use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    /// No API key was configured, so no remote call can be made.
    #[error("OpenAI API key is not set")]
    MissingApiKey,

    /// The remote service answered with a non-success status.
    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport or body decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
