#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("empty url")]
    EmptyUrl,
    #[error("unsupported url: {0}")]
    InvalidUrl(String),
    #[error("invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("parsing error: {0}")]
    ParsingError(String),
}
