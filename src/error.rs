/// Errors returned by the detector and the frame driver.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid frame: {width}x{height}")]
    InvalidInput { width: u32, height: u32 },
    #[error("no video source given")]
    MissingSourceArgument,
    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("video source contains no frames")]
    EmptySource,
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, DetectError>;
