use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host cannot provide the capability at all (no HTTP stack, no audio device).
    #[error("Bridge capability not available: {0}")]
    Unavailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The persistent key/value store rejected a read or write.
    #[error("Settings store error: {0}")]
    Settings(String),

    #[error("Media device error: {0}")]
    DeviceError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
