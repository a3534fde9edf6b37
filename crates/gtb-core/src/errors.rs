/// Core error type.
///
/// Adapter crates should map their specific errors into this type so the
/// pipeline can handle failures consistently (fatal-to-the-run vs counted
/// per-member).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("user client not initialized: {0}")]
    ClientInit(String),

    #[error("cannot resolve {reference}: {reason}")]
    Resolution { reference: String, reason: String },

    #[error("flood wait of {wait_seconds}s exceeds the {ceiling_seconds}s ceiling")]
    FloodWaitExceeded {
        wait_seconds: u64,
        ceiling_seconds: u64,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
