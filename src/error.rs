use thiserror::Error;

use crate::media::MediaStoreError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Logging setup error: {0}")]
    Logging(#[from] tracing_appender::rolling::InitError),

    #[error("Media store error: {0}")]
    MediaStore(#[from] MediaStoreError),

    #[error("Indexing worker panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;
