use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bit index {index} out of range for width {width}")]
    Range { index: u32, width: u32 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("External invocation failed: {0}")]
    Invocation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
