use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl MatchError {
    /// Machine-stable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::InvalidConfig(_) => "invalid_config",
            MatchError::InvalidTemplate(_) => "invalid_template",
            MatchError::InvalidImage(_) => "invalid_image",
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
