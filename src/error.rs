use thiserror::Error;

#[derive(Error, Debug)]
pub enum HlaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    
    #[error("Invalid HLA profile: {0}")]
    InvalidProfile(String),
    
    #[error("Frequency data unavailable: {0}")]
    DataSource(String),
}

pub type HlaResult<T> = Result<T, HlaError>;
