use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("TLE download from {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid TLE for {name}: {message}")]
    InvalidTle { name: String, message: String },
    #[error("Propagation error: {0}")]
    Propagation(String),
    #[error("Satellite not found in catalog: {0}")]
    SatelliteNotFound(String),
    #[error("No satellites loaded from {0}")]
    NoSatellites(String),
}
