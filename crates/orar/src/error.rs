#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No PDF link matching {pattern:?} found on {url}")]
    LinkNotFound { url: String, pattern: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Config error: {0}")]
    Config(String),
}
