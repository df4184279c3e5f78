use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Transport failure or a non-2xx status.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body arrived but did not have the expected shape.
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}
