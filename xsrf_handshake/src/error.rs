use http::StatusCode;

/// Errors surfaced by the client wrapper.
///
/// Nothing here is caught or retried internally; every failure propagates
/// to the caller of the request that triggered it.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid request URI: {0}")]
    Uri(#[from] http::uri::InvalidUri),
    #[error("failed to construct request: {0}")]
    Request(#[from] http::Error),
    #[error("header value is not valid: {0}")]
    HeaderValue(#[from] http::header::InvalidHeaderValue),
    #[error("failed to encode request body: {0}")]
    EncodeBody(#[source] serde_json::Error),
    #[error("failed to decode response body: {0}")]
    DecodeBody(#[source] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    // For interceptors with failure modes of their own
    #[error("interceptor error: {0}")]
    Interceptor(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("server answered with status {0}")]
    Status(StatusCode),
}
