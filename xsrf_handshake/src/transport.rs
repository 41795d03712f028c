use async_trait::async_trait;
use http::{Request, Response};
use hyper::{client::HttpConnector, Body, Client as HyperClient};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};

use crate::error::Error;

/// Dispatches a finalized request over the wire.
///
/// Injected into the client so tests can swap the network for an in-process
/// double. Responses come back fully buffered; the bodies this demo moves
/// around are small JSON documents.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error>;
}

/// Default transport: a hyper client with an HTTPS-capable connector.
pub struct HyperTransport {
    inner: HyperClient<HttpsConnector<HttpConnector>, Body>,
}

impl HyperTransport {
    pub fn new() -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        Self {
            inner: HyperClient::builder().build(connector),
        }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn dispatch(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, Error> {
        let response = self
            .inner
            .request(request.map(Body::from))
            .await
            .map_err(|error| Error::Transport(error.into()))?;

        let (parts, body) = response.into_parts();
        let bytes = hyper::body::to_bytes(body)
            .await
            .map_err(|error| Error::Transport(error.into()))?;

        Ok(Response::from_parts(parts, bytes.to_vec()))
    }
}
