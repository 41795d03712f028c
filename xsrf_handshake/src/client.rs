use http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    cookie::CookieJar,
    error::Error,
    interceptor::{RequestInterceptor, XsrfInterceptor},
    transport::{HyperTransport, Transport},
};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Builder for the client wrapper.
pub struct ClientBuilder {
    base_url: String,
    jar: Option<CookieJar>,
    interceptors: Vec<Box<dyn RequestInterceptor>>,
    transport: Option<Box<dyn Transport>>,
}

impl ClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            jar: None,
            interceptors: Vec::new(),
            transport: None,
        }
    }

    /// Attach a cookie jar, enabling credential mode: the jar's cookies ride
    /// along on every request and every response's `Set-Cookie` is ingested.
    pub fn cookie_jar(mut self, jar: CookieJar) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Append a request interceptor. Interceptors run in the order they were
    /// added, each receiving the previous one's output.
    pub fn interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// Replace the default hyper transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self) -> Client {
        Client {
            base_url: self.base_url,
            jar: self.jar,
            interceptors: self.interceptors,
            transport: self
                .transport
                .unwrap_or_else(|| Box::new(HyperTransport::new())),
        }
    }
}

/// HTTP client wrapper around a fixed base URL.
///
/// Stateless beyond its construction-time configuration; concurrent calls
/// are independent and each reads the cookie store fresh at send time.
pub struct Client {
    base_url: String,
    jar: Option<CookieJar>,
    interceptors: Vec<Box<dyn RequestInterceptor>>,
    transport: Box<dyn Transport>,
}

impl Client {
    /// The standard handshake configuration: a fresh cookie jar with the
    /// CSRF interceptor wired to it.
    pub fn new(base_url: impl Into<String>) -> Self {
        let jar = CookieJar::new();
        Self::builder(base_url)
            .cookie_jar(jar.clone())
            .interceptor(XsrfInterceptor::new(jar))
            .build()
    }

    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// The jar this client reads and stores cookies through, if any.
    pub fn cookie_jar(&self) -> Option<&CookieJar> {
        self.jar.as_ref()
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(Error::EncodeBody)?;
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body).map_err(Error::EncodeBody)?;
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.execute(Method::DELETE, path, None).await
    }

    async fn execute(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Response> {
        let uri: Uri = format!("{}{path}", self.base_url).parse()?;

        let mut builder = Request::builder().method(method.clone()).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let mut request = builder.body(body.unwrap_or_default())?;

        // Credential mode: the store's cookies accompany every request.
        if let Some(jar) = &self.jar {
            if let Some(cookies) = jar.cookie_header() {
                request
                    .headers_mut()
                    .insert(header::COOKIE, HeaderValue::from_str(&cookies)?);
            }
        }

        for interceptor in &self.interceptors {
            request = interceptor.intercept(request)?;
        }

        tracing::debug!(method = %method, path, "dispatching request");
        let response = self.transport.dispatch(request).await?;

        if let Some(jar) = &self.jar {
            jar.store_response_cookies(
                response
                    .headers()
                    .get_all(header::SET_COOKIE)
                    .iter()
                    .filter_map(|value| value.to_str().ok()),
            );
        }

        Ok(Response { inner: response })
    }
}

/// A buffered HTTP response.
///
/// The client never inspects the status itself; interpreting a 403 (or any
/// other status) belongs to the caller.
#[derive(Debug)]
pub struct Response {
    inner: http::Response<Vec<u8>>,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Consume the response, yielding the raw body.
    pub fn bytes(self) -> Vec<u8> {
        self.inner.into_body()
    }

    /// Deserialize the body as JSON into a `serde` enabled structure.
    pub fn json<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(&self.inner.into_body()).map_err(Error::DecodeBody)
    }

    /// Turn a non-2xx response into an [`Error::Status`], for callers that
    /// want failed requests as errors rather than statuses to match on.
    pub fn error_for_status(self) -> Result<Self> {
        if self.inner.status().is_success() {
            Ok(self)
        } else {
            Err(Error::Status(self.inner.status()))
        }
    }
}
