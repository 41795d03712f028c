use std::sync::Arc;

use http::{header::HeaderName, HeaderValue, Method, Request};

use crate::{
    cookie::{CookieSource, XSRF_TOKEN_COOKIE_NAME},
    error::Error,
};

/// A transform applied to an outgoing request before it is dispatched.
///
/// The client runs its interceptors as an explicit ordered list, composed
/// left to right. An error aborts the call and reaches the caller unmodified.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: Request<Vec<u8>>) -> Result<Request<Vec<u8>>, Error>;
}

/// Copies the CSRF token from the cookie store into a request header on
/// state-changing methods, completing the double submit pattern.
///
/// This is the only component that writes the token header: it is set if
/// and only if the method is protected and the cookie exists at call time.
/// A missing token is not a client-side error; the request goes out as-is
/// and the server decides.
pub struct XsrfInterceptor {
    cookies: Arc<dyn CookieSource>,
    cookie_name: String,
    header_name: HeaderName,
}

impl XsrfInterceptor {
    /// CSRF interceptor with the well-known `XSRF-TOKEN` / `X-XSRF-TOKEN`
    /// cookie and header names.
    pub fn new(cookies: impl CookieSource + 'static) -> Self {
        Self::with_names(
            cookies,
            XSRF_TOKEN_COOKIE_NAME,
            HeaderName::from_static("x-xsrf-token"),
        )
    }

    /// CSRF interceptor with custom cookie and header names, for backends
    /// that deviate from the usual pair.
    pub fn with_names(
        cookies: impl CookieSource + 'static,
        cookie_name: impl Into<String>,
        header_name: HeaderName,
    ) -> Self {
        Self {
            cookies: Arc::new(cookies),
            cookie_name: cookie_name.into(),
            header_name,
        }
    }
}

/// State-changing methods requiring CSRF validation. Matched on the method
/// string so nonstandard spellings behave like the uppercase constants.
fn is_protected(method: &Method) -> bool {
    method.as_str().eq_ignore_ascii_case("POST")
        || method.as_str().eq_ignore_ascii_case("PUT")
        || method.as_str().eq_ignore_ascii_case("DELETE")
}

impl RequestInterceptor for XsrfInterceptor {
    fn intercept(&self, mut request: Request<Vec<u8>>) -> Result<Request<Vec<u8>>, Error> {
        if !is_protected(request.method()) {
            return Ok(request);
        }
        let Some(token) = self.cookies.get(&self.cookie_name) else {
            tracing::debug!(
                cookie = %self.cookie_name,
                "no CSRF cookie present, request left unmodified"
            );
            return Ok(request);
        };
        let value = HeaderValue::from_str(&token)?;
        request.headers_mut().insert(self.header_name.clone(), value);
        Ok(request)
    }
}
