mod client;
mod cookie;
mod error;
mod interceptor;
mod transport;

#[cfg(test)]
mod tests;

pub use client::{Client, ClientBuilder, Response};
pub use cookie::{
    read_cookie, CookieJar, CookieSource, NoCookieStore, XSRF_TOKEN_COOKIE_NAME,
    XSRF_TOKEN_HEADER_NAME,
};
pub use error::Error;
pub use interceptor::{RequestInterceptor, XsrfInterceptor};
pub use transport::{HyperTransport, Transport};
