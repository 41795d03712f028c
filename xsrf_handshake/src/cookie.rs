use std::sync::{Arc, Mutex, PoisonError};

use percent_encoding::percent_decode_str;

/// Name of the cookie the backend issues the CSRF token under.
pub const XSRF_TOKEN_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Name of the header the token is echoed back in on protected requests.
pub const XSRF_TOKEN_HEADER_NAME: &str = "X-XSRF-TOKEN";

/// A source of cookie values, injected wherever a component needs to read
/// the ambient cookie store.
///
/// Absence is a normal outcome, not an error: a missing store reads the
/// same as a missing cookie.
pub trait CookieSource: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// A cookie source with no backing store, the equivalent of running outside
/// a browser context. Every lookup is absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCookieStore;

impl CookieSource for NoCookieStore {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
}

/// In-memory stand-in for a browser-managed cookie store.
///
/// Clones share the same store. The jar keeps cookie values verbatim as the
/// server sent them and ignores attributes like path, domain, and expiry;
/// it models the store of a single origin for the lifetime of the process.
#[derive(Clone, Debug, Default)]
pub struct CookieJar {
    inner: Arc<Mutex<Vec<(String, String)>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest `Set-Cookie` header values from a response.
    ///
    /// A cookie that already exists is updated in place, so the store never
    /// holds two entries under the same name.
    pub fn store_response_cookies<'a, I>(&self, headers: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        for header in headers {
            let Some((name, value)) = parse_set_cookie(header) else {
                continue;
            };
            if let Some(slot) = inner.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = value;
            } else {
                inner.push((name, value));
            }
        }
    }

    /// Serialize the store into a `Cookie` request header value, or `None`
    /// when the store is empty.
    pub fn cookie_header(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.is_empty() {
            return None;
        }
        Some(
            inner
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Drop every cookie, as if the browser store had been cleared.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl CookieSource for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        read_cookie(&self.cookie_header()?, name)
    }
}

/// Extract the value of the named cookie from a `"; "`-concatenated cookie
/// string, percent-decoding it.
///
/// Deterministic first-match: if several segments carry the same name, the
/// first one wins. A missing cookie is `None`, never an error.
pub fn read_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies.split("; ").find_map(|segment| {
        let (segment_name, value) = segment.split_once('=')?;
        (segment_name == name).then(|| decode_value(value))
    })
}

/// Split a `Set-Cookie` header into its `name=value` pair, dropping the
/// attributes after the first `;`.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_owned(), value.trim().to_owned()))
}

fn decode_value(value: &str) -> String {
    // A value with malformed escapes is returned verbatim; reading never fails.
    percent_decode_str(value)
        .decode_utf8()
        .map_or_else(|_| value.to_owned(), |decoded| decoded.into_owned())
}
