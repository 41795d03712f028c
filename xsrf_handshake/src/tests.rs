use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{header, Request, Response as HttpResponse, StatusCode};

use crate::{
    read_cookie, Client, CookieJar, CookieSource, Error, NoCookieStore, RequestInterceptor,
    Transport, XsrfInterceptor, XSRF_TOKEN_HEADER_NAME,
};

/// Transport double that records the request it was handed and answers with
/// a canned response.
#[derive(Clone, Default)]
struct RecordingTransport {
    seen: Arc<Mutex<Option<Request<Vec<u8>>>>>,
    status: Option<u16>,
    set_cookies: Vec<&'static str>,
}

impl RecordingTransport {
    fn taken(&self) -> Option<Request<Vec<u8>>> {
        self.seen.lock().unwrap().take()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn dispatch(&self, request: Request<Vec<u8>>) -> Result<HttpResponse<Vec<u8>>, Error> {
        *self.seen.lock().unwrap() = Some(request);
        let mut builder = HttpResponse::builder().status(self.status.unwrap_or(200));
        for cookie in &self.set_cookies {
            builder = builder.header(header::SET_COOKIE, *cookie);
        }
        Ok(builder.body(b"{}".to_vec()).unwrap())
    }
}

fn handshake_client(transport: RecordingTransport) -> (Client, CookieJar) {
    let jar = CookieJar::new();
    let client = Client::builder("http://backend.test/api")
        .cookie_jar(jar.clone())
        .interceptor(XsrfInterceptor::new(jar.clone()))
        .transport(transport)
        .build();
    (client, jar)
}

#[tokio::test]
async fn post_without_cookie_sends_no_token_header() {
    let transport = RecordingTransport::default();
    let (client, _) = handshake_client(transport.clone());

    client.post("/secure-data", &"hi").await.unwrap();

    let seen = transport.taken().unwrap();
    assert!(!seen.headers().contains_key(XSRF_TOKEN_HEADER_NAME));
}

#[tokio::test]
async fn post_with_cookie_copies_token_into_header() {
    let transport = RecordingTransport::default();
    let (client, jar) = handshake_client(transport.clone());
    jar.store_response_cookies(["XSRF-TOKEN=abc123; Path=/"]);

    client.post("/secure-data", &"hi").await.unwrap();

    let seen = transport.taken().unwrap();
    assert_eq!(
        seen.headers().get(XSRF_TOKEN_HEADER_NAME).unwrap(),
        "abc123"
    );
}

#[tokio::test]
async fn safe_methods_never_carry_the_token_header() {
    let transport = RecordingTransport::default();
    let (client, jar) = handshake_client(transport.clone());
    jar.store_response_cookies(["XSRF-TOKEN=abc123"]);

    client.get("/hello").await.unwrap();

    let seen = transport.taken().unwrap();
    assert!(!seen.headers().contains_key(XSRF_TOKEN_HEADER_NAME));
    // ... but the cookie itself still rides along (credential mode)
    assert_eq!(
        seen.headers().get(header::COOKIE).unwrap(),
        "XSRF-TOKEN=abc123"
    );
}

#[tokio::test]
async fn put_and_delete_are_protected_methods() {
    let transport = RecordingTransport::default();
    let (client, jar) = handshake_client(transport.clone());
    jar.store_response_cookies(["XSRF-TOKEN=abc123"]);

    client.put("/secure-data", &"hi").await.unwrap();
    let seen = transport.taken().unwrap();
    assert_eq!(
        seen.headers().get(XSRF_TOKEN_HEADER_NAME).unwrap(),
        "abc123"
    );

    client.delete("/secure-data").await.unwrap();
    let seen = transport.taken().unwrap();
    assert_eq!(
        seen.headers().get(XSRF_TOKEN_HEADER_NAME).unwrap(),
        "abc123"
    );
}

#[test]
fn absent_store_reads_as_none_and_never_panics() {
    assert_eq!(NoCookieStore.get("XSRF-TOKEN"), None);
    assert_eq!(NoCookieStore.get(""), None);
}

#[tokio::test]
async fn interceptor_over_absent_store_leaves_request_alone() {
    let transport = RecordingTransport::default();
    let client = Client::builder("http://backend.test")
        .interceptor(XsrfInterceptor::new(NoCookieStore))
        .transport(transport.clone())
        .build();

    client.post("/secure-data", &"hi").await.unwrap();

    let seen = transport.taken().unwrap();
    assert!(!seen.headers().contains_key(XSRF_TOKEN_HEADER_NAME));
    assert!(!seen.headers().contains_key(header::COOKIE));
}

#[tokio::test]
async fn response_cookies_are_ingested_into_the_jar() {
    let transport = RecordingTransport {
        set_cookies: vec!["XSRF-TOKEN=tok1; Path=/; SameSite=Lax", "SESSION=s1"],
        ..RecordingTransport::default()
    };
    let (client, jar) = handshake_client(transport.clone());

    client.get("/hello").await.unwrap();
    assert_eq!(jar.get("XSRF-TOKEN").as_deref(), Some("tok1"));
    assert_eq!(jar.get("SESSION").as_deref(), Some("s1"));

    // The next mutating call picks the fresh token up.
    client.post("/secure-data", &"hi").await.unwrap();
    let seen = transport.taken().unwrap();
    assert_eq!(seen.headers().get(XSRF_TOKEN_HEADER_NAME).unwrap(), "tok1");
}

/// Appends its tag to a shared header, so ordering is observable.
struct Tag(&'static str);

impl RequestInterceptor for Tag {
    fn intercept(&self, mut request: Request<Vec<u8>>) -> Result<Request<Vec<u8>>, Error> {
        request.headers_mut().append("x-tag", self.0.parse()?);
        Ok(request)
    }
}

#[tokio::test]
async fn interceptors_run_left_to_right() {
    let transport = RecordingTransport::default();
    let client = Client::builder("http://backend.test")
        .interceptor(Tag("first"))
        .interceptor(Tag("second"))
        .transport(transport.clone())
        .build();

    client.get("/hello").await.unwrap();

    let seen = transport.taken().unwrap();
    let tags: Vec<_> = seen
        .headers()
        .get_all("x-tag")
        .iter()
        .map(|value| value.to_str().unwrap())
        .collect();
    assert_eq!(tags, ["first", "second"]);
}

struct Failing;

impl RequestInterceptor for Failing {
    fn intercept(&self, _request: Request<Vec<u8>>) -> Result<Request<Vec<u8>>, Error> {
        Err(Error::Interceptor("boom".into()))
    }
}

#[tokio::test]
async fn interceptor_errors_reach_the_caller_unmodified() {
    let transport = RecordingTransport::default();
    let client = Client::builder("http://backend.test")
        .interceptor(Failing)
        .transport(transport.clone())
        .build();

    let error = client.post("/secure-data", &"hi").await.unwrap_err();
    assert!(matches!(error, Error::Interceptor(_)));
    // The request never went out.
    assert!(transport.taken().is_none());
}

#[tokio::test]
async fn forbidden_surfaces_as_a_normal_response_for_the_caller() {
    let transport = RecordingTransport {
        status: Some(403),
        ..RecordingTransport::default()
    };
    let (client, _) = handshake_client(transport);

    // The wrapper itself does not act on the status...
    let response = client.post("/secure-data", &"hi").await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // ... classifying it is the caller's job.
    let error = response.error_for_status().unwrap_err();
    assert!(matches!(error, Error::Status(status) if status == StatusCode::FORBIDDEN));
}

#[test]
fn read_cookie_returns_the_named_value() {
    let cookies = "SESSION=s1; XSRF-TOKEN=abc123; theme=dark";
    assert_eq!(read_cookie(cookies, "XSRF-TOKEN").as_deref(), Some("abc123"));
    assert_eq!(read_cookie(cookies, "SESSION").as_deref(), Some("s1"));
}

#[test]
fn read_cookie_missing_name_is_absent() {
    assert_eq!(read_cookie("SESSION=s1", "XSRF-TOKEN"), None);
    assert_eq!(read_cookie("", "XSRF-TOKEN"), None);
}

#[test]
fn read_cookie_first_match_wins_on_name_collisions() {
    let cookies = "XSRF-TOKEN=first; XSRF-TOKEN=second";
    assert_eq!(read_cookie(cookies, "XSRF-TOKEN").as_deref(), Some("first"));
}

#[test]
fn read_cookie_percent_decodes_values() {
    assert_eq!(
        read_cookie("XSRF-TOKEN=a%20b%3D", "XSRF-TOKEN").as_deref(),
        Some("a b=")
    );
    // Malformed escapes come back verbatim rather than failing.
    assert_eq!(
        read_cookie("XSRF-TOKEN=%zz", "XSRF-TOKEN").as_deref(),
        Some("%zz")
    );
}

#[test]
fn read_cookie_keeps_equals_signs_inside_values() {
    assert_eq!(
        read_cookie("XSRF-TOKEN=aGk=", "XSRF-TOKEN").as_deref(),
        Some("aGk=")
    );
}

#[test]
fn jar_updates_cookies_in_place() {
    let jar = CookieJar::new();
    jar.store_response_cookies(["a=1", "b=2"]);
    jar.store_response_cookies(["a=3"]);
    assert_eq!(jar.cookie_header().as_deref(), Some("a=3; b=2"));

    jar.clear();
    assert_eq!(jar.cookie_header(), None);
    assert_eq!(jar.get("a"), None);
}
