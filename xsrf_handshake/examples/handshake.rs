//! Walks through the full CSRF handshake against a running backend.
//!
//! Start the backend first (`cargo run -p xsrf_handshake_backend`), then run
//! this example. It issues a GET to `/hello` to establish a session and
//! receive the `XSRF-TOKEN` cookie, then POSTs to `/secure-data`; the
//! client copies the token from the cookie into the `X-XSRF-TOKEN` header
//! on the way out.

use serde::Deserialize;
use xsrf_handshake::{Client, CookieSource, XSRF_TOKEN_COOKIE_NAME};

#[derive(Debug, Deserialize)]
struct Hello {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SecureData {
    status: String,
    received: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = Client::new("http://127.0.0.1:8000");

    println!("-> GET /hello (establishes the session)");
    let hello: Hello = client.get("/hello").await?.error_for_status()?.json()?;
    println!("   status: {}", hello.message);

    let token = client
        .cookie_jar()
        .and_then(|jar| jar.get(XSRF_TOKEN_COOKIE_NAME));
    match token {
        Some(token) => println!("   cookie {XSRF_TOKEN_COOKIE_NAME} = {token}"),
        None => println!("   no {XSRF_TOKEN_COOKIE_NAME} cookie received"),
    }

    println!("-> POST /secure-data (token copied into the header)");
    let response = client
        .post("/secure-data", &serde_json::json!({ "content": "My secret message" }))
        .await?;

    if response.status().as_u16() == 403 {
        println!("   forbidden (403): CSRF token validation failed");
    } else {
        let data: SecureData = response.error_for_status()?.json()?;
        println!("   server accepted: status={} received={:?}", data.status, data.received);
    }

    Ok(())
}
