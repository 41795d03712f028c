use rocket::{
    get,
    http::{CookieJar, Status},
    post, routes,
    serde::json::Json,
    Build, Rocket, State,
};
use serde::{Deserialize, Serialize};

mod session;


pub use session::{
    Session, SessionManager, XsrfGuard, XsrfGuardError, SESSION_COOKIE_NAME,
    XSRF_TOKEN_COOKIE_NAME, XSRF_TOKEN_HEADER_NAME,
};

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SecureDataRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SecureDataResponse {
    pub status: String,
    pub received: String,
}

/// Establishes a session and issues the `XSRF-TOKEN` cookie. A request that
/// already carries a live session keeps it; tokens are not rotated.
#[get("/hello")]
fn hello(
    session: Option<Session>,
    manager: &State<SessionManager>,
    cookies: &CookieJar<'_>,
) -> Result<Json<HelloResponse>, Status> {
    if session.is_none() {
        manager
            .establish(cookies)
            .map_err(|_| Status::InternalServerError)?;
    }
    Ok(Json(HelloResponse {
        message: "Hello! Session established, XSRF-TOKEN cookie issued.".to_owned(),
    }))
}

/// Accepts data only from requests that pass the double submit check; the
/// guard answers 403 otherwise.
#[post("/secure-data", format = "json", data = "<body>")]
fn secure_data(_guard: XsrfGuard, body: Json<SecureDataRequest>) -> Json<SecureDataResponse> {
    Json(SecureDataResponse {
        status: "ok".to_owned(),
        received: body.into_inner().content,
    })
}

pub fn build_rocket() -> Rocket<Build> {
    rocket::build()
        .mount("/", routes![hello, secure_data])
        .manage(SessionManager::new())
}
