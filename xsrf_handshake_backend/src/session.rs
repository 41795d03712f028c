use mini_moka::sync::Cache;
use rand::RngCore;
use rocket::{
    http::{Cookie, CookieJar, SameSite, Status},
    request::{FromRequest, Outcome, Request},
    State,
};

/// Cookie carrying the session ID. HttpOnly; the client never reads it.
pub const SESSION_COOKIE_NAME: &str = "SESSION";

/// Cookie carrying the CSRF token. Deliberately readable by the client:
/// the double submit pattern depends on the client echoing it back.
pub const XSRF_TOKEN_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Header the client echoes the token in on state-changing requests.
pub const XSRF_TOKEN_HEADER_NAME: &str = "X-XSRF-TOKEN";

/// Generates a random ID of the given length.
fn random_id(len: usize) -> Result<String, rand::Error> {
    let mut buf = vec![0; len];
    rand::thread_rng().try_fill_bytes(&mut buf)?;
    Ok(base64::encode_config(buf, base64::URL_SAFE_NO_PAD))
}

/// A session established by the hello endpoint.
#[derive(Clone, Debug)]
pub struct Session {
    session_id: String,
    csrf_token: String,
}

impl Session {
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

/// Extracts the session matching the request's session cookie, forwarding
/// when there is none.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let manager = match request.guard::<&State<SessionManager>>().await {
            Outcome::Success(manager) => manager,
            _ => return Outcome::Forward(Status::InternalServerError),
        };
        request
            .cookies()
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| manager.fetch(cookie.value()))
            .map_or(Outcome::Forward(Status::Unauthorized), Outcome::Success)
    }
}

/// In-memory session store.
pub struct SessionManager {
    sessions: Cache<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        let sessions = Cache::builder().max_capacity(64).build();
        Self { sessions }
    }

    /// Creates a session and hands its cookies to the response: the HttpOnly
    /// session cookie plus the readable CSRF token cookie.
    pub fn establish(&self, cookies: &CookieJar<'_>) -> Result<Session, rand::Error> {
        let session_id = random_id(16)?;
        let csrf_token = random_id(16)?;
        let session = Session {
            session_id: session_id.clone(),
            csrf_token: csrf_token.clone(),
        };

        cookies.add(
            Cookie::build((SESSION_COOKIE_NAME, session_id))
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
        );
        cookies.add(
            Cookie::build((XSRF_TOKEN_COOKIE_NAME, csrf_token))
                .same_site(SameSite::Lax)
                .build(),
        );

        self.sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    pub fn fetch(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(&session_id.to_string())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors when checking the CSRF header against the session token.
// NOTE: none of these echo the expected token, so error output can never
// leak it.
#[derive(Debug)]
pub enum XsrfGuardError {
    NoSession,
    NoHeaderPresent,
    TokenMismatch,
}

/// Request guard proving the request passed the double submit check: a live
/// session whose CSRF token matches the header the client sent.
#[derive(Debug)]
pub struct XsrfGuard {
    pub session: Session,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for XsrfGuard {
    type Error = XsrfGuardError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let session = match request.guard::<Session>().await {
            Outcome::Success(session) => session,
            _ => return Outcome::Error((Status::Forbidden, XsrfGuardError::NoSession)),
        };
        match request.headers().get_one(XSRF_TOKEN_HEADER_NAME) {
            Some(token) if token == session.csrf_token() => Outcome::Success(Self { session }),
            Some(_) => Outcome::Error((Status::Forbidden, XsrfGuardError::TokenMismatch)),
            None => Outcome::Error((Status::Forbidden, XsrfGuardError::NoHeaderPresent)),
        }
    }
}
