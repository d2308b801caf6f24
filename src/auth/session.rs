//! Carries the session token between browser and server in the `token` cookie.
//!
//! The server keeps no session table. Ending a session only tells the browser to drop the
//! cookie; a copy of the token held elsewhere keeps working until its own `exp`.

use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use super::{
    claims::Identity,
    jwt::{TokenCodec, TokenError},
};

pub const SESSION_COOKIE: &str = "token";

/// Issues a token for `identity` and wraps it in the session cookie.
pub fn begin_session(
    codec: &TokenCodec,
    identity: &Identity,
) -> Result<Cookie<'static>, TokenError> {
    let token = codec.issue(identity)?;
    Ok(Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .build())
}

/// Cookie that makes the browser discard the session cookie right away.
pub fn end_session() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
