//! Auth cookie helpers
//!
//! The session token travels either as a bearer header or as an http-only,
//! SameSite=Lax, path-scoped cookie. Clearing is a cookie with epoch expiry.

pub const AUTH_COOKIE: &str = "auth_token";

/// Build the Set-Cookie value carrying the session token
pub fn auth_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{AUTH_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_secs}; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that clears the session cookie
pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{AUTH_COOKIE}=; HttpOnly; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Extract the auth cookie value from a Cookie header
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix(AUTH_COOKIE)?.strip_prefix('=')
    })
}
