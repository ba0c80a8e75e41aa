//! Anti-forgery token resolution.
//!
//! The backend rejects cart mutations without its CSRF token. The token can
//! surface in three places depending on how the page was rendered; the first
//! non-empty value wins, in this order:
//!
//! 1. the host page's configuration object
//! 2. the `<meta name="csrf-token">` tag
//! 3. the `csrftoken` cookie

use secrecy::SecretString;

use crate::cookies::CookieStore;

/// Name of the cookie the backend sets the token in.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Candidate token values, in precedence order.
#[derive(Debug, Default)]
pub struct TokenSources<'a> {
    /// Value from the host page's configuration object.
    pub page_config: Option<&'a str>,
    /// Content of the `csrf-token` meta tag.
    pub meta_tag: Option<&'a str>,
    /// Raw value of the `csrftoken` cookie.
    pub cookie: Option<&'a str>,
}

/// Resolve the anti-forgery token: first non-empty source wins.
#[must_use]
pub fn resolve_token(sources: TokenSources<'_>) -> Option<SecretString> {
    [sources.page_config, sources.meta_tag, sources.cookie]
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .map(|value| SecretString::from(value.to_owned()))
}

/// Resolve the token with the cookie source read from a [`CookieStore`].
#[must_use]
pub fn resolve_token_with_cookies(
    page_config: Option<&str>,
    meta_tag: Option<&str>,
    cookies: &dyn CookieStore,
) -> Option<SecretString> {
    let cookie = cookies.get(CSRF_COOKIE);
    resolve_token(TokenSources {
        page_config,
        meta_tag,
        cookie: cookie.as_deref(),
    })
}
