//! Session cookie parsing and `Set-Cookie` rendering.

use std::time::Duration;

/// Attributes attached to the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub max_age: Duration,
    pub secure: bool,
    pub path: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: crate::auth::SESSION_COOKIE.to_string(),
            max_age: Duration::from_secs(crate::auth::SESSION_MAX_AGE_SECS),
            secure: true,
            path: "/".to_string(),
        }
    }
}

impl CookieSettings {
    /// `Set-Cookie` value carrying `token`.
    pub fn render(&self, token: &str) -> String {
        self.render_with_max_age(token, self.max_age.as_secs())
    }

    /// `Set-Cookie` value that makes the browser drop the cookie.
    pub fn render_expired(&self) -> String {
        self.render_with_max_age("", 0)
    }

    fn render_with_max_age(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Strict",
            self.name, value, self.path, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Find the value of cookie `name` in a raw `Cookie` header.
///
/// The first occurrence wins. Surrounding double quotes are stripped.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() != name {
            return None;
        }
        let value = value.trim();
        Some(
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cookie() {
        let header = "theme=dark; session=abc.def; other=1";
        assert_eq!(find_cookie(header, "session"), Some("abc.def"));
        assert_eq!(find_cookie(header, "theme"), Some("dark"));
        assert_eq!(find_cookie(header, "missing"), None);
    }

    #[test]
    fn test_find_cookie_does_not_match_suffixes() {
        assert_eq!(find_cookie("xsession=evil", "session"), None);
        assert_eq!(find_cookie("session_old=1; session=2", "session"), Some("2"));
    }

    #[test]
    fn test_find_cookie_quoted_and_empty() {
        assert_eq!(find_cookie("session=\"a.b\"", "session"), Some("a.b"));
        assert_eq!(find_cookie("session=", "session"), Some(""));
        assert_eq!(find_cookie("", "session"), None);
    }

    #[test]
    fn test_render_attributes() {
        let settings = CookieSettings::default();
        assert_eq!(
            settings.render("tok"),
            "session=tok; Path=/; Max-Age=604800; HttpOnly; SameSite=Strict; Secure"
        );
    }

    #[test]
    fn test_render_expired_without_secure() {
        let settings = CookieSettings {
            secure: false,
            ..CookieSettings::default()
        };
        assert_eq!(
            settings.render_expired(),
            "session=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict"
        );
    }
}
