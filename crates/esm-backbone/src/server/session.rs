use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

use crate::config::SessionConfig;

pub(crate) fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|cookie| cookie.to_str().ok())
        .flat_map(|cookie| cookie.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

pub(crate) fn session_cookie(config: &SessionConfig, session_id: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{}={session_id}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}", config.cookie_name, config.max_age);
    if config.secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
}

#[cfg(test)]
mod test {
    use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

    use super::{parse_cookie, session_cookie};
    use crate::config::SessionConfig;

    #[test]
    fn when_cookie_header_has_session_then_parse_cookie_returns_it() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; esm_session=abc; lang=en"));

        assert_eq!(parse_cookie(&headers, "esm_session").as_deref(), Some("abc"));
        assert_eq!(parse_cookie(&headers, "missing"), None);
    }

    #[test]
    fn when_cookie_headers_are_split_then_parse_cookie_searches_all_of_them() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("esm_session=abc"));

        assert_eq!(parse_cookie(&headers, "esm_session").as_deref(), Some("abc"));
    }

    #[test]
    fn when_session_is_secure_then_cookie_has_secure_attribute() {
        let config = SessionConfig { cookie_name: "esm_session".to_owned(), secure: true, max_age: 3600 };

        let cookie = session_cookie(&config, "abc").expect("building cookie should be successful");

        assert_eq!(cookie, "esm_session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600; Secure");
    }

    #[test]
    fn when_session_is_not_secure_then_cookie_has_no_secure_attribute() {
        let config = SessionConfig { cookie_name: "esm_session".to_owned(), secure: false, max_age: 3600 };

        let cookie = session_cookie(&config, "abc").expect("building cookie should be successful");

        assert_eq!(cookie, "esm_session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600");
    }
}
