//! Cookie header reading and rewriting.

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};

/// Value of cookie `name` from the request's `Cookie` header(s).
///
/// Empty values are treated as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

enum Segment {
    Pair(String, String),
    /// Anything without `=`, passed through untouched.
    Raw(String),
}

/// Rewrite the request's cookies in place: `set` replaces or adds values,
/// `remove` drops cookies. Other cookies keep their order.
///
/// Segments that are not `name=value` pairs are kept as they are, and header
/// values that are not valid UTF-8 are re-appended byte for byte.
pub fn rewrite_request_cookies(headers: &mut HeaderMap, set: &[(&str, &str)], remove: &[&str]) {
    let mut segments = Vec::new();
    let mut opaque = Vec::new();

    for value in headers.get_all(COOKIE) {
        let Ok(line) = value.to_str() else {
            opaque.push(value.clone());
            continue;
        };
        for part in line.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((k, _)) if remove.contains(&k) => {}
                Some((k, v)) => segments.push(Segment::Pair(k.to_string(), v.to_string())),
                None => segments.push(Segment::Raw(part.to_string())),
            }
        }
    }

    for (name, value) in set {
        let existing = segments.iter_mut().find_map(|segment| match segment {
            Segment::Pair(k, v) if k == name => Some(v),
            _ => None,
        });
        match existing {
            Some(v) => *v = value.to_string(),
            None => segments.push(Segment::Pair(name.to_string(), value.to_string())),
        }
    }

    headers.remove(COOKIE);

    if !segments.is_empty() {
        let line = segments
            .iter()
            .map(|segment| match segment {
                Segment::Pair(k, v) => format!("{}={}", k, v),
                Segment::Raw(raw) => raw.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        if let Ok(value) = HeaderValue::from_str(&line) {
            headers.append(COOKIE, value);
        }
    }
    for value in opaque {
        headers.append(COOKIE, value);
    }
}

/// `Set-Cookie` value for an access cookie minted locally.
pub fn access_cookie(
    name: &str,
    token: &str,
    max_age_secs: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value that deletes cookie `name`.
pub fn expired_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
        name
    ))
}

/// Value of `name` if this `Set-Cookie` header sets it.
pub fn value_from_set_cookie(set_cookie: &HeaderValue, name: &str) -> Option<String> {
    let first = set_cookie.to_str().ok()?.split(';').next()?;
    let (k, v) = first.trim().split_once('=')?;
    (k == name && !v.is_empty()).then(|| v.to_string())
}
