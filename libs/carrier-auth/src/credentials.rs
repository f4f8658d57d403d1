//! Credential extraction from call metadata.

use http::HeaderMap;
use http::header::AUTHORIZATION;

use crate::error::AuthError;

pub const BASIC: &str = "Basic";
pub const BEARER: &str = "Bearer";

/// Return the credential that follows `scheme` in the `Authorization` header.
///
/// The scheme match is case-insensitive. Whitespace around the credential is
/// ignored.
///
/// # Errors
/// Returns [`AuthError::Unauthenticated`] if the header is missing, not
/// visible ASCII, uses another scheme, or carries an empty credential.
pub fn extract_credential<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AuthError> {
    let unauthenticated = || AuthError::Unauthenticated(format!("request unauthenticated with {scheme}"));

    let value = headers.get(AUTHORIZATION).ok_or_else(unauthenticated)?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::unauthenticated("bad authorization string"))?;
    let (prefix, credential) = value
        .trim_start()
        .split_once(' ')
        .ok_or_else(|| AuthError::unauthenticated("bad authorization string"))?;

    if !prefix.eq_ignore_ascii_case(scheme) {
        return Err(unauthenticated());
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(unauthenticated());
    }
    Ok(credential)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_matching_scheme() {
        let h = headers("Bearer abc.def.ghi");
        assert_eq!(extract_credential(&h, BEARER).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn scheme_match_is_case_insensitive() {
        let h = headers("basic dXNlcjpwYXNz");
        assert_eq!(extract_credential(&h, BASIC).unwrap(), "dXNlcjpwYXNz");
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let err = extract_credential(&HeaderMap::new(), BEARER).unwrap_err();
        assert_eq!(
            err,
            AuthError::Unauthenticated("request unauthenticated with Bearer".to_owned())
        );
    }

    #[test]
    fn other_scheme_is_unauthenticated() {
        let h = headers("Basic dXNlcjpwYXNz");
        assert!(extract_credential(&h, BEARER).unwrap_err().is_unauthenticated());
    }

    #[test]
    fn header_without_credential_is_unauthenticated() {
        assert!(extract_credential(&headers("Bearer"), BEARER).unwrap_err().is_unauthenticated());
        assert!(extract_credential(&headers("Bearer   "), BEARER).unwrap_err().is_unauthenticated());
    }
}
