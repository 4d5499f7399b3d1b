//! JSON-over-HTTP helpers shared by the backend handlers
//!
//! Maps transport and status failures onto the error taxonomy: 404 becomes
//! `NotFound`, every other failure `RemoteService` with the status attached.

use crate::error::{Result, UnipkgError};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// `base` with `segments` appended as percent-encoded path segments.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| UnipkgError::Config(format!("invalid endpoint '{}': {}", base, e)))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| UnipkgError::Config(format!("'{}' cannot be a base URL", base)))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// GET `url` and decode the JSON body.
pub fn get_json<T: DeserializeOwned>(client: &Client, url: &str, token: Option<&str>) -> Result<T> {
    let request = authorize(client.get(url), token).header("Accept", "application/json");
    let response = send(request, url)?;
    Ok(response.json()?)
}

/// POST a form and decode the JSON reply.
pub fn post_form<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    form: &[(&str, &str)],
) -> Result<T> {
    let request = client
        .post(url)
        .header("Accept", "application/json")
        .form(form);
    let response = send(request, url)?;
    Ok(response.json()?)
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

fn send(request: RequestBuilder, url: &str) -> Result<Response> {
    let response = request
        .send()
        .map_err(|e| UnipkgError::remote(None, format!("Network error for {}: {}", url, e)))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::debug!(url, status = status.as_u16(), "remote call failed");
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(UnipkgError::NotFound(url.to_string()));
    }

    let body = response.text().unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        body.chars().take(200).collect()
    };
    Err(UnipkgError::remote(Some(status.as_u16()), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let url = endpoint("https://api.winget.run/v2", &["packages", "Git", "Git"]).unwrap();
        assert_eq!(url.as_str(), "https://api.winget.run/v2/packages/Git/Git");

        let url = endpoint("http://127.0.0.1:8080/", &["repos", "a b", "c"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/repos/a%20b/c");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(matches!(endpoint("not a url", &["x"]), Err(UnipkgError::Config(_))));
        assert!(endpoint("mailto:someone@example.com", &["x"]).is_err());
    }
}
