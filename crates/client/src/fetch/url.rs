//! Normalization of user-supplied page addresses.
//!
//! Tools accept what people paste: bare hosts, `host:port`, protocol-relative
//! `//host/path`, or full URLs. Everything ends up as an absolute `http` or
//! `https` URL with no fragment.

use url::Url;

/// Why a page address was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL cannot be empty")]
    Empty,

    #[error("unsupported scheme `{0}`, only http and https pages can be fetched")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    Invalid(String),
}

/// Normalize a page address into an absolute fetchable URL.
///
/// Addresses without a scheme get `https://`. The host is lowercased by the
/// parser and the fragment is dropped since it never reaches the server.
pub fn normalize_page_url(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let absolute = match (trimmed.strip_prefix("//"), explicit_scheme(trimmed)) {
        (Some(rest), _) => format!("https://{rest}"),
        (None, Some(_)) => trimmed.to_string(),
        (None, None) => format!("https://{trimmed}"),
    };

    let mut url = Url::parse(&absolute).map_err(|e| UrlError::Invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::Invalid(format!("no host in `{trimmed}`")));
    }

    url.set_fragment(None);
    Ok(url)
}

/// The scheme of `input` if it starts with one.
///
/// `host:port` looks like `scheme:rest` too, so a prefix followed by a digit
/// is read as a port instead.
fn explicit_scheme(input: &str) -> Option<&str> {
    let (prefix, rest) = input.split_once(':')?;
    let mut chars = prefix.chars();
    let leads_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let scheme_chars = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if !leads_with_letter || !scheme_chars || rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(prefix)
}
