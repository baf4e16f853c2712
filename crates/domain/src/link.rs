//! Featured link normalization
//!
//! User input is repaired through an ordered fallback chain, first success
//! wins:
//! 1. parse as a URI (absolute with scheme, or a relative reference);
//! 2. on failure, percent-encode unsafe characters and parse again;
//! 3. if that fails too, continue with an empty schemeless reference;
//! 4. a schemeless result gets `http://` prepended and is reparsed;
//! 5. the final scheme must be `http` or `https`.
//!
//! The order matters for malformed input, so keep it.

use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Message key attached to rejected links
pub const INVALID_LINK_KEY: &str = "links_category.invalid_link";

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid scheme regex"));

/// Characters escaped before the second parse attempt
const UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Characters a relative reference may contain besides alphanumerics and `%XX`
const REFERENCE_CHARS: &[u8] = b"-._~:/?#[]@!$&'()*+,;=";

/// The submitted string cannot be turned into an http(s) URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Sorry, '{input}' is not a valid http or https link")]
pub struct InvalidLinkError {
    pub input: String,
}

impl InvalidLinkError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    pub fn key(&self) -> &'static str {
        INVALID_LINK_KEY
    }
}

/// An absolute http(s) URL produced by [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Always present for http(s)
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single parse attempt
enum Uri {
    Absolute(Url),
    Relative(String),
}

/// Normalize free-form input into an absolute http(s) URL
pub fn normalize(input: &str) -> Result<NormalizedUrl, InvalidLinkError> {
    let raw = input.trim();

    let uri = parse_uri(raw)
        .or_else(|| parse_uri(&utf8_percent_encode(raw, UNSAFE).to_string()))
        .unwrap_or_else(|| Uri::Relative(String::new()));

    let url = match uri {
        Uri::Absolute(url) => url,
        Uri::Relative(reference) => {
            Url::parse(&format!("http://{reference}")).map_err(|_| InvalidLinkError::new(input))?
        }
    };

    match url.scheme() {
        "http" | "https" => Ok(NormalizedUrl(url)),
        scheme => {
            tracing::debug!(scheme, "Rejected link with unsupported scheme");
            Err(InvalidLinkError::new(input))
        }
    }
}

/// Display domain of a link: lower-cased host without a leading `www.`
pub fn domain_of(input: &str) -> Option<String> {
    let url = normalize(input).ok()?;
    let host = url.host().to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    if let Some(rest) = host.strip_prefix("www.") {
        return Some(rest.to_string());
    }
    Some(host)
}

fn parse_uri(input: &str) -> Option<Uri> {
    if SCHEME.is_match(input) {
        return Url::parse(input).ok().map(Uri::Absolute);
    }
    is_relative_reference(input).then(|| Uri::Relative(input.to_string()))
}

fn is_relative_reference(input: &str) -> bool {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            let valid_escape = i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid_escape {
                return false;
            }
            i += 3;
            continue;
        }
        if !(b.is_ascii_alphanumeric() || REFERENCE_CHARS.contains(&b)) {
            return false;
        }
        i += 1;
    }

    if input.matches('#').count() > 1 {
        return false;
    }

    // Without a scheme the first segment may not hold a colon
    let first_segment = input
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    !first_segment.contains(':')
}
