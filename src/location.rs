use std::fmt;

use crate::{Error, Result};

pub const STORAGE_KEY_PREFIX: &str = "highlights_";

/// The parts of a page URL that identify it for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub scheme: String,
    pub hostname: String,
    pub port: String,
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl PageLocation {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = || Error::InvalidLocation(trimmed.to_string());

        let scheme_end = trimmed.find(':').ok_or_else(invalid)?;
        let scheme = trimmed[..scheme_end].to_ascii_lowercase();
        if !is_valid_url_scheme(&scheme) {
            return Err(invalid());
        }
        let rest = &trimmed[scheme_end + 1..];

        let (hostname, port, tail) = match rest.strip_prefix("//") {
            Some(without_slashes) => {
                let authority_end = without_slashes
                    .find(['/', '?', '#'])
                    .unwrap_or(without_slashes.len());
                let authority = &without_slashes[..authority_end];
                let hostport = authority
                    .rfind('@')
                    .map_or(authority, |at| &authority[at + 1..]);
                let (hostname, port) = split_hostname_and_port(hostport);
                (hostname.to_ascii_lowercase(), port, &without_slashes[authority_end..])
            }
            None => (String::new(), String::new(), rest),
        };

        let (before_hash, hash) = match tail.find('#') {
            Some(idx) => (&tail[..idx], tail[idx..].to_string()),
            None => (tail, String::new()),
        };
        let (pathname, search) = match before_hash.find('?') {
            Some(idx) => (&before_hash[..idx], before_hash[idx..].to_string()),
            None => (before_hash, String::new()),
        };
        let pathname = if pathname.is_empty() && !hostname.is_empty() {
            "/".to_string()
        } else {
            pathname.to_string()
        };

        Ok(Self {
            scheme,
            hostname,
            port,
            pathname,
            search,
            hash,
        })
    }

    /// Persistence key for this page. Query string, fragment and port do not
    /// take part, so reloads and in-page navigation keep the same key.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}{}", self.hostname, self.pathname)
    }

    pub fn host(&self) -> String {
        if self.port.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname.is_empty() {
            write!(f, "{}:{}{}{}", self.scheme, self.pathname, self.search, self.hash)
        } else {
            write!(
                f,
                "{}://{}{}{}{}",
                self.scheme,
                self.host(),
                self.pathname,
                self.search,
                self.hash
            )
        }
    }
}

fn is_valid_url_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

fn split_hostname_and_port(authority: &str) -> (String, String) {
    if let Some(rest) = authority.strip_prefix('[') {
        if let Some(end_idx) = rest.find(']') {
            let hostname = authority[..end_idx + 2].to_string();
            let port = authority[end_idx + 2..]
                .strip_prefix(':')
                .unwrap_or_default()
                .to_string();
            return (hostname, port);
        }
    }

    if let Some((hostname, port)) = authority.rsplit_once(':') {
        if !hostname.contains(':') {
            return (hostname.to_string(), port.to_string());
        }
    }
    (authority.to_string(), String::new())
}
