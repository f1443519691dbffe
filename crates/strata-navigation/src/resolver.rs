//! Address input resolution
//!
//! Resolution order:
//! 1. Recognized scheme and parseable → navigate as-is
//! 2. Looks like a host (domain, IP, localhost) → https:// prefixed
//! 3. Anything else → search query against the configured template

use std::net::IpAddr;
use url::Url;

/// Result of resolving address input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Navigate to a URL
    Navigate(String),
    /// Perform a search
    Search(String),
}

impl Resolution {
    pub fn into_url(self) -> String {
        match self {
            Resolution::Navigate(url) | Resolution::Search(url) => url,
        }
    }
}

pub struct InputResolver {
    /// Search engine URL template (%s replaced with the encoded query)
    search_template: String,
}

impl InputResolver {
    pub fn new(search_template: impl Into<String>) -> Self {
        Self {
            search_template: search_template.into(),
        }
    }

    pub fn set_search_template(&mut self, template: impl Into<String>) {
        self.search_template = template.into();
    }

    pub fn search_template(&self) -> &str {
        &self.search_template
    }

    /// Resolve input to either a navigation target or a search URL.
    /// Empty or unresolvable input is an error; it must never reach the
    /// tab store.
    pub fn resolve(&self, input: &str) -> crate::Result<Resolution> {
        let input = input.trim();

        if input.is_empty() {
            return Err(crate::NavigationError::InvalidUrl(
                "input is empty".to_string(),
            ));
        }

        if let Some(url) = self.try_parse_url(input) {
            return Ok(Resolution::Navigate(url));
        }

        Ok(Resolution::Search(self.build_search_url(input)))
    }

    /// Resolve and collapse to the final URL string.
    pub fn normalize(&self, input: &str) -> crate::Result<String> {
        Ok(self.resolve(input)?.into_url())
    }

    fn try_parse_url(&self, input: &str) -> Option<String> {
        // Direct URL with scheme
        if (input.starts_with("http://") || input.starts_with("https://"))
            && Url::parse(input).is_ok()
        {
            return Some(input.to_string());
        }

        // Scheme-less host heuristics
        if self.looks_like_host(input) {
            let (host, rest) = split_host_and_rest(input);
            let with_https = if self.is_ipv6_host(host) && !host.starts_with('[') {
                format!("https://[{}]{}", host, rest)
            } else {
                format!("https://{}{}", host, rest)
            };

            if Url::parse(&with_https).is_ok() {
                return Some(with_https);
            }
        }

        // Special protocols pass through unchanged
        if input.starts_with("file://") || input.starts_with("about:") || input.starts_with("data:")
        {
            return Some(input.to_string());
        }

        None
    }

    /// Heuristic check whether the input names a host rather than a query.
    fn looks_like_host(&self, input: &str) -> bool {
        if input.contains(' ') {
            return false;
        }

        if input.starts_with("localhost") || self.is_ip_address(input) {
            return true;
        }

        // Domain-like pattern: something.tld with a plausible TLD
        if input.contains('.') {
            let parts: Vec<&str> = input.split('.').collect();
            if parts.len() >= 2 {
                let tld = parts.last().unwrap();
                let tld = tld.split(':').next().unwrap();
                let tld = tld.split('/').next().unwrap();

                if tld.len() >= 2 && tld.len() <= 6 && tld.chars().all(|c| c.is_alphabetic()) {
                    return true;
                }
            }
        }

        false
    }

    fn is_ip_address(&self, input: &str) -> bool {
        let (host, _) = split_host_and_rest(input);
        parse_ip_host(host).is_some()
    }

    fn is_ipv6_host(&self, host: &str) -> bool {
        matches!(parse_ip_host(host), Some(IpAddr::V6(_)))
    }

    fn build_search_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.search_template.replace("%s", &encoded)
    }
}

fn parse_ip_host(host: &str) -> Option<IpAddr> {
    let host = host.trim();
    if host.is_empty() {
        return None;
    }

    let host = if host.starts_with('[') {
        host.strip_prefix('[')
            .and_then(|s| s.split(']').next())
            .unwrap_or(host)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };

    host.parse().ok()
}

fn split_host_and_rest(input: &str) -> (&str, &str) {
    let mut cut = input.len();
    for ch in ['/', '?', '#'] {
        if let Some(idx) = input.find(ch) {
            if idx < cut {
                cut = idx;
            }
        }
    }

    input.split_at(cut)
}
