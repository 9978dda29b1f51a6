//! Content resources served per tier

use std::fmt;

/// Opaque reference to the content a tier unlocks
///
/// The backend hands these out as URLs; the domain never inspects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentResource {
    /// Location of the content
    pub url: String,
}

impl ContentResource {
    /// Create a content resource from a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Borrow the URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ContentResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl From<&str> for ContentResource {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for ContentResource {
    fn from(url: String) -> Self {
        Self { url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_url() {
        let content = ContentResource::new("https://example.com/basic.png");
        assert_eq!(content.to_string(), "https://example.com/basic.png");
        assert_eq!(content.url(), "https://example.com/basic.png");
    }

    #[test]
    fn test_conversions() {
        let from_str: ContentResource = "url-A".into();
        let from_string: ContentResource = String::from("url-A").into();
        assert_eq!(from_str, from_string);
    }
}
