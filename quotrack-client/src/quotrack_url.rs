/// Base-URL-plus-path builder for the quote tracker API.
///
/// Keeps URL assembly in one place so endpoint methods read as paths.
#[derive(Debug, Clone)]
pub struct QuotrackUrl(String);

impl AsRef<str> for QuotrackUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl QuotrackUrl {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self(base.trim_end_matches('/').to_string())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }

    /// Append a query parameter, percent-encoding the value.
    pub fn with_param(&self, name: &str, value: &str) -> Self {
        let sep = if self.0.contains('?') { '&' } else { '?' };
        Self(format!("{}{}{}={}", self.0, sep, name, encode(value)))
    }
}

fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_path_normalizes_slashes() {
        let url = QuotrackUrl::new("http://localhost:5000/");
        assert_eq!(
            url.append_path("/api/quotes").as_ref(),
            "http://localhost:5000/api/quotes"
        );
    }

    #[test]
    fn with_param_uses_question_mark_then_ampersand() {
        let url = QuotrackUrl::new("http://localhost:5000")
            .append_path("api/quotes")
            .with_param("search", "acme corp")
            .with_param("include_hidden", "true");
        assert_eq!(
            url.as_ref(),
            "http://localhost:5000/api/quotes?search=acme%20corp&include_hidden=true"
        );
    }
}
