//! Shared pieces used by every crate in the workspace: tracing setup and
//! small wire types.

pub mod types;
pub mod utils;

/// Strip an optional `:port` suffix and lower-case a `Host` header value.
///
/// Bracketed IPv6 literals keep their brackets: `[::1]:8000` becomes `[::1]`.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let host = if raw.starts_with('[') {
        match raw.find(']') {
            Some(end) => &raw[..=end],
            None => raw,
        }
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn normalize_host_strips_port_and_case() {
        assert_eq!(normalize_host("Acme.Localhost:8000"), "acme.localhost");
        assert_eq!(normalize_host("acme.localhost"), "acme.localhost");
        assert_eq!(normalize_host("[::1]:8000"), "[::1]");
        assert_eq!(normalize_host(" example.com. "), "example.com");
    }
}
