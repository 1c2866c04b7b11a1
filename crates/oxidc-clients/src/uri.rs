//! URI classification helpers
//!
//! Small pure predicates shared by several validators: absoluteness, https,
//! and localhost/loopback detection. Host comparison is case-insensitive per
//! RFC 3986; the `url` crate already lowercases registered names on parse.

use std::net::IpAddr;

use url::Url;

/// Parse `raw` as an absolute URI, `None` otherwise.
///
/// The `url` crate only accepts absolute input without a base, so a plain
/// parse is exactly the absoluteness test.
pub fn parse_absolute(raw: &str) -> Option<Url> {
    Url::parse(raw).ok()
}

/// Whether the URL uses the https scheme.
pub fn is_https(url: &Url) -> bool {
    url.scheme() == "https"
}

/// Whether a host string names the local machine: `localhost`, any
/// `*.localhost` name, or a loopback IP literal (incl. `[::1]`).
pub fn is_loopback_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if host
        .rsplit_once('.')
        .is_some_and(|(_, tld)| tld.eq_ignore_ascii_case("localhost"))
    {
        return true;
    }
    host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

/// Whether the URL's host names the local machine.
pub fn has_loopback_host(url: &Url) -> bool {
    url.host_str().is_some_and(is_loopback_host)
}
