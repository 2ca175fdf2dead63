use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use nav_mapper::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the authority (host plus explicit port) used for same-site checks
///
/// A port equal to the scheme's default is dropped by the URL parser, so
/// `https://example.com/`, `https://example.com:443/` and
/// `http://example.com/` all share one authority. Two servers on the same host
/// with explicit, different ports do not.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use nav_mapper::url::extract_authority;
///
/// let a = Url::parse("https://example.com/a").unwrap();
/// let b = Url::parse("http://EXAMPLE.com/b").unwrap();
/// assert_eq!(extract_authority(&a), extract_authority(&b));
/// ```
pub fn extract_authority(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
