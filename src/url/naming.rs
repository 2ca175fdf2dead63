use std::path::{Path, PathBuf};
use url::Url;

/// Name used when the target cannot be parsed at all
pub const INVALID_URL_NAME: &str = "invalid_url";

/// Name used when nothing survives sanitising the host
pub const EMPTY_DOMAIN_NAME: &str = "sanitized_domain_empty";

/// Derives a stable, filesystem-safe name from a target URL
///
/// # Naming Rules
///
/// 1. Take the host (with an explicit port, if any) and drop a leading `www.`
/// 2. Map `.` and `-` to `_`, remove every other non-word character
/// 3. Lowercase the result
/// 4. If the path has a first non-empty segment, sanitise it the same way and
///    append it after an underscore
///
/// # Examples
///
/// ```
/// use nav_mapper::url::website_name;
///
/// assert_eq!(website_name("https://www.example-site.co.uk/Docs/intro"), "example_site_co_uk_docs");
/// assert_eq!(website_name("http://test.org"), "test_org");
/// assert_eq!(website_name("not a url"), "invalid_url");
/// ```
pub fn website_name(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Cannot derive website name from '{}': {}", url, e);
            return INVALID_URL_NAME.to_string();
        }
    };

    let Some(host) = parsed.host_str() else {
        return INVALID_URL_NAME.to_string();
    };

    let host = host.strip_prefix("www.").unwrap_or(host);
    let netloc = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let domain = sanitize(&netloc);
    if domain.is_empty() {
        return EMPTY_DOMAIN_NAME.to_string();
    }

    let segment = parsed
        .path()
        .trim_matches('/')
        .split('/')
        .next()
        .map(sanitize)
        .unwrap_or_default();

    if segment.is_empty() {
        domain
    } else {
        format!("{}_{}", domain, segment)
    }
}

/// Computes the output file path for a target
pub fn output_path_for(output_dir: &Path, url: &str, suffix: &str) -> PathBuf {
    output_dir.join(format!("{}{}", website_name(url), suffix))
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c == '.' || c == '-' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}
