use crate::UrlError;
use url::Url;

/// Resolves an `href` found on `page_url` into a site-relative document path
///
/// # Normalization Steps
///
/// 1. Resolve the href against the page it was found on
/// 2. Reject non-HTTP(S) schemes and links to other hosts
/// 3. Strip the site mount prefix (e.g. `/documents`) from the path
/// 4. Percent-decode the path and remove dot segments
/// 5. Drop the fragment; keep the query string
///
/// A trailing slash is preserved because it maps to an `index.md` on output.
///
/// # Arguments
///
/// * `page_url` - URL of the page the link was found on
/// * `href` - The raw `href` attribute value
/// * `mount_prefix` - Path under which the site's documents are mounted, or `""`
///
/// # Returns
///
/// * `Ok(String)` - Site path, always starting with `/`
/// * `Err(UrlError)` - The href does not point at a document on this site
///
/// # Examples
///
/// ```
/// use doc_harvest::url::site_path_from_href;
/// use url::Url;
///
/// let page = Url::parse("https://docs.example.com/documents/guide/index.html").unwrap();
/// let path = site_path_from_href(&page, "setup.html#install", "/documents").unwrap();
/// assert_eq!(path, "/guide/setup.html");
/// ```
pub fn site_path_from_href(
    page_url: &Url,
    href: &str,
    mount_prefix: &str,
) -> Result<String, UrlError> {
    let url = page_url
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS links are harvested, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    if Some(host) != page_url.host_str() || url.port() != page_url.port() {
        return Err(UrlError::ForeignHost(host.to_string()));
    }

    let raw_path = strip_mount_prefix(url.path(), mount_prefix);
    let decoded = urlencoding::decode(raw_path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| raw_path.to_string());
    let mut path = normalize_path(&decoded);

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        path.push('?');
        path.push_str(query);
    }

    Ok(path)
}

/// Removes `mount_prefix` from the front of `path` if it is a whole-segment match
pub fn strip_mount_prefix<'a>(path: &'a str, mount_prefix: &str) -> &'a str {
    if mount_prefix.is_empty() {
        return path;
    }

    match path.strip_prefix(mount_prefix) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Removes dot segments and duplicate slashes, keeping a trailing slash
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..") {
        result.push('/');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://docs.example.com/documents/guide/index.html").unwrap()
    }

    #[test]
    fn test_relative_href() {
        let path = site_path_from_href(&page(), "setup.html", "/documents").unwrap();
        assert_eq!(path, "/guide/setup.html");
    }

    #[test]
    fn test_absolute_path_href() {
        let path = site_path_from_href(&page(), "/documents/api/client.html", "/documents").unwrap();
        assert_eq!(path, "/api/client.html");
    }

    #[test]
    fn test_full_url_href() {
        let path = site_path_from_href(
            &page(),
            "https://docs.example.com/documents/guide/a.html",
            "/documents",
        )
        .unwrap();
        assert_eq!(path, "/guide/a.html");
    }

    #[test]
    fn test_fragment_removed() {
        let path = site_path_from_href(&page(), "a.html#section-2", "/documents").unwrap();
        assert_eq!(path, "/guide/a.html");
    }

    #[test]
    fn test_query_kept() {
        let path = site_path_from_href(&page(), "a.html?v=2", "/documents").unwrap();
        assert_eq!(path, "/guide/a.html?v=2");
    }

    #[test]
    fn test_dot_segments_removed() {
        let path = site_path_from_href(&page(), "../api/./b.html", "/documents").unwrap();
        assert_eq!(path, "/api/b.html");
    }

    #[test]
    fn test_trailing_slash_preserved() {
        let path = site_path_from_href(&page(), "/documents/guide/", "/documents").unwrap();
        assert_eq!(path, "/guide/");
    }

    #[test]
    fn test_percent_encoding_decoded() {
        let path = site_path_from_href(&page(), "my%20page.html", "/documents").unwrap();
        assert_eq!(path, "/guide/my page.html");
    }

    #[test]
    fn test_foreign_host_rejected() {
        let result = site_path_from_href(&page(), "https://other.com/guide/a.html", "/documents");
        assert!(matches!(result, Err(UrlError::ForeignHost(_))));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let result = site_path_from_href(&page(), "mailto:team@example.com", "/documents");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_strip_mount_prefix_whole_segment_only() {
        assert_eq!(strip_mount_prefix("/documents/a.html", "/documents"), "/a.html");
        assert_eq!(strip_mount_prefix("/documents", "/documents"), "/");
        assert_eq!(
            strip_mount_prefix("/documentsx/a.html", "/documents"),
            "/documentsx/a.html"
        );
        assert_eq!(strip_mount_prefix("/a.html", ""), "/a.html");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("//a//b"), "/a/b");
        assert_eq!(normalize_path("/a/b/.."), "/a/");
        assert_eq!(normalize_path("/../.."), "/");
    }
}
