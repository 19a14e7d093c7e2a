use std::path::PathBuf;

/// Derives the output file location for a site path, relative to the output root
///
/// The trailing segment becomes the file name with `.html`/`.htm` replaced by
/// `.md`, intermediate segments become directories, and a path ending in `/`
/// maps to `index.md`. Dot segments are dropped so the result never escapes
/// the output root. A query string is part of an item's identity, so it is
/// appended to the file stem: `/a/b.html?lang=en` maps to `a/b_lang=en.md`.
///
/// # Examples
///
/// ```
/// use doc_harvest::url::output_relative_path;
/// use std::path::PathBuf;
///
/// assert_eq!(output_relative_path("/a/b.html"), PathBuf::from("a/b.md"));
/// assert_eq!(output_relative_path("/guide/"), PathBuf::from("guide/index.md"));
/// assert_eq!(output_relative_path("/a/b.html?lang=en"), PathBuf::from("a/b_lang=en.md"));
/// ```
pub fn output_relative_path(path: &str) -> PathBuf {
    let path = path.split('#').next().unwrap_or_default();
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query).filter(|q| !q.is_empty())),
        None => (path, None),
    };

    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    let mut out = PathBuf::new();
    let file_stem = match segments.split_last() {
        Some((last, dirs)) if !path.ends_with('/') => {
            dirs.iter().for_each(|d| out.push(d));
            strip_html_extension(last)
        }
        _ => {
            segments.iter().for_each(|d| out.push(d));
            ""
        }
    };

    let file_stem = if file_stem.is_empty() { "index" } else { file_stem };
    match query {
        Some(query) => out.push(format!("{}_{}.md", file_stem, sanitize_query(query))),
        None => out.push(format!("{}.md", file_stem)),
    }
    out
}

/// Keeps a query usable as part of a file name on every platform
fn sanitize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() => c,
            '-' | '_' | '=' | '.' | ',' => c,
            _ => '_',
        })
        .collect()
}

/// Builds a readable title from the last segment of a site path
///
/// Used when the extractor could not find a title: `/guide/getting-started.html`
/// becomes `getting started`.
pub fn title_from_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let last = path
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or("index");

    strip_html_extension(last).replace('-', " ")
}

fn strip_html_extension(segment: &str) -> &str {
    segment
        .strip_suffix(".html")
        .or_else(|| segment.strip_suffix(".htm"))
        .unwrap_or(segment)
}
