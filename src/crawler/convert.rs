//! HTML to Markdown conversion

/// Converts an extracted HTML subtree into Markdown
pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

/// Converter backed by `html2md`
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> String {
        collapse_blank_lines(&html2md::parse_html(html))
    }
}

/// Squeezes runs of blank lines down to one and trims the ends
fn collapse_blank_lines(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;

    for line in markdown.trim().lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.trim_end().to_string()
}
