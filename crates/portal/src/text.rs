//! Text helpers shared by page assembly: markdown rendering, path parameter
//! sanitising, anchor slugs, and human-readable byte sizes.

use pulldown_cmark::{html, Options, Parser};

/// Renders CommonMark (with tables and strikethrough) to an HTML fragment.
///
/// Raw HTML embedded in the source is passed through; descriptions come from
/// the portal's own DMS and CMS.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() + source.len() / 2);
    html::push_html(&mut out, parser);
    out
}

// ---------------------------------------------------------------------------
// Parameter sanitising
// ---------------------------------------------------------------------------

/// Elements whose text content is dropped along with the tags themselves.
const DROPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Strips every HTML tag from a path parameter, keeping only its text.
///
/// No tags are allowed through. Content inside `<script>` and `<style>`
/// elements is removed entirely; comments and processing instructions are
/// removed. A `<` that does not open a tag (e.g. `a < b`) is kept.
pub fn sanitize_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let after = &rest[lt + 1..];
        let opens_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !opens_tag {
            out.push('<');
            rest = after;
            continue;
        }
        let Some(gt) = tag_end(after) else {
            // Unterminated tag: everything after it is markup.
            return out;
        };
        let tag = &after[..gt];
        rest = &after[gt + 1..];

        let tag_name: String = tag
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        if DROPPED_ELEMENTS.contains(&tag_name.as_str()) && !tag.ends_with('/') {
            let closing = format!("</{tag_name}");
            match rest.to_ascii_lowercase().find(&closing) {
                Some(pos) => {
                    let tail = &rest[pos..];
                    rest = tail.find('>').map_or("", |end| &tail[end + 1..]);
                }
                None => return out,
            }
        }
    }
    out.push_str(rest);
    out
}

/// Byte offset of the `>` closing a tag body. A `>` inside a quoted
/// attribute value (`title=">"`) does not end the tag.
fn tag_end(tag: &str) -> Option<usize> {
    let mut after_equals = false;
    let mut chars = tag.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '>' => return Some(i),
            '"' | '\'' if after_equals => {
                chars.by_ref().find(|&(_, q)| q == c)?;
                after_equals = false;
            }
            '=' => after_equals = true,
            c if c.is_whitespace() => {}
            _ => after_equals = false,
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Slugs and sizes
// ---------------------------------------------------------------------------

/// Turns a resource name into an anchor-safe slug.
///
/// Whitespace runs become a single `-`; characters other than ASCII
/// alphanumerics and `-_.~` are removed. Case is preserved.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.trim().chars() {
        if c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        }
    }
    out
}

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count with 1024-based units and no decimal places
/// (`512` → `"512B"`, `2_097_152` → `"2MB"`).
pub fn format_bytes(size: u64) -> String {
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.0}{}", value, SIZE_UNITS[unit])
}
