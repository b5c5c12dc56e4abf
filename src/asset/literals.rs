//! Compaction of HTML/CSS inside tagged template literals.
//!
//! Component libraries keep markup and styles in `html`...`` / `css`...``
//! literals that a JS minifier treats as opaque strings. This pass shrinks the
//! static parts of those literals before the script itself is minified.
//!
//! Placeholders (`${...}`) are copied verbatim and never cross a compaction
//! boundary, so interpolated values see exactly the same surroundings.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static CSS_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    Markup,
    Style,
}

#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Text(Range<usize>),
    Placeholder(Range<usize>),
}

/// Compact every `html`, `svg` and `css` tagged template in `source`.
///
/// The source is walked from the start, skipping strings, comments, regex
/// literals and untagged templates, so only real tags are compacted.
/// Returns `None` when the walk loses track of the source (an unterminated
/// literal or comment).
pub fn minify_template_literals(source: &str) -> Option<String> {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut copied = 0;
    let mut i = 0;
    let mut regex_allowed = true;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i = skip_string(bytes, i + 1, quote)?;
                regex_allowed = false;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i + 2),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i + 2)?,
            b'/' if regex_allowed => {
                i = skip_regex(bytes, i + 1)?;
                regex_allowed = false;
            }
            b'`' => {
                let (segments, end) = scan_template(bytes, i + 1)?;
                if let Some(kind) = template_tag(&source[..i]) {
                    out.push_str(&source[copied..i + 1]);
                    push_compacted(&mut out, source, &segments, kind);
                    out.push('`');
                    copied = end;
                }
                i = end;
                regex_allowed = false;
            }
            b if b.is_ascii_whitespace() => i += 1,
            b => {
                regex_allowed = !(is_ident_byte(b) || matches!(b, b')' | b']' | b'}'));
                i += 1;
            }
        }
    }

    out.push_str(&source[copied..]);
    Some(out)
}

fn push_compacted(out: &mut String, source: &str, segments: &[Segment], kind: LiteralKind) {
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text(range) => {
                out.push_str(&compact(&source[range.clone()], kind, i == 0, i == last));
            }
            Segment::Placeholder(range) => out.push_str(&source[range.clone()]),
        }
    }
}

/// Tag naming the template that opens right after `prefix`, if it is one we compact.
fn template_tag(prefix: &str) -> Option<LiteralKind> {
    let head = prefix.trim_end();
    let (kind, tag) = if head.ends_with("css") {
        (LiteralKind::Style, "css")
    } else if head.ends_with("html") {
        (LiteralKind::Markup, "html")
    } else if head.ends_with("svg") {
        (LiteralKind::Markup, "svg")
    } else {
        return None;
    };

    let before = head[..head.len() - tag.len()].bytes().next_back();
    match before {
        Some(b) if is_ident_byte(b) => None,
        _ => Some(kind),
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$') || !b.is_ascii()
}

// ============================================================================
// Scanning
// ============================================================================

/// Split a template body starting at `open` (just after the backtick).
///
/// Returns the segments and the index just past the closing backtick.
fn scan_template(bytes: &[u8], open: usize) -> Option<(Vec<Segment>, usize)> {
    let mut segments = Vec::new();
    let mut start = open;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                segments.push(Segment::Text(start..i));
                return Some((segments, i + 1));
            }
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                segments.push(Segment::Text(start..i));
                let close = scan_expression(bytes, i + 2)?;
                segments.push(Segment::Placeholder(i..close + 1));
                i = close + 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    None
}

/// Find the `}` closing a placeholder expression starting at `i`.
fn scan_expression(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            quote @ (b'\'' | b'"') => {
                i = skip_string(bytes, i + 1, quote)?;
                continue;
            }
            b'`' => {
                let (_, end) = scan_template(bytes, i + 1)?;
                i = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Skip a quoted string body, returning the index past the closing quote.
fn skip_string(bytes: &[u8], mut i: usize, quote: u8) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Skip a regex literal body, returning the index past the closing slash.
fn skip_regex(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'\n' => return None,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the newline ending a `//` comment, or the end of input.
fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
    bytes[i..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |n| i + n)
}

/// Index just past the `*/` closing a block comment.
fn skip_block_comment(bytes: &[u8], i: usize) -> Option<usize> {
    bytes[i..]
        .windows(2)
        .position(|w| w == b"*/")
        .map(|n| i + n + 2)
}

// ============================================================================
// Compaction
// ============================================================================

fn compact(text: &str, kind: LiteralKind, first: bool, last: bool) -> String {
    match kind {
        LiteralKind::Markup => compact_markup(text, first, last),
        LiteralKind::Style => compact_style(text, first, last),
    }
}

/// Drop comments and collapse whitespace runs.
///
/// A run containing a newline that sits between two tags (or at the very
/// start/end of the literal) is indentation and is removed entirely.
fn compact_markup(text: &str, first: bool, last: bool) -> String {
    let text = HTML_COMMENT.replace_all(text, "");
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for run in WHITESPACE.find_iter(&text) {
        out.push_str(&text[cursor..run.start()]);
        cursor = run.end();

        let before_tag = (run.start() == 0 && first)
            || (run.start() > 0 && bytes[run.start() - 1] == b'>');
        let after_tag = (run.end() == bytes.len() && last) || bytes.get(run.end()) == Some(&b'<');
        let is_indent = run.as_str().contains('\n') && before_tag && after_tag;

        if !is_indent {
            out.push(' ');
        }
    }

    out.push_str(&text[cursor..]);
    out
}

/// Drop comments, collapse whitespace, and remove it around punctuation.
fn compact_style(text: &str, first: bool, last: bool) -> String {
    let text = CSS_COMMENT.replace_all(text, "");
    let collapsed = WHITESPACE.replace_all(&text, " ");

    let mut out = String::with_capacity(collapsed.len());
    let mut chars = collapsed.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = chars.peek().copied();
            let after_punct = matches!(prev, Some('{' | '}' | ';' | ',' | ':'));
            let before_punct = matches!(next, Some('{' | '}' | ';' | ','));
            if after_punct || before_punct {
                continue;
            }
        }
        out.push(c);
    }

    let out = if first { out.trim_start() } else { out.as_str() };
    let out = if last { out.trim_end() } else { out };
    out.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_indentation_removed() {
        let src = "const t = html`\n  <ul>\n    <li>a</li>\n  </ul>\n`;";
        assert_eq!(
            minify_template_literals(src).unwrap(),
            "const t = html`<ul><li>a</li></ul>`;"
        );
    }

    #[test]
    fn test_markup_inline_space_kept() {
        let src = "html`<b>bold</b>   <i>italic</i>`";
        assert_eq!(
            minify_template_literals(src).unwrap(),
            "html`<b>bold</b> <i>italic</i>`"
        );
    }

    #[test]
    fn test_markup_comments_removed() {
        let src = "html`<p>x</p><!-- note --><p>y</p>`";
        assert_eq!(
            minify_template_literals(src).unwrap(),
            "html`<p>x</p><p>y</p>`"
        );
    }

    #[test]
    fn test_placeholders_untouched() {
        let src = "html`<p class=\"${ cls }\">\n  ${items.map((i) => html`<li>${i}</li>`)}\n</p>`";
        let out = minify_template_literals(src).unwrap();
        assert!(out.contains("${ cls }"));
        assert!(out.contains("${items.map((i) => html`<li>${i}</li>`)}"));
    }

    #[test]
    fn test_style_literal() {
        let src = "css`\n  :host {\n    display: block; /* layout */\n  }\n  a :hover , b { color : red }\n`";
        assert_eq!(
            minify_template_literals(src).unwrap(),
            "css`:host{display:block;}a :hover,b{color :red}`"
        );
    }

    #[test]
    fn test_untagged_templates_ignored() {
        let src = "const s = `\n  keep   me\n`;";
        assert_eq!(minify_template_literals(src).unwrap(), src);
    }

    #[test]
    fn test_template_ending_in_tag_word_not_a_tag() {
        let src = "export const a = `see html`;\nexport const b = \"a    b\";\nexport const c = `y`;";
        assert_eq!(minify_template_literals(src).unwrap(), src);
    }

    #[test]
    fn test_tags_in_strings_and_comments_ignored() {
        let src = "const s = 'html`  x';\n// css`  y\n/* svg`  z */\nconst t = html`\n  <p>a</p>\n`;";
        assert_eq!(
            minify_template_literals(src).unwrap(),
            "const s = 'html`  x';\n// css`  y\n/* svg`  z */\nconst t = html`<p>a</p>`;"
        );
    }

    #[test]
    fn test_regex_literal_skipped() {
        let src = "const re = /[`'\"]/g;\nconst t = css`\n  a { color: red }\n`;";
        assert_eq!(
            minify_template_literals(src).unwrap(),
            "const re = /[`'\"]/g;\nconst t = css`a{color:red}`;"
        );
    }

    #[test]
    fn test_identifier_ending_in_tag_ignored() {
        let src = "const t = innerhtml`\n  <p>a</p>\n`;";
        assert_eq!(minify_template_literals(src).unwrap(), src);
    }

    #[test]
    fn test_unterminated_template() {
        assert!(minify_template_literals("html`<p>never closed").is_none());
    }

    #[test]
    fn test_escaped_backtick() {
        let src = "html`<code>\\`x\\`</code>`";
        assert_eq!(minify_template_literals(src).unwrap(), src);
    }
}
