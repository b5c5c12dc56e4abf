//! Lexical location and substitution of module specifiers.
//!
//! This is a pattern scan, not a parser. It finds the quoted specifier in
//! static `import`/`export` statements and in the `src` attribute of
//! `<script type="module">` tags. Dynamically built specifiers are left alone.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::specifier::is_external;

/// Static `import`/`export` up to and including the quoted specifier.
static IMPORT_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:\bimport\b|\bexport\b)[\w\s*{},$]*?['"]([^'"\s]*?)['"]"#).unwrap()
});

static SCRIPT_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<script\b[^>]*>").unwrap());

static MODULE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\stype\s*=\s*["']?module\b"#).unwrap());

static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Kind of text being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Script,
    Html,
}

/// Byte ranges of every rewritable specifier, in order and non-overlapping.
pub fn find_specifiers(text: &str, kind: SourceKind) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = IMPORT_EXPORT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.range())
        .collect();

    if kind == SourceKind::Html {
        for tag in SCRIPT_TAG.find_iter(text) {
            if !MODULE_TYPE.is_match(tag.as_str()) {
                continue;
            }
            if let Some(caps) = SRC_ATTR.captures(tag.as_str())
                && let Some(src) = caps.get(1).or_else(|| caps.get(2))
            {
                ranges.push(tag.start() + src.start()..tag.start() + src.end());
            }
        }
        ranges.sort_by_key(|r| r.start);
    }

    let mut out: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        let specifier = &text[range.clone()];
        if specifier.is_empty() || is_external(specifier) {
            continue;
        }
        if out.last().is_some_and(|last| range.start < last.end) {
            continue;
        }
        out.push(range);
    }
    out
}

/// Replace each range with its paired text. Ranges must be sorted and disjoint.
pub fn splice(text: &str, edits: &[(Range<usize>, String)]) -> String {
    let extra: usize = edits.iter().map(|(_, s)| s.len()).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&text[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str, kind: SourceKind) -> Vec<&str> {
        find_specifiers(text, kind)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn test_import_forms() {
        let js = r#"
import { html, css } from 'lit';
import * as utils from "./utils";
import "side-effect";
export { a, b } from '@scope/pkg/dist/x.js';
export * from "../shared";
import {
    one,
    two,
} from "multi/line";
"#;
        assert_eq!(
            found(js, SourceKind::Script),
            [
                "lit",
                "./utils",
                "side-effect",
                "@scope/pkg/dist/x.js",
                "../shared",
                "multi/line"
            ]
        );
    }

    #[test]
    fn test_ignores_dynamic_and_plain_strings() {
        let js = r#"
const name = "lit";
const mod = await import(`./${name}.js`);
const other = import("./lazy");
exported("not-a-module");
"#;
        assert!(found(js, SourceKind::Script).is_empty());
    }

    #[test]
    fn test_skips_external_urls() {
        let js = r#"import x from "https://cdn.example.com/x.js"; import y from "y";"#;
        assert_eq!(found(js, SourceKind::Script), ["y"]);
    }

    #[test]
    fn test_html_module_scripts() {
        let html = r#"<html><head>
<script type="module" src="app/main"></script>
<script src="legacy.js"></script>
<script type='module' src='./boot'></script>
<script type="module">import { x } from "lit";</script>
</head></html>"#;
        assert_eq!(found(html, SourceKind::Html), ["app/main", "./boot", "lit"]);
    }

    #[test]
    fn test_data_attributes_not_mistaken() {
        let html = r#"<script type="module" data-src="x" src="app"></script>
<script data-type="module" src="classic"></script>"#;
        assert_eq!(found(html, SourceKind::Html), ["app"]);
    }

    #[test]
    fn test_script_tags_ignored_in_scripts() {
        let js = r#"const t = '<script type="module" src="app/main"></script>';"#;
        assert!(found(js, SourceKind::Script).is_empty());
    }

    #[test]
    fn test_splice_preserves_surroundings() {
        let js = r#"import a from "a"; import b from 'b';"#;
        let edits: Vec<_> = find_specifiers(js, SourceKind::Script)
            .into_iter()
            .map(|r| {
                let replacement = format!("/{}.js", &js[r.clone()]);
                (r, replacement)
            })
            .collect();
        assert_eq!(
            splice(js, &edits),
            r#"import a from "/a.js"; import b from '/b.js';"#
        );
    }

    #[test]
    fn test_splice_without_edits() {
        assert_eq!(splice("unchanged", &[]), "unchanged");
    }
}
