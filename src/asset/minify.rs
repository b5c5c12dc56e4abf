//! Minification for served scripts and stylesheets.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. Tagged template
//! literals (`html`/`css`/`svg`) are compacted first by [`super::literals`].

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::literals::minify_template_literals;

/// Minify JavaScript module source.
///
/// Returns `None` when the source does not parse.
pub fn minify_js(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify a script including its embedded HTML/CSS template literals.
///
/// Literal compaction is best-effort: if it fails, or its output does not
/// parse, the script is minified as written.
pub fn minify_script(source: &str) -> Option<String> {
    minify_template_literals(source)
        .and_then(|compacted| minify_js(&compacted))
        .or_else(|| minify_js(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_js() {
        let out = minify_js(
            "export function add(first, second) {\n    return first + second;\n}\n",
        )
        .unwrap();
        assert!(out.contains("export"));
        assert!(!out.contains("    "));
        assert!(!out.contains("second"));
    }

    #[test]
    fn test_minify_js_rejects_invalid() {
        assert!(minify_js("export function (").is_none());
    }

    #[test]
    fn test_minify_css() {
        let out = minify_css("body {\n    color: red;\n}\n").unwrap();
        assert_eq!(out, "body{color:red}");
    }

    #[test]
    fn test_minify_script_compacts_templates() {
        let source =
            "export const t = html`\n    <div>\n        <span>${name}</span>\n    </div>\n`;\n";
        let out = minify_script(source).unwrap();
        assert!(out.contains("<div><span>${"));
        assert!(!out.contains("\n    <div>"));
    }

    #[test]
    fn test_minify_script_keeps_plain_strings() {
        let source = "export const a = `see html`;\nexport const b = \"a    b\";\n";
        let out = minify_script(source).unwrap();
        assert!(out.contains("a    b"));
    }

    #[test]
    fn test_minify_script_without_templates() {
        let out = minify_script("const answer = 42;\nexport { answer };\n").unwrap();
        assert!(out.contains("42"));
    }
}
