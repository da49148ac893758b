//! Minification stage.
//!
//! Runs last when enabled, rewriting emitted `.js` and `.css` outputs in
//! place. Everything else (HTML, fingerprinted assets) is left untouched.

use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::minifier::{
    CompressOptions, CompressOptionsKeepNames, MangleOptions, Minifier, MinifierOptions,
};
use oxc::parser::Parser;
use oxc::span::SourceType;
use oxc::transformer::ESTarget;
use xxhash_rust::xxh3::xxh3_64;

use crate::builder::BuildError;
use crate::report::OutputAsset;

/// Minify every emitted script and stylesheet under `output_dir`, updating
/// the asset records to match the rewritten files.
pub fn run(output_dir: &Path, emitted: &mut [OutputAsset]) -> Result<(), BuildError> {
    for asset in emitted.iter_mut() {
        if !asset.path.ends_with(".js") && !asset.path.ends_with(".css") {
            continue;
        }

        let target = output_dir.join(&asset.path);
        let source = fs::read_to_string(&target).map_err(|e| BuildError::Read {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;

        let code = if asset.path.ends_with(".js") {
            minify_js(&source)
        } else {
            minify_css(&source).map_err(|message| BuildError::Style {
                path: asset.path.clone(),
                message,
            })?
        };

        fs::write(&target, &code).map_err(|e| BuildError::Write {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;

        asset.size = code.len() as u64;
        asset.hash = xxh3_64(code.as_bytes());
    }

    Ok(())
}

/// Mangle and compress a script.
pub fn minify_js(source_text: &str) -> String {
    let allocator = Allocator::default();
    let source_type = SourceType::default();

    let program = Parser::new(&allocator, source_text, source_type).parse().program;
    let program = allocator.alloc(program);

    let ret = Minifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions {
            target: ESTarget::ESNext,
            drop_debugger: false,
            drop_console: false,
            keep_names: CompressOptionsKeepNames {
                function: true,
                class: true,
            },
        }),
    })
    .build(&allocator, program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(program)
        .code
}

/// Minify a stylesheet with lightningcss.
pub fn minify_css(css: &str) -> Result<String, String> {
    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| format!("CSS parse error: {e}"))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| format!("CSS minify error: {e}"))?;

    Ok(minified.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const VERBOSE_JS: &str = r#"
function add(first, second) {
    const result = first + second;
    return result;
}
console.log(add(1, 2));
"#;

    #[test]
    fn minified_js_is_no_larger() {
        let minified = minify_js(VERBOSE_JS);

        assert!(minified.len() <= VERBOSE_JS.len());
        assert!(minified.contains("console.log"));
    }

    #[test]
    fn minified_css_collapses_whitespace() {
        let css = ".button {\n    background-color: blue;\n    padding: 10px;\n}\n";

        let minified = minify_css(css).unwrap();

        assert!(!minified.contains('\n'));
        assert!(minified.contains(".button"));
        assert!(minified.len() <= css.len());
    }

    #[test]
    fn stage_rewrites_scripts_and_styles_only() {
        let temp = tempdir().unwrap();
        let out = temp.path();
        fs::create_dir_all(out.join("assets")).unwrap();
        fs::write(out.join("assets/main.js"), VERBOSE_JS).unwrap();
        fs::write(out.join("assets/main.css"), "body {  margin : 0 ; }").unwrap();
        fs::write(out.join("main.html"), "<html>  </html>").unwrap();

        let mut emitted = vec![
            OutputAsset {
                path: "assets/main.js".into(),
                size: VERBOSE_JS.len() as u64,
                hash: 0,
            },
            OutputAsset {
                path: "assets/main.css".into(),
                size: 22,
                hash: 0,
            },
            OutputAsset {
                path: "main.html".into(),
                size: 16,
                hash: 0,
            },
        ];

        run(out, &mut emitted).unwrap();

        let js = fs::read_to_string(out.join("assets/main.js")).unwrap();
        assert!(js.len() <= VERBOSE_JS.len());
        assert_eq!(emitted[0].size, js.len() as u64);

        let css = fs::read_to_string(out.join("assets/main.css")).unwrap();
        assert!(!css.contains('\n'));

        // HTML untouched.
        assert_eq!(
            fs::read_to_string(out.join("main.html")).unwrap(),
            "<html>  </html>"
        );
    }
}
