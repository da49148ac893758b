//! Stylesheet pipeline.
//!
//! `.scss`/`.sass` entries are compiled with grass; `.less` and `.css` are
//! taken as plain CSS. Every sheet then runs through lightningcss with the
//! site's browser targets for vendor prefixing, after `url()` references have
//! been rewritten to their fingerprinted (or inlined) asset outputs.

use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use regex::Regex;

use crate::assets::AssetManifest;
use crate::builder::BuildError;

/// Browsers the emitted CSS must support.
pub const BROWSER_TARGETS: &[&str] = &["last 2 versions", "> 5%"];

/// Compile one stylesheet entry to its output CSS.
pub fn compile(
    entry: &Path,
    site_dir: &Path,
    manifest: &AssetManifest,
) -> Result<String, BuildError> {
    let ext = entry
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "scss" | "sass" => {
            let options = grass::Options::default().load_path(site_dir);
            grass::from_path(entry, &options).map_err(|e| BuildError::Style {
                path: entry.display().to_string(),
                message: e.to_string(),
            })?
        }
        // No LESS compiler exists in the Rust ecosystem; the CSS-compatible
        // subset parses below, anything else surfaces as a style error.
        _ => fs::read_to_string(entry).map_err(|e| BuildError::Read {
            path: entry.display().to_string(),
            message: e.to_string(),
        })?,
    };

    let rewritten = rewrite_urls(&raw, entry.parent().unwrap_or(site_dir), manifest);

    let targets = browser_targets();

    let mut sheet =
        StyleSheet::parse(&rewritten, ParserOptions::default()).map_err(|e| BuildError::Style {
            path: entry.display().to_string(),
            message: e.to_string(),
        })?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..Default::default()
        })
        .map_err(|e| BuildError::Style {
            path: entry.display().to_string(),
            message: e.to_string(),
        })?;

    let output = sheet
        .to_css(PrinterOptions {
            targets,
            ..Default::default()
        })
        .map_err(|e| BuildError::Style {
            path: entry.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(output.code)
}

fn browser_targets() -> Targets {
    let browsers = Browsers::from_browserslist(BROWSER_TARGETS.iter().copied())
        .expect("static browserslist query");
    Targets {
        browsers,
        ..Targets::default()
    }
}

/// Point relative `url()` references at their fingerprinted outputs.
fn rewrite_urls(css: &str, base: &Path, manifest: &AssetManifest) -> String {
    let url = Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).expect("static pattern");

    url.replace_all(css, |caps: &regex::Captures| {
        let reference = &caps[1];

        if reference.starts_with("data:")
            || reference.starts_with("http")
            || reference.starts_with("//")
            || reference.starts_with('#')
        {
            return caps[0].to_string();
        }

        // Strip cache-busting suffixes like ?v=1.0.0 before resolving.
        let trimmed = reference.split(['?', '#']).next().unwrap_or(reference);
        let resolved = base.join(trimmed);

        match manifest.css_reference(&resolved) {
            Some(target) => format!("url(\"{target}\")"),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}
