//! Static asset fingerprinting.
//!
//! Images and fonts found under the site directory are copied into the output
//! directory under content-hashed names, so emitted stylesheets can reference
//! them with far-future cache headers. Small web fonts are inlined as data
//! URIs instead of being emitted.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

use crate::builder::BuildError;
use crate::report::OutputAsset;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "eot", "svg"];

/// Fonts at or below this many bytes become data URIs.
const INLINE_LIMIT: u64 = 10_000;

/// Where a source asset ended up.
#[derive(Debug, Clone)]
pub enum AssetOutput {
    /// Emitted under this path, relative to the output directory
    File(String),

    /// Inlined as a data URI
    Inline(String),
}

/// Maps source asset paths to their fingerprinted outputs.
#[derive(Debug, Default)]
pub struct AssetManifest {
    entries: HashMap<PathBuf, AssetOutput>,
}

impl AssetManifest {
    /// Fingerprint every image and font under `site_dir`, copying emitted
    /// files into `output_dir`.
    pub fn collect(
        site_dir: &Path,
        output_dir: &Path,
    ) -> Result<(Self, Vec<OutputAsset>), BuildError> {
        let mut entries = HashMap::new();
        let mut emitted = Vec::new();

        for entry in WalkDir::new(site_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            // The output directory may be nested inside the site directory.
            if path.starts_with(output_dir) || !path.is_file() {
                continue;
            }

            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();

            let kind = if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                "images"
            } else if FONT_EXTENSIONS.contains(&ext.as_str()) {
                "fonts"
            } else {
                continue;
            };

            let bytes = fs::read(path).map_err(|e| BuildError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

            let source = normalize(path);

            if inline_mime(&ext).is_some() && bytes.len() as u64 <= INLINE_LIMIT {
                let uri = data_uri(&ext, &bytes);
                entries.insert(source, AssetOutput::Inline(uri));
                continue;
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("asset");
            let relative = format!("{}/{}.{}.{}", kind, stem, fingerprint(&bytes), ext);

            let target = output_dir.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::Write {
                    path: parent.display().to_string(),
                    message: e.to_string(),
                })?;
            }
            fs::write(&target, &bytes).map_err(|e| BuildError::Write {
                path: target.display().to_string(),
                message: e.to_string(),
            })?;

            emitted.push(OutputAsset {
                path: relative.clone(),
                size: bytes.len() as u64,
                hash: xxh3_64(&bytes),
            });
            entries.insert(source, AssetOutput::File(relative));
        }

        Ok((Self { entries }, emitted))
    }

    /// Look up the output for a source asset path.
    pub fn lookup(&self, path: &Path) -> Option<&AssetOutput> {
        self.entries.get(&normalize(path))
    }

    /// The string a stylesheet under `assets/` should use to reference the
    /// asset at `path`, if the manifest knows it.
    pub fn css_reference(&self, path: &Path) -> Option<String> {
        match self.lookup(path)? {
            AssetOutput::File(relative) => Some(format!("../{relative}")),
            AssetOutput::Inline(uri) => Some(uri.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// First 8 hex digits of the xxh3 content hash.
fn fingerprint(bytes: &[u8]) -> String {
    let digest = format!("{:016x}", xxh3_64(bytes));
    digest[..8].to_string()
}

fn inline_mime(ext: &str) -> Option<&'static str> {
    match ext {
        "woff" => Some("font/woff"),
        "woff2" => Some("font/woff2"),
        _ => None,
    }
}

fn data_uri(ext: &str, bytes: &[u8]) -> String {
    let mime = inline_mime(ext).unwrap_or("application/octet-stream");
    format!(
        "data:{};base64,{}",
        mime,
        base64_simd::STANDARD.encode_to_string(bytes)
    )
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fingerprints_images_deterministically() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("website");
        let out = temp.path().join("_target");
        fs::create_dir_all(site.join("img")).unwrap();
        fs::write(site.join("img/logo.png"), b"not really a png").unwrap();

        let (_, emitted) = AssetManifest::collect(&site, &out).unwrap();

        assert_eq!(emitted.len(), 1);
        let expected = format!("images/logo.{}.png", fingerprint(b"not really a png"));
        assert_eq!(emitted[0].path, expected);
        assert!(out.join(&expected).exists());

        // Same content, same name.
        let (_, again) = AssetManifest::collect(&site, &out).unwrap();
        assert_eq!(again[0].path, expected);
    }

    #[test]
    fn large_fonts_are_emitted_under_fonts() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("website");
        let out = temp.path().join("_target");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("body.ttf"), vec![0u8; 64]).unwrap();

        let (manifest, emitted) = AssetManifest::collect(&site, &out).unwrap();

        assert!(emitted[0].path.starts_with("fonts/body."));
        let reference = manifest.css_reference(&site.join("body.ttf")).unwrap();
        assert!(reference.starts_with("../fonts/body."));
    }

    #[test]
    fn small_woff_is_inlined_not_emitted() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("website");
        let out = temp.path().join("_target");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("icons.woff"), vec![1u8; 100]).unwrap();

        let (manifest, emitted) = AssetManifest::collect(&site, &out).unwrap();

        assert!(emitted.is_empty());
        let reference = manifest.css_reference(&site.join("icons.woff")).unwrap();
        assert!(reference.starts_with("data:font/woff;base64,"));
    }

    #[test]
    fn fonts_above_the_inline_limit_are_emitted() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("website");
        let out = temp.path().join("_target");
        fs::create_dir_all(&site).unwrap();
        fs::write(site.join("big.woff"), vec![1u8; 20_000]).unwrap();

        let (manifest, emitted) = AssetManifest::collect(&site, &out).unwrap();

        assert_eq!(emitted.len(), 1);
        assert!(matches!(
            manifest.lookup(&site.join("big.woff")),
            Some(AssetOutput::File(_))
        ));
    }

    #[test]
    fn lookup_resolves_parent_components() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("website");
        let out = temp.path().join("_target");
        fs::create_dir_all(site.join("styles")).unwrap();
        fs::write(site.join("pattern.gif"), b"gif").unwrap();

        let (manifest, _) = AssetManifest::collect(&site, &out).unwrap();

        let via_parent = site.join("styles").join("../pattern.gif");
        assert!(manifest.lookup(&via_parent).is_some());
    }

    #[test]
    fn skips_output_directory_nested_in_site() {
        let temp = tempdir().unwrap();
        let site = temp.path().join("website");
        let out = site.join("_target");
        fs::create_dir_all(out.join("images")).unwrap();
        fs::write(out.join("images/old.png"), b"stale").unwrap();

        let (manifest, emitted) = AssetManifest::collect(&site, &out).unwrap();

        assert!(emitted.is_empty());
        assert!(manifest.is_empty());
    }
}
