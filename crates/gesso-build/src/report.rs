//! Build report: hash, timing, and the emitted asset list.

use std::fmt;

use xxhash_rust::xxh3::Xxh3;

/// A file emitted by a build pass.
#[derive(Debug, Clone)]
pub struct OutputAsset {
    /// Path relative to the output directory
    pub path: String,

    /// Size in bytes
    pub size: u64,

    /// xxh3 hash of the contents
    pub hash: u64,
}

/// Result of one build pass.
#[derive(Debug)]
pub struct BuildStats {
    /// Hash over all emitted assets
    pub hash: String,

    /// Wall-clock build time in milliseconds
    pub duration_ms: u64,

    /// Emitted assets, sorted by path
    pub assets: Vec<OutputAsset>,
}

impl BuildStats {
    /// Combine per-asset hashes into the stats for one pass.
    pub fn new(mut assets: Vec<OutputAsset>, duration_ms: u64) -> Self {
        assets.sort_by(|a, b| a.path.cmp(&b.path));

        let mut hasher = Xxh3::new();
        for asset in &assets {
            hasher.update(asset.path.as_bytes());
            hasher.update(&asset.hash.to_le_bytes());
        }
        let hash = format!("{:016x}", hasher.digest());

        Self {
            hash,
            duration_ms,
            assets,
        }
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hash: {}", self.hash)?;
        writeln!(f, "Time: {}ms", self.duration_ms)?;

        let name_width = self
            .assets
            .iter()
            .map(|a| a.path.len())
            .max()
            .unwrap_or(0)
            .max("Asset".len());

        let sizes: Vec<String> = self
            .assets
            .iter()
            .map(|a| format!("{:.2} kB", a.size as f64 / 1024.0))
            .collect();
        let size_width = sizes
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Size".len());

        writeln!(f, "  {:name_width$}  {:>size_width$}", "Asset", "Size")?;
        for (asset, size) in self.assets.iter().zip(&sizes) {
            writeln!(f, "  {:name_width$}  {:>size_width$}", asset.path, size)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(path: &str, size: u64, hash: u64) -> OutputAsset {
        OutputAsset {
            path: path.to_string(),
            size,
            hash,
        }
    }

    #[test]
    fn sorts_assets_by_path() {
        let stats = BuildStats::new(
            vec![asset("main.html", 10, 1), asset("assets/main.css", 20, 2)],
            5,
        );

        assert_eq!(stats.assets[0].path, "assets/main.css");
        assert_eq!(stats.assets[1].path, "main.html");
    }

    #[test]
    fn hash_is_deterministic_and_content_sensitive() {
        let a = BuildStats::new(vec![asset("main.html", 10, 1)], 5);
        let b = BuildStats::new(vec![asset("main.html", 10, 1)], 99);
        let c = BuildStats::new(vec![asset("main.html", 10, 2)], 5);

        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
    }

    #[test]
    fn report_lists_hash_time_and_assets() {
        let stats = BuildStats::new(
            vec![asset("main.html", 1536, 1), asset("assets/main.js", 512, 2)],
            42,
        );

        let report = stats.to_string();

        assert!(report.starts_with(&format!("Hash: {}", stats.hash)));
        assert!(report.contains("Time: 42ms"));
        assert!(report.contains("main.html"));
        assert!(report.contains("1.50 kB"));
        assert!(report.contains("assets/main.js"));
        assert!(report.contains("0.50 kB"));
        // Chunk/children/version detail is deliberately absent.
        assert!(!report.contains("chunk"));
    }
}
