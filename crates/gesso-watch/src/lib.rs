//! Continuous rebuild support for gesso.
//!
//! Watches the site directory and reruns the build after every detected
//! change. Build failures are reported and watching continues; only watcher
//! setup failures end the loop.

pub mod watcher;

pub use watcher::{FileWatcher, WatchEvent};

use std::fs;
use std::path::PathBuf;

use gesso_build::{BuildConfig, BuildStats, SiteBuilder};

/// Build once, then rebuild after every detected source change.
///
/// `on_build` receives the stats of each successful pass. Runs until the
/// process terminates or the watcher channel closes.
pub async fn rebuild_on_change<F>(builder: SiteBuilder, mut on_build: F) -> std::io::Result<()>
where
    F: FnMut(&BuildStats),
{
    let site_dir = builder.config().site_dir.clone();

    run_pass(&builder, &mut on_build).await;

    // notify canonicalizes watch roots, so events carry absolute paths even
    // when the configured directories are relative. The exclusion below must
    // compare canonical forms or it never matches.
    let output_dir = canonical_output_dir(builder.config());

    let (_watcher, mut rx) = FileWatcher::new(std::slice::from_ref(&site_dir))?;
    tracing::info!("Watching {} for changes", site_dir.display());

    while let Some(event) = rx.recv().await {
        // Our own output must not retrigger a pass.
        if event.path().starts_with(&output_dir) {
            continue;
        }

        // Modifications to files no pipeline stage reads (editor scratch
        // files and the like) do not warrant a pass either.
        if let WatchEvent::Modified(path) = &event {
            tracing::debug!("Ignoring unrelated change: {}", path.display());
            continue;
        }

        tracing::debug!("Change detected: {:?}", event);
        run_pass(&builder, &mut on_build).await;
    }

    Ok(())
}

/// The output directory the way notify will report paths beneath it. The
/// initial pass normally has created it by the time this runs; fall back to
/// absolutizing against the working directory when it does not exist yet.
fn canonical_output_dir(config: &BuildConfig) -> PathBuf {
    let output_dir = &config.output_dir;
    fs::canonicalize(output_dir).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(output_dir))
            .unwrap_or_else(|_| output_dir.clone())
    })
}

async fn run_pass<F>(builder: &SiteBuilder, on_build: &mut F)
where
    F: FnMut(&BuildStats),
{
    match builder.build().await {
        Ok(stats) => on_build(&stats),
        Err(e) => tracing::error!("Build failed: {e}"),
    }
}
