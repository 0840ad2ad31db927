//! Watch mode for automatic rebuilds on file changes
//!
//! Watches the source tree (and any dependency files the last build
//! reported, such as sass partials pulled in via `@import`) with a
//! debounced notify watcher, rebuilding on every relevant change. Build
//! failures are reported and watching continues.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::pipeline::{BuildContext, BuildPipeline, BuildSummary};

/// Error during watch mode
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WatchError {
    /// Failed to initialize file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// Source directory not found
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Run one build, printing the outcome without aborting the loop.
fn build_once(context: &BuildContext) -> Option<BuildSummary> {
    let start = Instant::now();
    match BuildPipeline::new(context.clone()).build() {
        Ok(summary) => {
            for warning in &summary.warnings {
                eprintln!("warning: {}", warning);
            }
            println!(
                "Built {} files into {} assets in {}",
                summary.files_transformed,
                summary.assets_emitted,
                format_duration(start.elapsed())
            );
            Some(summary)
        }
        Err(e) => {
            eprintln!("Build failed: {}", e);
            None
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Whether a change inside an output directory should be ignored (the
/// build's own writes would otherwise retrigger it forever).
fn is_output_path(path: &Path, out_dirs: &[PathBuf]) -> bool {
    out_dirs.iter().any(|dir| path.starts_with(dir))
}

/// Watch the project and rebuild on changes. Runs until the event channel
/// closes.
pub fn watch_and_rebuild(context: BuildContext) -> Result<(), WatchError> {
    let src_dir = context.src_dir();
    if !src_dir.is_dir() {
        return Err(WatchError::SourceNotFound(src_dir));
    }
    let out_dirs = context.out_dirs();

    let (tx, rx) = channel();
    let debounce = Duration::from_millis(context.config().watch.debounce_ms);
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;

    debouncer
        .watcher()
        .watch(&src_dir, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;

    // Dependency files may live outside the source tree (sass load paths);
    // register them individually and re-register after every build.
    let mut watched_deps: HashSet<PathBuf> = HashSet::new();
    let mut register_deps = |summary: &BuildSummary, watched: &mut HashSet<PathBuf>| {
        for dep in &summary.dependencies {
            if dep.exists() && !dep.starts_with(&src_dir) && watched.insert(dep.clone()) {
                if let Err(e) = debouncer.watcher().watch(dep, RecursiveMode::NonRecursive) {
                    eprintln!("warning: could not watch {}: {}", dep.display(), e);
                }
            }
        }
    };

    if let Some(summary) = build_once(&context) {
        register_deps(&summary, &mut watched_deps);
    }
    println!("Watching {} for changes...", src_dir.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    matches!(event.kind, DebouncedEventKind::Any)
                        && !is_output_path(&event.path, &out_dirs)
                });
                if !relevant {
                    continue;
                }

                for event in &events {
                    if let Some(name) = event.path.file_name() {
                        println!("Changed: {}", name.to_string_lossy());
                    }
                }
                if let Some(summary) = build_once(&context) {
                    register_deps(&summary, &mut watched_deps);
                }
                println!("Watching {} for changes...", src_dir.display());
            }
            Ok(Err(e)) => {
                // Watch error (non-fatal) - log but continue watching
                eprintln!("Watch error: {:?}", e);
            }
            Err(_) => break,
        }
    }

    Ok(())
}
