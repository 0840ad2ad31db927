//! Build-session state
//!
//! Explicit, build-scoped registries shared between the per-file transforms
//! and the closing resolution pass: which assets were emitted, and which
//! output directories the closing pass must sweep. Owned by the
//! orchestrator and passed by reference - never ambient module state - so
//! concurrent builds (tests included) cannot cross-contaminate.
//!
//! Appends are `Mutex`-protected; cross-file ordering is irrelevant and not
//! guaranteed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Shared state for one build.
#[derive(Debug, Default)]
pub struct BuildSession {
    /// Slash-normalized names of emitted CSS assets, deduplicated
    emitted_assets: Mutex<Vec<String>>,
    /// Output directories the closing pass enumerates, deduplicated
    output_dirs: Mutex<Vec<PathBuf>>,
}

impl BuildSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an output directory for the closing pass.
    pub fn add_output_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        let mut dirs = self.output_dirs.lock().expect("session lock poisoned");
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    /// Snapshot of the declared output directories.
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        self.output_dirs.lock().expect("session lock poisoned").clone()
    }

    /// Record an emitted asset name.
    ///
    /// Recording the same name again is a no-op: a re-transform of the same
    /// input overwrites the previous asset rather than duplicating it.
    pub fn record_asset(&self, name: impl Into<String>) {
        let name = name.into();
        let mut assets = self.emitted_assets.lock().expect("session lock poisoned");
        if !assets.contains(&name) {
            assets.push(name);
        }
    }

    /// Snapshot of the emitted asset names.
    pub fn emitted_assets(&self) -> Vec<String> {
        self.emitted_assets.lock().expect("session lock poisoned").clone()
    }

    /// Whether a path refers to an already-emitted asset.
    pub fn is_emitted_asset(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        self.emitted_assets
            .lock()
            .expect("session lock poisoned")
            .iter()
            .any(|asset| normalized.ends_with(asset.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_record_asset_dedupes() {
        let session = BuildSession::new();
        session.record_asset("a/styles.css");
        session.record_asset("a/styles.css");
        session.record_asset("b/styles.css");

        assert_eq!(session.emitted_assets().len(), 2);
    }

    #[test]
    fn test_output_dirs_dedupe() {
        let session = BuildSession::new();
        session.add_output_dir("dist");
        session.add_output_dir("dist");
        session.add_output_dir("dist-esm");

        assert_eq!(session.output_dirs().len(), 2);
    }

    #[test]
    fn test_is_emitted_asset() {
        let session = BuildSession::new();
        session.record_asset("widgets/button.css");

        assert!(session.is_emitted_asset(Path::new("/out/widgets/button.css")));
        assert!(!session.is_emitted_asset(Path::new("/out/widgets/other.css")));
    }

    #[test]
    fn test_concurrent_appends() {
        let session = Arc::new(BuildSession::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let session = Arc::clone(&session);
            handles.push(thread::spawn(move || {
                for j in 0..50 {
                    session.record_asset(format!("file_{}_{}.css", i, j));
                }
                session.add_output_dir(format!("out_{}", i));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(session.emitted_assets().len(), 8 * 50);
        assert_eq!(session.output_dirs().len(), 8);
    }
}
