//! Build pipeline orchestration
//!
//! Plays the host role for the style transform: discovers inputs, runs
//! per-file transforms in parallel, writes assets and stubs into every
//! declared output directory, and - only after all of that has completed -
//! runs the single closing pass that resolves deferred import paths.

use crate::config::StyleConfig;
use crate::resolve::{resolve_output_files, ResolveError, ResolveStats};
use crate::session::BuildSession;
use crate::transform::{StyleTransformer, TransformError, TransformOutput};
use glob::glob;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error during build execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// Source enumeration produced an invalid glob pattern
    #[error("Invalid source glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Source enumeration failed
    #[error("Failed to enumerate sources: {0}")]
    Glob(#[from] glob::GlobError),
    /// A per-file transform failed
    #[error(transparent)]
    Transform(#[from] TransformError),
    /// The closing resolution pass failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// IO error while reading sources or writing outputs
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Worker pool construction failed
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// Source directory missing
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Build context containing configuration and paths for a build operation.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: StyleConfig,
    /// Project root directory (where stylescope.toml is located)
    project_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
    /// Number of parallel jobs (None uses the default pool)
    jobs: Option<usize>,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: StyleConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, verbose: false, jobs: None }
    }

    /// Get the configuration.
    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source directory (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the output directories (resolved to absolute paths).
    pub fn out_dirs(&self) -> Vec<PathBuf> {
        self.config.project.out.iter().map(|dir| self.resolve_path(dir)).collect()
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs.max(1));
        self
    }

    /// Resolve a path relative to the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Result of a completed build.
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Style files transformed
    pub files_transformed: usize,
    /// CSS assets written (per output directory)
    pub assets_emitted: usize,
    /// Closing-pass counters
    pub resolve: ResolveStats,
    /// Non-fatal warnings collected from the scoping transformer
    pub warnings: Vec<String>,
    /// Dependency files referenced by the sources (for watch mode)
    pub dependencies: Vec<PathBuf>,
    /// Wall-clock build time
    pub total_duration: Duration,
}

/// Build pipeline for executing style builds.
pub struct BuildPipeline {
    context: BuildContext,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    pub fn new(context: BuildContext) -> Self {
        Self { context }
    }

    /// Run the full build: transform every source, write outputs, then
    /// resolve deferred import paths.
    ///
    /// Fail-fast: the first transform or IO failure aborts the build with
    /// no closing pass (and therefore no partially-resolved output).
    pub fn build(&self) -> Result<BuildSummary, BuildError> {
        match self.context.jobs {
            Some(jobs) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
                pool.install(|| self.run())
            }
            None => self.run(),
        }
    }

    fn run(&self) -> Result<BuildSummary, BuildError> {
        let start = Instant::now();

        let src_dir = self.context.src_dir();
        if !src_dir.is_dir() {
            return Err(BuildError::SourceNotFound(src_dir));
        }

        let transformer = StyleTransformer::new(self.context.config().style_options())?;
        let sources = self.discover(&transformer, &src_dir)?;

        if self.context.is_verbose() {
            println!("Build plan: {} style files", sources.len());
            for source in &sources {
                println!("  - {}", source.display());
            }
        }

        let session = BuildSession::new();
        for dir in self.context.out_dirs() {
            fs::create_dir_all(&dir)?;
            session.add_output_dir(dir);
        }

        // Per-file transforms are independent; the session only sees
        // concurrent appends.
        let project_root = self.context.project_root();
        let outputs: Vec<Option<TransformOutput>> = sources
            .par_iter()
            .map(|source| -> Result<Option<TransformOutput>, BuildError> {
                let code = fs::read_to_string(source)?;
                Ok(transformer.transform(source, &code, project_root, &session)?)
            })
            .collect::<Result<_, _>>()?;
        let outputs: Vec<TransformOutput> = outputs.into_iter().flatten().collect();

        let mut summary = BuildSummary {
            files_transformed: outputs.len(),
            ..BuildSummary::default()
        };

        for output in &outputs {
            for warning in &output.warnings {
                summary.warnings.push(warning.clone());
            }
            for dependency in &output.dependencies {
                if !summary.dependencies.contains(dependency) {
                    summary.dependencies.push(dependency.clone());
                }
            }
            for dir in self.context.out_dirs() {
                let asset_path = dir.join(&output.asset.file_name);
                if let Some(parent) = asset_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&asset_path, &output.asset.source)?;

                let stub_path = asset_path.with_extension("js");
                fs::write(&stub_path, &output.code)?;
                summary.assets_emitted += 1;
            }
        }

        // Barrier: every transform and every output write has completed.
        // The closing pass now has visibility into the full output tree.
        summary.resolve =
            resolve_output_files(&session, &self.context.config().resolver())?;

        summary.total_duration = start.elapsed();
        Ok(summary)
    }

    /// Discover style files under the source directory that the transformer
    /// claims (filter plus loader registry).
    fn discover(
        &self,
        transformer: &StyleTransformer,
        src_dir: &Path,
    ) -> Result<Vec<PathBuf>, BuildError> {
        let pattern = format!("{}/**/*", src_dir.display());
        let mut files = Vec::new();
        for entry in glob(&pattern)? {
            let path = entry?;
            if path.is_file() && transformer.claims(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
