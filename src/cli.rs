//! Command-line interface implementation
//!
//! Entry point for the `stylescope` binary: `build`, `watch`, and `init`.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{
    default_config, find_config, load_config, merge_cli_overrides, starter_config, CliOverrides,
    StyleConfig, CONFIG_FILE,
};
use crate::pipeline::{BuildContext, BuildPipeline};
use crate::watch::watch_and_rebuild;

pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;

/// Stylescope - scoped CSS class names for library builds
#[derive(Parser)]
#[command(name = "stylescope")]
#[command(about = "Stylescope - build-time CSS Modules transform")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared flags for build-like commands.
#[derive(Debug, clap::Args)]
pub struct BuildArgs {
    /// Source directory (overrides config)
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Output directory; may be given multiple times (overrides config)
    #[arg(long = "out")]
    pub out: Vec<PathBuf>,

    /// Naming template, e.g. "[local]_[hash:base64:6]" (overrides config)
    #[arg(long)]
    pub scoped_name: Option<String>,

    /// Prefix prepended to every generated class name (overrides config)
    #[arg(long)]
    pub class_name_prefix: Option<String>,

    /// Replacement prefix for deferred import paths, or "auto" for
    /// per-file relative resolution (overrides config)
    #[arg(long)]
    pub magic_path_prefix: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transform style sources into scoped CSS assets and module stubs
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Build, then rebuild automatically on file changes
    Watch {
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Write a starter stylescope.toml into the current directory
    Init {
        /// Project name recorded in the config
        #[arg(default_value = "styles")]
        name: String,
    },
}

/// Parse arguments and run the selected command.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { args } => run_build(&args),
        Commands::Watch { args } => run_watch(&args),
        Commands::Init { name } => run_init(&name),
    }
}

/// Locate and load configuration, falling back to defaults when no config
/// file exists. Returns the config together with the project root.
fn load_project(args: &BuildArgs) -> Result<(StyleConfig, PathBuf), ExitCode> {
    let (mut config, project_root) = match find_config() {
        Some(config_path) => {
            if args.verbose {
                println!("Using config: {}", config_path.display());
            }
            let config = match load_config(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return Err(ExitCode::from(EXIT_ERROR));
                }
            };
            let root = config_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (config, root)
        }
        None => {
            if args.verbose {
                println!("No {} found, using defaults", CONFIG_FILE);
            }
            (default_config(), std::env::current_dir().unwrap_or_default())
        }
    };

    let overrides = CliOverrides {
        src: args.src.clone(),
        out: if args.out.is_empty() { None } else { Some(args.out.clone()) },
        scoped_name: args.scoped_name.clone(),
        class_name_prefix: args.class_name_prefix.clone(),
        magic_path_prefix: args.magic_path_prefix.clone(),
        ..CliOverrides::default()
    };
    merge_cli_overrides(&mut config, &overrides);

    Ok((config, project_root))
}

fn build_context(args: &BuildArgs) -> Result<BuildContext, ExitCode> {
    let (config, project_root) = load_project(args)?;
    let mut context = BuildContext::new(config, project_root).with_verbose(args.verbose);
    if let Some(jobs) = args.jobs {
        context = context.with_jobs(jobs);
    }
    Ok(context)
}

fn run_build(args: &BuildArgs) -> ExitCode {
    let context = match build_context(args) {
        Ok(context) => context,
        Err(code) => return code,
    };

    match BuildPipeline::new(context).build() {
        Ok(summary) => {
            for warning in &summary.warnings {
                eprintln!("warning: {}", warning);
            }
            println!(
                "Built {} style files, wrote {} assets, resolved {} program files ({} rewritten)",
                summary.files_transformed,
                summary.assets_emitted,
                summary.resolve.files_scanned,
                summary.resolve.files_rewritten,
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Build failed: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run_watch(args: &BuildArgs) -> ExitCode {
    let context = match build_context(args) {
        Ok(context) => context,
        Err(code) => return code,
    };

    println!("Starting watch mode... press Ctrl+C to stop");
    match watch_and_rebuild(context) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch failed: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run_init(name: &str) -> ExitCode {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        eprintln!("{} already exists", CONFIG_FILE);
        return ExitCode::from(EXIT_ERROR);
    }
    match std::fs::write(path, starter_config(name)) {
        Ok(()) => {
            println!("Wrote {}", CONFIG_FILE);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Failed to write {}: {}", CONFIG_FILE, e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_args() {
        let cli = Cli::parse_from([
            "stylescope",
            "build",
            "--src",
            "styles",
            "--out",
            "dist",
            "--out",
            "dist-esm",
            "--jobs",
            "4",
        ]);
        let Commands::Build { args } = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.src, Some(PathBuf::from("styles")));
        assert_eq!(args.out.len(), 2);
        assert_eq!(args.jobs, Some(4));
    }
}
