//! Stylescope - build-time CSS Modules transform
//!
//! This library provides functionality to:
//! - Rewrite class selectors in style sources into locally-scoped,
//!   content-addressed names driven by a naming template
//! - Emit one rewritten CSS asset per input plus an ES module stub that
//!   exports the class-name mapping
//! - Defer import-path resolution through a sentinel token, resolved by a
//!   single closing pass once the full output tree exists
//!
//! The [`pipeline`] module ties everything together for the `stylescope`
//! binary; hosts embedding the transform in their own build drive
//! [`transform::StyleTransformer`] and [`resolve::resolve_output_files`]
//! directly, sharing one [`session::BuildSession`] per build.

pub mod cli;
pub mod config;
pub mod filter;
pub mod modules;
pub mod pipeline;
pub mod preprocess;
pub mod resolve;
pub mod scope;
pub mod session;
pub mod template;
pub mod transform;
pub mod watch;

pub use pipeline::{BuildContext, BuildPipeline, BuildSummary};
pub use resolve::{MagicPathResolver, MAGIC_PATH};
pub use scope::{ClassMapping, ScopedNameGenerator};
pub use session::BuildSession;
pub use transform::{StyleOptions, StyleTransformer, TransformOutput};
