//! Configuration for stylescope projects
//!
//! `stylescope.toml` discovery, parsing, validation, and CLI override
//! merging.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
