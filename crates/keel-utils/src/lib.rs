//! Filesystem and path helpers shared by the keel crates.

pub mod error;
pub mod fs;
pub mod path;
