//! # transpile
//! The utility layer of a source-to-source compiler CLI: it discovers
//! compilable files under input directories, delegates the actual code
//! transformation to an external engine executable, and writes the compiled
//! output (plus sourcemap sidecars) under an output directory.
//!
//! No parsing or transformation happens in this crate; the engine owns all
//! of that.

mod core;
pub use crate::core::{
    transpile, Config, Engine, EngineError, EngineOptions, FileWatcher, Output, Runner,
    Verbosity, WatchError,
};
pub mod error;
mod fs;
pub use crate::fs::{
    add_source_mapping_url, adjust_relative, copy_permissions, delete_dir,
    read_dir_for_compilable, read_dir_recursive, ExtensionSet, DEFAULT_EXTENSIONS,
};
