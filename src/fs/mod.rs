//! Wrapper to perform file system operations
//!

mod path;
pub use path::*;

mod walk;
pub use walk::*;

mod util;
pub use util::*;
