//! Status verbs displayed by the progress reporter

pub const USING: &str = "Using";
pub const SCANNING: &str = "Scanning";
pub const COMPILING: &str = "Compiling";
pub const EMITTED: &str = "Emitted";
pub const WATCHING: &str = "Watching";
pub const FAILED: &str = "Failed";
pub const DONE: &str = "Done";
