use std::path::PathBuf;

/// Config for one compiler run
///
/// Use this to configure the run when calling the crate as a library.
/// # Example
/// ```no_run
/// use transpile::{transpile, Config, Verbosity};
///
/// let mut cfg = Config::default();
/// cfg.inputs = vec!["src".to_string()];
/// cfg.verbosity = Verbosity::Verbose;
/// transpile(cfg).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for resolving input paths. This is usually the current directory.
    pub base_dir: PathBuf,
    /// The input files/directories, relative to `base_dir`
    pub inputs: Vec<String>,
    /// The directory compiled output is written to
    pub out_dir: PathBuf,
    /// Whether dotfiles are considered compilable input
    pub include_dotfiles: bool,
    /// Override of the compilable extension set (e.g. `[".cjs"]`).
    /// `None` uses the default set.
    pub extensions: Option<Vec<String>>,
    /// Keep the source file extension on output paths instead of
    /// rewriting it to `.js`
    pub keep_file_extension: bool,
    /// Ask the engine for source maps and emit `.map` sidecar files
    pub source_maps: bool,
    /// The engine command (e.g. `swc`). Empty string for the default engine.
    pub engine_cmd: String,
    /// Run the engine on the calling thread instead of the worker pool
    pub sync: bool,
    /// Delete the output directory before compiling
    pub delete_out_dir: bool,
    /// Keep running and recompile files as they change
    pub watch: bool,
    /// The number of worker threads for engine invocations
    pub num_threads: usize,
    /// The verbosity. See [`Verbosity`]
    pub verbosity: Verbosity,
}

impl Default for Config {
    /// Get the default config.
    ///
    /// This means:
    /// - Running from the current directory
    /// - Compiling the current directory into `dist`
    /// - Default extension set, no dotfiles
    /// - Output extensions rewritten to `.js`
    /// - No source maps, no watch mode
    /// - Default engine command, 4 worker threads
    /// - Regular verbosity
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            inputs: vec![".".to_string()],
            out_dir: PathBuf::from("dist"),
            include_dotfiles: false,
            extensions: None,
            keep_file_extension: false,
            source_maps: false,
            engine_cmd: "".to_string(),
            sync: false,
            delete_out_dir: false,
            watch: false,
            num_threads: 4,
            verbosity: Verbosity::Normal,
        }
    }
}

/// The verbosity config options
#[derive(Debug, PartialEq, Clone)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}
