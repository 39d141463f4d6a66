use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use transpile::{transpile, Config, Verbosity};

/// Compile files with an external transform engine
#[derive(Debug, Parser)]
#[command(name = "transpile", version, about)]
struct Cli {
    /// Input files or directories, relative to the base directory
    #[arg(default_value = ".")]
    inputs: Vec<String>,

    /// Base directory for resolving inputs
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Directory compiled output is written to
    #[arg(short = 'd', long, default_value = "dist")]
    out_dir: PathBuf,

    /// Also compile dotfiles
    #[arg(long)]
    include_dotfiles: bool,

    /// Override the compilable extension set (e.g. `.cjs,.mjs`)
    #[arg(short = 'x', long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Keep the source file extension on output paths
    #[arg(long)]
    keep_file_extension: bool,

    /// Emit source maps next to the compiled output
    #[arg(short = 's', long)]
    source_maps: bool,

    /// The engine command to delegate transformation to
    #[arg(long, default_value = "")]
    engine: String,

    /// Run the engine on the calling thread instead of the worker pool
    #[arg(long)]
    sync: bool,

    /// Delete the output directory before compiling
    #[arg(long)]
    delete_out_dir: bool,

    /// Keep running and recompile files as they change
    #[arg(short = 'w', long)]
    watch: bool,

    /// Number of worker threads for engine invocations
    #[arg(short = 'j', long, default_value_t = 4)]
    threads: usize,

    /// Suppress status output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show every emitted file
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Config {
            base_dir: self.base_dir,
            inputs: self.inputs,
            out_dir: self.out_dir,
            include_dotfiles: self.include_dotfiles,
            extensions: self.extensions,
            keep_file_extension: self.keep_file_extension,
            source_maps: self.source_maps,
            engine_cmd: self.engine,
            sync: self.sync,
            delete_out_dir: self.delete_out_dir,
            watch: self.watch,
            num_threads: self.threads,
            verbosity,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    // top-level fatal error boundary: any error report has already been
    // printed to stderr by `transpile`, so all that is left is the
    // non-zero exit
    match transpile(cli.into_config()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
