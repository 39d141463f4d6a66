//! Invocation of the external transform engine
//!
//! All actual code transformation is delegated to an external compiler
//! executable. This layer resolves the executable, hands it the options
//! structure (with the filename injected) and the source, and parses the
//! output object back. It performs no transformation of its own.

use error_stack::{IntoReport, Report, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use threadpool::{Builder, ThreadPool};
use which::which;

/// Environment variable holding the name of the file being transformed.
pub const TRANSPILE_FILE: &str = "TRANSPILE_FILE";

/// The engine executable used when the configured command is empty.
const DEFAULT_ENGINE: &str = "swc";

/// Error related to the external engine
#[derive(Debug)]
pub enum EngineError {
    /// The engine executable could not be resolved
    Resolve,
    /// The engine could not be spawned, or reported failure
    Execute,
    /// The engine produced output this layer cannot understand
    Protocol,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Resolve => write!(f, "Error resolving engine executable"),
            EngineError::Execute => write!(f, "Error executing engine"),
            EngineError::Protocol => write!(f, "Error reading engine output"),
        }
    }
}

impl error::Error for EngineError {}

/// Options forwarded to the external engine.
///
/// Aside from injecting `filename` for in-memory transforms, this layer
/// passes the structure through unmodified; the engine owns its own options
/// schema, carried in `rest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default)]
    pub source_maps: bool,
    /// Engine-defined options, forwarded verbatim.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// Transformed output returned by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
}

enum EngineInput {
    /// Source text fed to the engine's stdin
    Source(String),
    /// A file path handed to the engine as an argument
    File(PathBuf),
}

/// A resolved external transform engine.
///
/// Holds the resolved executable and a worker pool for the non-blocking
/// entry points. The engine itself owns whatever concurrency it has; this
/// layer only promises not to block the caller's thread on the `_async`
/// variants.
#[derive(Debug)]
pub struct Engine {
    invocation: Invocation,
    pool: ThreadPool,
}

#[derive(Debug, Clone)]
struct Invocation {
    /// The engine executable
    exe: String,
    /// Arguments always passed to the executable
    args: Vec<String>,
}

impl Display for Engine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.invocation, f)
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.exe)
        } else {
            write!(f, "{} {}", self.exe, self.args.join(" "))
        }
    }
}

impl Engine {
    /// Create an engine from the given command string (e.g. `swc --cjs`).
    /// An empty command selects the default engine executable.
    pub fn new(cmd: &str, num_threads: usize) -> Result<Self, EngineError> {
        let mut parts = cmd.split_whitespace();
        let exe = match parts.next() {
            None => DEFAULT_ENGINE,
            Some(exe) => exe,
        };
        let exe = resolve_engine(exe)?;
        let args = parts.map(String::from).collect::<Vec<_>>();
        let pool = Builder::new().num_threads(num_threads).build();
        Ok(Self {
            invocation: Invocation { exe, args },
            pool,
        })
    }

    /// Transform in-memory source text. Blocks until the engine finishes.
    ///
    /// `filename` is injected into the options unless the caller already
    /// set one.
    pub fn transform(
        &self,
        filename: &str,
        code: &str,
        opts: &EngineOptions,
    ) -> Result<Output, EngineError> {
        let opts = inject_filename(opts, filename);
        self.invocation.run(EngineInput::Source(code.to_string()), &opts)
    }

    /// Non-blocking variant of [`transform`](Self::transform). The engine
    /// runs on the worker pool; the returned receiver delivers exactly one
    /// completion.
    pub fn transform_async(
        &self,
        filename: &str,
        code: &str,
        opts: &EngineOptions,
    ) -> mpsc::Receiver<Result<Output, EngineError>> {
        let opts = inject_filename(opts, filename);
        self.schedule(EngineInput::Source(code.to_string()), opts)
    }

    /// Compile a file on disk. Blocks until the engine finishes.
    ///
    /// The options are forwarded as-is; the engine reads the file itself.
    pub fn compile_file(&self, file: &Path, opts: &EngineOptions) -> Result<Output, EngineError> {
        self.invocation
            .run(EngineInput::File(file.to_path_buf()), opts)
    }

    /// Non-blocking variant of [`compile_file`](Self::compile_file).
    pub fn compile_file_async(
        &self,
        file: &Path,
        opts: &EngineOptions,
    ) -> mpsc::Receiver<Result<Output, EngineError>> {
        self.schedule(EngineInput::File(file.to_path_buf()), opts.clone())
    }

    fn schedule(
        &self,
        input: EngineInput,
        opts: EngineOptions,
    ) -> mpsc::Receiver<Result<Output, EngineError>> {
        let invocation = self.invocation.clone();
        let (send, recv) = mpsc::channel();
        self.pool.execute(move || {
            let result = invocation.run(input, &opts);
            // the caller may have dropped the receiver
            let _ = send.send(result);
        });
        recv
    }
}

fn inject_filename(opts: &EngineOptions, filename: &str) -> EngineOptions {
    let mut opts = opts.clone();
    if opts.filename.is_none() {
        opts.filename = Some(filename.to_string());
    }
    opts
}

fn resolve_engine(exe: &str) -> Result<String, EngineError> {
    let path = which(exe).into_report().map_err(|e| {
        e.change_context(EngineError::Resolve).attach_printable(format!(
            "cannot find engine executable `{exe}`; is the external compiler installed?"
        ))
    })?;
    Ok(path.display().to_string())
}

impl Invocation {
    /// Run the engine once. Returns the parsed output object.
    fn run(&self, input: EngineInput, opts: &EngineOptions) -> Result<Output, EngineError> {
        let opts_json = serde_json::to_string(opts)
            .into_report()
            .change_context(EngineError::Protocol)
            .attach_printable("cannot serialize engine options")?;

        let mut command = Command::new(&self.exe);
        command
            .args(&self.args)
            .arg("--options")
            .arg(&opts_json)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(filename) = &opts.filename {
            command.env(TRANSPILE_FILE, filename);
        }
        match &input {
            EngineInput::Source(_) => {
                command.stdin(Stdio::piped());
            }
            EngineInput::File(path) => {
                command.stdin(Stdio::null());
                command.arg(path);
            }
        }

        log::debug!("engine options `{opts_json}`");
        let mut child = command.spawn().into_report().map_err(|e| {
            e.change_context(EngineError::Execute)
                .attach_printable(format!("failed to spawn engine `{self}`"))
        })?;

        // stdin is fed from a separate thread while stdout/stderr drain;
        // a single-threaded write deadlocks against an engine that fills
        // its output pipes before reading its input
        let mut writer = None;
        if let EngineInput::Source(code) = input {
            if let Some(mut stdin) = child.stdin.take() {
                writer = Some(std::thread::spawn(move || {
                    // dropping stdin closes the pipe so the engine sees EOF
                    stdin.write_all(code.as_bytes())
                }));
            }
        }

        let result = child
            .wait_with_output()
            .into_report()
            .change_context(EngineError::Execute)?;

        if let Some(writer) = writer {
            let write_result = writer.join().map_err(|_| {
                Report::new(EngineError::Execute)
                    .attach_printable("engine stdin writer panicked")
            })?;
            match write_result {
                Ok(()) => {}
                // an engine may exit without draining its stdin
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => {
                    return Err(Report::new(e)
                        .change_context(EngineError::Execute)
                        .attach_printable("failed to write source to engine stdin"))
                }
            }
        }

        if result.status.success() {
            let stdout = String::from_utf8_lossy(&result.stdout);
            log::debug!("engine output `{stdout}`");
            serde_json::from_str(&stdout)
                .into_report()
                .change_context(EngineError::Protocol)
                .attach_printable("engine did not produce a valid output object")
        } else {
            let exit_code = match result.status.code() {
                Some(code) => code.to_string(),
                None => "unknown".to_string(),
            };
            Err(Report::new(EngineError::Execute).attach_printable(format!(
                "Engine `{}` failed with exit code {}: {}",
                self,
                exit_code,
                String::from_utf8_lossy(&result.stderr)
            )))
        }
    }
}
