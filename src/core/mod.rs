use crate::error::TranspileError;
use crate::fs::{
    add_source_mapping_url, adjust_relative, copy_permissions, delete_dir,
    read_dir_for_compilable, to_forward_slashes, ExtensionSet,
};
use error_stack::{IntoReport, Report, Result};
use std::path::{Path, PathBuf};
use termcolor::Color;

mod config;
pub use config::*;
mod engine;
pub use engine::*;
mod progress;
pub use progress::*;
mod watch;
pub use watch::*;
pub mod verbs;

/// Run the compiler with the given config
///
/// This is the main entry point. It takes a [`Config`] and runs the
/// compiler over the configured inputs. If an error occurs, it will be
/// printed to stderr and the function will return [`Err`].
///
/// If you want to retrieve the error object instead of printing it, use
/// [`Runner::run`].
pub fn transpile(config: Config) -> std::result::Result<(), ()> {
    match Runner::run(config) {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{:?}", e);
            Err(())
        }
    }
}

/// The runtime state of one compiler run
#[derive(Debug)]
pub struct Runner {
    /// The Config
    config: Config,
    /// The external transform engine
    engine: Engine,
    /// The Progress reporter
    progress: Progress,
    /// The compilable extension set for this run
    exts: ExtensionSet,
    /// The engine options forwarded with every invocation
    opts: EngineOptions,
}

/// A discovered source file scheduled for compilation
#[derive(Debug)]
struct Job {
    /// Absolute path of the source file
    source: PathBuf,
    /// Path relative to its input root, `/`-separated
    relative: String,
}

impl Runner {
    /// Internal run function
    ///
    /// This is what [`transpile`] calls internally. The difference is that
    /// this function returns the error instead of printing it.
    pub fn run(mut config: Config) -> Result<(), TranspileError> {
        log::info!("creating compiler runner");
        log::debug!("using config: {:?}", config);

        config.base_dir = config
            .base_dir
            .canonicalize()
            .into_report()
            .map_err(|e| {
                e.change_context(TranspileError)
                    .attach_printable("cannot resolve base directory")
            })?;

        let engine = Engine::new(&config.engine_cmd, config.num_threads).map_err(|e| {
            e.change_context(TranspileError).attach_printable(format!(
                "cannot resolve engine command: `{cmd}`",
                cmd = config.engine_cmd
            ))
        })?;

        let progress = Progress::new(config.verbosity.clone());

        let exts = match &config.extensions {
            Some(exts) => ExtensionSet::new(exts.iter().cloned()),
            None => ExtensionSet::default(),
        };

        let opts = EngineOptions {
            source_maps: config.source_maps,
            ..EngineOptions::default()
        };

        let runtime = Self {
            config,
            engine,
            progress,
            exts,
            opts,
        };

        runtime.run_internal()
    }

    fn run_internal(mut self) -> Result<(), TranspileError> {
        let _ = self
            .progress
            .print_status(verbs::USING, &self.engine.to_string(), Color::Yellow, false);
        let _ = self.progress.print_status(
            verbs::USING,
            &format!("{} thread(s)", self.config.num_threads),
            Color::Yellow,
            false,
        );

        if self.config.delete_out_dir {
            log::info!("deleting output directory");
            delete_dir(&self.config.out_dir).map_err(|e| {
                e.change_context(TranspileError)
                    .attach_printable("cannot delete output directory")
            })?;
        }

        let jobs = self.discover()?;
        self.compile_all(&jobs)?;

        let _ = self.progress.print_status(
            verbs::DONE,
            &format!("{} file(s)", jobs.len()),
            Color::Green,
            false,
        );

        if self.config.watch {
            self.run_watch()?;
        }

        Ok(())
    }

    /// Resolve the configured inputs into compile jobs.
    ///
    /// A directory input is scanned recursively for compilable files; a
    /// file input is taken as-is, with no extension or dotfile check.
    fn discover(&mut self) -> Result<Vec<Job>, TranspileError> {
        let mut jobs = Vec::new();
        for input in &self.config.inputs {
            let path = self.config.base_dir.join(input);
            if path.is_dir() {
                let _ = self
                    .progress
                    .print_status(verbs::SCANNING, input, Color::Yellow, true);
                log::info!("scanning directory: {}", path.display());
                let found =
                    read_dir_for_compilable(&path, self.config.include_dotfiles, &self.exts)
                        .map_err(|e| {
                            e.change_context(TranspileError)
                                .attach_printable("cannot scan input directory")
                        })?;
                log::info!("found {} compilable file(s)", found.len());
                for relative in found {
                    jobs.push(Job {
                        source: path.join(&relative),
                        relative,
                    });
                }
            } else if path.is_file() {
                let relative = match path.file_name() {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => input.clone(),
                };
                jobs.push(Job {
                    source: path,
                    relative,
                });
            } else {
                return Err(Report::new(TranspileError)
                    .attach_printable(format!("input `{input}` does not exist")));
            }
        }
        Ok(jobs)
    }

    fn compile_all(&mut self, jobs: &[Job]) -> Result<(), TranspileError> {
        if self.config.sync {
            for job in jobs {
                self.compile_one(job)?;
            }
            return Ok(());
        }

        // schedule everything on the engine's worker pool, then collect
        // completions in order
        let mut pending = Vec::with_capacity(jobs.len());
        for job in jobs {
            let _ = self
                .progress
                .print_status(verbs::COMPILING, &job.relative, Color::Green, false);
            log::info!("compiling file: {}", job.relative);
            pending.push(self.engine.compile_file_async(&job.source, &self.opts));
        }
        for (job, recv) in jobs.iter().zip(pending) {
            let result = recv.recv().into_report().map_err(|e| {
                e.change_context(TranspileError)
                    .attach_printable("engine worker disconnected unexpectedly")
            })?;
            let output = result.map_err(|e| {
                let _ = self
                    .progress
                    .print_status(verbs::FAILED, &job.relative, Color::Red, false);
                e.change_context(TranspileError)
            })?;
            self.emit(job, output)?;
        }
        Ok(())
    }

    /// Compile a single file on the calling thread.
    fn compile_one(&mut self, job: &Job) -> Result<(), TranspileError> {
        let _ = self
            .progress
            .print_status(verbs::COMPILING, &job.relative, Color::Green, false);
        log::info!("compiling file: {}", job.relative);
        let output = self
            .engine
            .compile_file(&job.source, &self.opts)
            .map_err(|e| {
                let _ = self
                    .progress
                    .print_status(verbs::FAILED, &job.relative, Color::Red, false);
                e.change_context(TranspileError)
            })?;
        self.emit(job, output)
    }

    /// Write one engine output under the output directory, with the
    /// rewritten extension, the sourcemap sidecar when present, and the
    /// source file's permissions.
    fn emit(&mut self, job: &Job, output: Output) -> Result<(), TranspileError> {
        let out_relative = adjust_relative(&job.relative, self.config.keep_file_extension);
        let out_path = self.config.out_dir.join(&out_relative);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).into_report().map_err(|e| {
                e.change_context(TranspileError).attach_printable(format!(
                    "cannot create output directory `{}`",
                    parent.display()
                ))
            })?;
        }

        let mut code = output.code;
        if let Some(map) = output.map {
            let map_path = map_sidecar(&out_path);
            code = add_source_mapping_url(&code, &map_path);
            std::fs::write(&map_path, map).into_report().map_err(|e| {
                e.change_context(TranspileError).attach_printable(format!(
                    "cannot write sourcemap `{}`",
                    map_path.display()
                ))
            })?;
        }

        std::fs::write(&out_path, code).into_report().map_err(|e| {
            e.change_context(TranspileError)
                .attach_printable(format!("cannot write output `{}`", out_path.display()))
        })?;

        copy_permissions(&job.source, &out_path).map_err(|e| {
            e.change_context(TranspileError)
                .attach_printable("cannot copy permissions onto output")
        })?;

        let _ = self
            .progress
            .print_status(verbs::EMITTED, &out_relative, Color::Green, true);
        Ok(())
    }

    /// Keep recompiling files as the watch backend reports changes.
    ///
    /// An unavailable backend is fatal. A failed recompile of a single
    /// changed file is reported and watching continues.
    fn run_watch(&mut self) -> Result<(), TranspileError> {
        let mut watcher = FileWatcher::new().map_err(|e| {
            e.change_context(TranspileError)
                .attach_printable("watch mode is not available")
        })?;

        let mut dir_roots = Vec::new();
        let mut file_inputs = Vec::new();
        for input in &self.config.inputs {
            let path = self.config.base_dir.join(input);
            if path.is_dir() {
                dir_roots.push(path);
            } else if path.is_file() {
                file_inputs.push(path);
            }
        }
        for target in dir_roots.iter().chain(&file_inputs) {
            watcher.watch(target).map_err(|e| {
                e.change_context(TranspileError)
                    .attach_printable("cannot start watching input")
            })?;
            let _ = self.progress.print_status(
                verbs::WATCHING,
                &target.display().to_string(),
                Color::Yellow,
                false,
            );
        }

        while let Some(changed) = watcher.next() {
            if !changed.is_file() {
                continue;
            }
            // a watched file input recompiles as-is; a file under a watched
            // directory goes through the same filter the scan applies
            let job = if let Some(file) = file_inputs.iter().find(|f| **f == changed) {
                let relative = match file.file_name() {
                    Some(name) => name.to_string_lossy().into_owned(),
                    None => continue,
                };
                Job {
                    source: changed.clone(),
                    relative,
                }
            } else if let Some(root) = dir_roots.iter().find(|r| changed.starts_with(r)) {
                if !self.passes_filter(&changed) {
                    continue;
                }
                let relative = match changed.strip_prefix(root) {
                    Ok(rel) => to_forward_slashes(rel),
                    Err(_) => continue,
                };
                Job {
                    source: changed.clone(),
                    relative,
                }
            } else {
                continue;
            };
            if let Err(e) = self.compile_one(&job) {
                log::warn!("recompiling {} failed: {e:?}", job.relative);
            }
        }

        Ok(())
    }

    /// Apply the dotfile rule and the extension filter to a changed path.
    fn passes_filter(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return false,
        };
        (self.config.include_dotfiles || !name.starts_with('.')) && self.exts.is_compilable(&name)
    }
}

fn map_sidecar(out_path: &Path) -> PathBuf {
    let mut s = out_path.as_os_str().to_os_string();
    s.push(".map");
    PathBuf::from(s)
}
