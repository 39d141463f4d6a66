//! Utility for displaying progress

use crate::core::Verbosity;
use std::error::Error;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Status reporter writing right-aligned colored verbs to stderr.
pub struct Progress {
    out: StandardStream,
    verbosity: Verbosity,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("verbosity", &self.verbosity)
            .finish()
    }
}

impl Progress {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            out: StandardStream::stderr(ColorChoice::Always),
            verbosity,
        }
    }

    /// Print a status line. Lines marked `verbose` only show at
    /// [`Verbosity::Verbose`]; nothing shows at [`Verbosity::Quiet`].
    pub fn print_status(
        &mut self,
        status: &str,
        message: &str,
        color: Color,
        verbose: bool,
    ) -> Result<(), Box<dyn Error>> {
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        if verbose && self.verbosity != Verbosity::Verbose {
            return Ok(());
        }
        self.out.reset()?;
        self.out
            .set_color(ColorSpec::new().set_bold(true).set_fg(Some(color)))?;
        write!(self.out, "{:>12}", status)?;
        self.out.reset()?;
        writeln!(self.out, " {}", message)?;
        Ok(())
    }
}
