//! Single line, in place, progress bar.
//!
//! The bar is redrawn over itself with a carriage return on every update and
//! the line is terminated once the operation reaches 100%:
//!
//! ```text
//! Download [#####---------------]  25.0%
//! ```

use std::io::{self, Stdout, Write};

use log::debug;

use crate::settings::DEFAULT_BAR_WIDTH;

// =============================================================================
// Public Interface
// =============================================================================

/// Receives the number of bytes transferred so far out of a known total.
pub trait Progress {
    fn update(&mut self, transferred: u64, total: u64);

    /// The transfer stopped before reaching its total.
    fn abort(&mut self) {}
}

/// Renders the bar for `progress` out of `total` on `out`.
#[derive(Debug)]
pub struct ProgressBar<W: Write = Stdout> {
    title: String,
    width: usize,
    out: W,
    open: bool,
}

impl ProgressBar<Stdout> {
    /// A bar of the default width drawn on `stdout`.
    pub fn stdout(title: impl Into<String>) -> Self {
        Self::new(title, io::stdout())
    }
}

impl<W: Write> ProgressBar<W> {
    pub fn new(title: impl Into<String>, out: W) -> Self {
        Self {
            title: title.into(),
            width: DEFAULT_BAR_WIDTH,
            out,
            open: false,
        }
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Redraws the bar. Out of range values are clamped, and a zero `total`
    /// draws nothing since there is no meaningful fraction to show.
    pub fn render(&mut self, progress: f64, total: f64) {
        if total == 0.0 {
            debug!("progress bar `{}` has no total, not rendered", self.title);
            return;
        }
        let (line, complete) = render_line(&self.title, progress, total, self.width);
        if let Err(e) = self.draw(&line, complete) {
            debug!("could not draw the progress bar: {}", e);
        }
    }

    /// Ends a bar line left unfinished, so whatever is printed next starts on
    /// its own line. Does nothing if no partial bar is on screen.
    pub fn end_line(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = writeln!(self.out).and_then(|_| self.out.flush()) {
            debug!("could not end the progress bar line: {}", e);
        }
    }

    /// Gives back the output the bar was drawing on.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, line: &str, complete: bool) -> io::Result<()> {
        write!(self.out, "\r{}", line)?;
        self.open = !complete;
        if complete {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

impl<W: Write> Progress for ProgressBar<W> {
    fn update(&mut self, transferred: u64, total: u64) {
        self.render(transferred as f64, total as f64);
    }

    fn abort(&mut self) {
        self.end_line();
    }
}

/// Formats one state of the bar, and tells if it is the final one (100%).
///
/// `total` must not be zero.
pub fn render_line(title: &str, progress: f64, total: f64, width: usize) -> (String, bool) {
    let filled = (width as f64 * progress / total).floor();
    let filled = filled.max(0.0).min(width as f64) as usize;
    let percent = (100.0 * progress / total).max(0.0).min(100.0);

    let line = format!(
        "{} [{}{}] {:5.1}%",
        title,
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    );
    (line, percent == 100.0)
}

// =============================================================================
// Unit Tests
// =============================================================================
