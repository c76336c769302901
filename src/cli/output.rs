//! Colored terminal output for CLI feedback.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{self, Write};

/// Writes user-facing messages to stdout/stderr with color when supported.
///
/// Diagnostics for developers go through `log`; this is for the person
/// running the command.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    choice: ColorChoice,
}

impl OutputManager {
    /// Creates an output manager.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            choice: ColorChoice::Auto,
        }
    }

    /// Disables colors.
    pub fn plain(mut self) -> Self {
        self.choice = ColorChoice::Never;
        self
    }

    fn write(&self, stream: &mut StandardStream, color: Option<Color>, bold: bool, message: &str) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        stream.set_color(&spec)?;
        write!(stream, "{}", message)?;
        stream.reset()?;
        writeln!(stream)
    }

    fn stdout(&self) -> StandardStream {
        StandardStream::stdout(self.choice)
    }

    fn stderr(&self) -> StandardStream {
        StandardStream::stderr(self.choice)
    }

    /// Progress step (`→ message`), hidden when quiet.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(&mut self.stdout(), Some(Color::Cyan), false, &format!("→ {message}"))
    }

    /// Success line (`✓ message`), hidden when quiet.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(&mut self.stdout(), Some(Color::Green), true, &format!("✓ {message}"))
    }

    /// Warning line on stderr, hidden when quiet.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(&mut self.stderr(), Some(Color::Yellow), false, &format!("⚠ {message}"))
    }

    /// Error line on stderr, always shown.
    pub fn error(&self, message: &str) -> io::Result<()> {
        self.write(&mut self.stderr(), Some(Color::Red), true, &format!("✗ {message}"))
    }

    /// Bold section header, hidden when quiet.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(&mut self.stdout(), None, true, title)
    }

    /// Indented plain line, hidden when quiet.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(&mut self.stdout(), None, false, &format!("  {message}"))
    }

    /// Dimmed detail line, shown only when verbose.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.write(&mut self.stdout(), Some(Color::White), false, message)
    }

    /// Unstyled line on stdout, always shown (machine-readable output).
    pub fn println(&self, message: &str) -> io::Result<()> {
        let mut stdout = self.stdout();
        writeln!(stdout, "{}", message)
    }
}
