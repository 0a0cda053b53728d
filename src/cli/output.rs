//! Styled output of the `tetra` commands.
//!
//! Styles are only applied when the target stream supports colour.

use std::fmt::Display;

use owo_colors::{OwoColorize, Style};
use supports_color::Stream;

/// What a piece of output tells the user, which decides its style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// The hypothesis file was changed.
    Changed,
    /// Worth a look, but nothing is blocked.
    Advice,
    /// A violation or an unusable entry.
    Broken,
    /// Secondary detail: ids, headings, annotations.
    Quiet,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Self::Changed => Style::new().green(),
            Self::Advice => Style::new().yellow(),
            Self::Broken => Style::new().red(),
            Self::Quiet => Style::new().dimmed(),
        }
    }

    /// Styles `text` for standard output.
    pub fn paint(self, text: impl Display) -> String {
        self.paint_on(Stream::Stdout, text)
    }

    fn paint_on(self, stream: Stream, text: impl Display) -> String {
        if supports_color::on_cached(stream).is_some() {
            text.style(self.style()).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Confirms a change written to the hypothesis file.
pub fn changed(message: impl Display) {
    println!("{}", Tone::Changed.paint(format_args!("✓ {message}")));
}

/// Prints a non-blocking remark.
pub fn advice(message: impl Display) {
    println!("{}", Tone::Advice.paint(format_args!("! {message}")));
}

/// Prints a violation.
pub fn violation(message: impl Display) {
    println!("{}", Tone::Broken.paint(format_args!("✗ {message}")));
}

/// Prints a violation on standard error, for commands whose standard output
/// is meant for other programs.
pub fn violation_to_stderr(message: impl Display) {
    eprintln!(
        "{}",
        Tone::Broken.paint_on(Stream::Stderr, format_args!("✗ {message}"))
    );
}

/// Whether listings should spread each entry over several short lines.
pub fn compact_layout() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < 60)
}
