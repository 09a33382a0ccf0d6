//! Human-readable formatting of [`Error`]s.
//!
//! Errors raised while reading a document carry a line and column; given
//! the source text, the offending line is shown with a marker.
//!
//! # Example Output
//!
//! ```text
//! error: cannot convert '99999999999' to x:Int32
//!   ┌─ 3:5
//!   │
//! 3 │     <x:Int32>99999999999</x:Int32>
//!   │     ^
//!   = caused by: number too large to fit in target type
//! ```

use std::error::Error as _;
use std::fmt::Write;

use crate::error::Error;

// ============================================================================
// Diagnostic Options
// ============================================================================

/// Display style for diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayStyle {
    /// Message, location and source snippet.
    #[default]
    Rich,
    /// One line: `line:col: message`.
    Short,
}

/// Options for controlling diagnostic formatting.
///
/// # Example
///
/// ```
/// use markup_graph::diagnostic::{DiagnosticOptions, DisplayStyle};
///
/// let opts = DiagnosticOptions::plain().with_style(DisplayStyle::Short);
/// assert!(!opts.colored);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticOptions {
    /// Whether to use ANSI colors in output.
    pub colored: bool,
    /// Display style.
    pub style: DisplayStyle,
    /// Whether to include the source line.
    pub snippets: bool,
    /// Whether to list the chain of underlying causes.
    pub causes: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            colored: true,
            style: DisplayStyle::Rich,
            snippets: true,
            causes: true,
        }
    }
}

impl DiagnosticOptions {
    /// Create new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options for plain text output (no ANSI colors).
    pub fn plain() -> Self {
        Self {
            colored: false,
            ..Self::default()
        }
    }

    /// Create options for short format (`line:col: message`).
    pub fn short() -> Self {
        Self {
            style: DisplayStyle::Short,
            snippets: false,
            causes: false,
            ..Self::default()
        }
    }

    /// Set whether to use colors.
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Set display style.
    pub fn with_style(mut self, style: DisplayStyle) -> Self {
        self.style = style;
        self
    }

    /// Set whether to include source snippets.
    pub fn with_snippets(mut self, snippets: bool) -> Self {
        self.snippets = snippets;
        self
    }

    /// Set whether to include underlying causes.
    pub fn with_causes(mut self, causes: bool) -> Self {
        self.causes = causes;
        self
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Format an error. `source` is the document text the error was read from.
pub fn render(error: &Error, source: Option<&str>, options: &DiagnosticOptions) -> String {
    let inner = error.innermost();
    let message = inner.to_string();
    let location = error.location();

    if options.style == DisplayStyle::Short {
        return match location {
            Some((line, column)) => format!("{line}:{column}: {message}"),
            None => message,
        };
    }

    let paint = paint_fn(options);
    let paint_help = help_paint_fn(options);
    let mut out = String::new();
    let _ = writeln!(out, "{}: {message}", paint("error"));

    if let Some((line, column)) = location {
        let source_line = source
            .filter(|_| options.snippets)
            .and_then(|s| s.lines().nth(line.saturating_sub(1) as usize));
        let gutter = " ".repeat(line.to_string().len());
        let _ = writeln!(out, "{gutter} ┌─ {line}:{column}");
        if let Some(text) = source_line {
            let marker_pad: String = text
                .chars()
                .take(column.saturating_sub(1) as usize)
                .map(|c| if c == '\t' { '\t' } else { ' ' })
                .collect();
            let _ = writeln!(out, "{gutter} │");
            let _ = writeln!(out, "{line} │ {text}");
            let _ = writeln!(out, "{gutter} │ {marker_pad}{}", paint("^"));
        }
    }

    if options.causes {
        let mut cause = inner.source();
        while let Some(c) = cause {
            let _ = writeln!(out, "  = {}: {c}", paint_help("caused by"));
            cause = c.source();
        }
    }

    out.truncate(out.trim_end().len());
    out
}

// ============================================================================
// Internal Coloring (private)
// ============================================================================

#[cfg(feature = "colored-diagnostics")]
fn colorize(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.red().bold().to_string()
}

#[cfg(feature = "colored-diagnostics")]
fn colorize_help(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.cyan().to_string()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize(text: &str) -> String {
    text.to_owned()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize_help(text: &str) -> String {
    text.to_owned()
}

fn paint_fn(options: &DiagnosticOptions) -> fn(&str) -> String {
    if options.colored { colorize } else { str::to_owned }
}

fn help_paint_fn(options: &DiagnosticOptions) -> fn(&str) -> String {
    if options.colored { colorize_help } else { str::to_owned }
}
