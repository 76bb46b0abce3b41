//! Error types for the edges of the crate.
//!
//! Scanning itself never fails: malformed input is reported through the
//! diagnostics records. `ArgError` is used where a caller turns a blocking
//! signal into a hard failure, and for configuration and usage problems in
//! the binary. It carries the same context/position pair the tokenizer
//! reports so the offending spot can be pointed at.

use std::fmt;

/// Categorized error types for better diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A blocking diagnostics signal was raised for the input line
    Blocked,
    /// Error loading/parsing configuration
    Config,
    /// Bad command line flags
    Usage,
    /// Reading the line or writing the result failed
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Blocked => write!(f, "Blocked"),
            ErrorKind::Config => write!(f, "Config error"),
            ErrorKind::Usage => write!(f, "Usage error"),
            ErrorKind::Io => write!(f, "I/O error"),
        }
    }
}

/// Rich error type with context information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgError {
    pub kind: ErrorKind,
    pub message: String,
    /// Additional context explaining what was being processed
    pub context: Option<String>,
    /// Byte position in the line where the problem was found
    pub position: Option<usize>,
}

impl ArgError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ArgError {
            kind,
            message: message.into(),
            context: None,
            position: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_position(mut self, pos: usize) -> Self {
        self.position = Some(pos);
        self
    }

    /// Format error with a snippet of the input showing where the problem is
    pub fn display_with_input(&self, input: &str) -> String {
        let mut msg = format!("{}: {}", self.kind, self.message);

        match self.position {
            Some(pos) if pos < input.len() => {
                let start = floor_char_boundary(input, pos.saturating_sub(15));
                let end = floor_char_boundary(input, (pos + 15).min(input.len()));
                let snippet = &input[start..end];

                msg.push_str(&format!("\n  near: '{}'", snippet.replace('\n', "↵")));
                msg.push('\n');

                let offset = input[start..pos.max(start)].chars().count();
                msg.push_str(&format!("  {}{}", " ".repeat(offset + 7), "^"));
            }
            Some(pos) => {
                msg.push_str(&format!("\n  at position {} (end of input)", pos));
            }
            None => {
                if let Some(context) = &self.context {
                    msg.push_str(&format!("\n  hint: {}", context));
                }
            }
        }

        msg
    }

    /// Simplified display without input context
    pub fn display_simple(&self) -> String {
        let mut msg = format!("{}: {}", self.kind, self.message);
        if let Some(context) = &self.context {
            msg.push_str(&format!("\n  hint: {}", context));
        }
        msg
    }
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_simple())
    }
}

impl std::error::Error for ArgError {}

pub type ArgResult<T> = Result<T, ArgError>;

fn floor_char_boundary(input: &str, mut idx: usize) -> usize {
    while idx > 0 && !input.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
