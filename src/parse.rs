//! Splitting expanded argument lines into argument vectors.
//!
//! Only the PowerShell dialect is tokenized here; Bash lines are handed to
//! the shell as a single expanded string.
use crate::diagnostics::TokenizeDiagnostics;

mod tokenizer;

pub use tokenizer::tokenize_powershell_arguments;

/// Arguments in left-to-right order, empty ones omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tokenized {
    pub args: Vec<String>,
    pub diagnostics: TokenizeDiagnostics,
}
