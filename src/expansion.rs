//! Variable expansion for Bash (`$NAME`, `${NAME}`) and PowerShell
//! (`$env:NAME`) argument lines.
//!
//! Expansion is a single forward pass: substituted values are never scanned
//! again, and single-quoted blocks are copied through untouched.
use std::collections::HashMap;
use std::env;

use log::{debug, warn};

use crate::diagnostics::{Diagnostics, ExpandDiagnostics};

mod scanner;

use scanner::{scan, Syntax, BASH, POWERSHELL};

type LookupVar<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

/// Read-only variable lookup handed to the expanders.
pub struct Environment<'a> {
    lookup_var: LookupVar<'a>,
}

impl<'a> Environment<'a> {
    pub fn new<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'a,
    {
        Self {
            lookup_var: Box::new(lookup),
        }
    }

    /// Variables of the current process.
    pub fn process() -> Self {
        Self::new(|name| {
            if name.is_empty() || name.contains(['=', '\0']) {
                return None;
            }
            env::var(name).ok()
        })
    }

    pub fn from_map(vars: &'a HashMap<String, String>) -> Self {
        Self::new(move |name| vars.get(name).cloned())
    }

    /// `overrides` win over `fallback`.
    pub fn layered(overrides: &'a HashMap<String, String>, fallback: Environment<'a>) -> Self {
        Self::new(move |name| {
            overrides
                .get(name)
                .cloned()
                .or_else(|| (fallback.lookup_var)(name))
        })
    }

    /// Absent variables resolve to the empty string.
    pub fn get(&self, name: &str) -> String {
        (self.lookup_var)(name).unwrap_or_default()
    }
}

/// An expanded line and what the expander saw on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Expansion {
    pub line: String,
    pub diagnostics: ExpandDiagnostics,
}

pub fn expand_bash_variables(line: &str, env: &Environment<'_>) -> Expansion {
    expand_with("bash", line, &BASH, env)
}

pub fn expand_powershell_variables(line: &str, env: &Environment<'_>) -> Expansion {
    expand_with("powershell", line, &POWERSHELL, env)
}

fn expand_with(dialect: &str, line: &str, syntax: &Syntax, env: &Environment<'_>) -> Expansion {
    let (line, diagnostics) = scan(line, syntax, env);
    debug!(
        "expand event=done dialect={} prefixes={} expanded={} quoted={}",
        dialect,
        diagnostics.found_prefixes,
        diagnostics.variables_expanded,
        diagnostics.quoted_blocks
    );
    if diagnostics.is_blocked() {
        warn!(
            "expand event=blocked dialect={} unmatched_quotes={} unclosed_brace={:?}",
            dialect, diagnostics.unmatched_quotes, diagnostics.unclosed_brace_position
        );
    }
    Expansion { line, diagnostics }
}
