//! PowerShell argument tokenizer.
//!
//! Runs `$env:` expansion first, then splits the expanded text on unquoted
//! whitespace. Normal/Single/Double modes track the active quote; a second
//! quote type seen inside an active quote is kept literally and remembered
//! as the passive quote so unbalanced mixes can be reported.
use log::{debug, warn};

use crate::diagnostics::{Diagnostics, TokenizeDiagnostics};
use crate::expansion::{expand_powershell_variables, Environment};
use crate::parse::Tokenized;

const ESCAPE: char = '`';
const SPECIAL_CHARACTERS: [&str; 4] = ["$", ";", "@", "&"];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ParseMode {
    Normal,
    Single,
    Double,
}

impl ParseMode {
    fn opened_by(quote: char) -> Self {
        if quote == '\'' {
            ParseMode::Single
        } else {
            ParseMode::Double
        }
    }

    fn closed_by(self, quote: char) -> bool {
        matches!(
            (self, quote),
            (ParseMode::Single, '\'') | (ParseMode::Double, '"')
        )
    }
}

pub fn tokenize_powershell_arguments(line: &str, env: &Environment<'_>) -> Tokenized {
    let expansion = expand_powershell_variables(line, env);
    let mut diag = TokenizeDiagnostics {
        expansion: expansion.diagnostics,
        ..Default::default()
    };

    let mut args = Vec::new();
    let mut buf = String::new();
    let mut mode = ParseMode::Normal;
    let mut passive_quote: Option<char> = None;
    let mut escaped = false;

    for ch in expansion.line.chars() {
        match ch {
            ' ' | '\t' => {
                if mode != ParseMode::Normal {
                    buf.push(ch);
                    continue;
                }
                flush(&mut args, &mut buf);
                // A pending escape does not protect unquoted whitespace.
                if escaped {
                    diag.trailing_escapes += 1;
                }
            }
            ESCAPE => {
                diag.backticks += 1;
                if escaped {
                    buf.push(ch);
                    escaped = false;
                    diag.escaped_backticks += 1;
                } else if mode == ParseMode::Single {
                    buf.push(ch);
                    diag.backticks_in_single_quotes += 1;
                } else {
                    escaped = true;
                }
            }
            '\'' | '"' => {
                if escaped {
                    buf.push(ch);
                    escaped = false;
                    diag.escaped_quotes += 1;
                } else if mode.closed_by(ch) {
                    mode = ParseMode::Normal;
                    diag.closed_quote_pairs += 1;
                    if passive_quote.take().is_some() {
                        diag.unbalanced_quotes += 1;
                    }
                } else if mode != ParseMode::Normal {
                    buf.push(ch);
                    diag.nested_quotes += 1;
                    passive_quote = match passive_quote {
                        Some(_) => None,
                        None => Some(ch),
                    };
                } else {
                    mode = ParseMode::opened_by(ch);
                }
            }
            _ => {
                buf.push(ch);
                escaped = false;
                // Only a buffer that is exactly one special character counts.
                if SPECIAL_CHARACTERS.contains(&buf.as_str()) {
                    diag.special_characters += 1;
                }
            }
        }
    }

    flush(&mut args, &mut buf);
    if escaped {
        diag.trailing_escapes += 1;
    }
    if mode != ParseMode::Normal {
        diag.unmatched_quotes = true;
        // The inner quote never got a chance to be closed either.
        if passive_quote.is_some() {
            diag.unbalanced_quotes += 1;
        }
    }

    debug!(
        "tokenize event=done args={} quotes={} backticks={} unbalanced={}",
        args.len(),
        diag.closed_quote_pairs,
        diag.backticks,
        diag.unbalanced_quotes
    );
    if diag.is_blocked() {
        warn!(
            "tokenize event=blocked unmatched_quotes={} env_unmatched_quotes={}",
            diag.unmatched_quotes, diag.expansion.unmatched_quotes
        );
    }

    Tokenized {
        args,
        diagnostics: diag,
    }
}

fn flush(args: &mut Vec<String>, buf: &mut String) {
    if !buf.is_empty() {
        args.push(std::mem::take(buf));
    }
}
