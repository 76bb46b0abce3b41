//! Single-pass variable scanner shared by both dialects.
//!
//! The source line is never modified. A forward cursor marks everything
//! already resolved; resolved text (including substituted values) lives in
//! `out` and is never looked at again.
use crate::diagnostics::ExpandDiagnostics;
use crate::expansion::Environment;

/// Dialect parameters for the scanner.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Syntax {
    pub prefix: &'static str,
    pub prefix_ignores_case: bool,
    pub escape: char,
    pub quote: char,
    pub braces: bool,
    pub name_terminators: &'static [char],
}

pub(crate) const BASH: Syntax = Syntax {
    prefix: "$",
    prefix_ignores_case: false,
    escape: '\\',
    quote: '\'',
    braces: true,
    name_terminators: &[' ', '|', '"', '\'', ';'],
};

pub(crate) const POWERSHELL: Syntax = Syntax {
    prefix: "$env:",
    prefix_ignores_case: true,
    escape: '`',
    quote: '\'',
    braces: false,
    name_terminators: &[' ', '|', '"', '\'', ';', '$'],
};

#[derive(Copy, Clone, Eq, PartialEq)]
enum EscapeState {
    None,
    Single,
    Doubled,
}

pub(crate) fn scan(
    line: &str,
    syntax: &Syntax,
    env: &Environment<'_>,
) -> (String, ExpandDiagnostics) {
    let mut scanner = Scanner {
        src: line,
        syntax,
        cursor: 0,
        out: String::with_capacity(line.len()),
        diag: ExpandDiagnostics::default(),
    };
    scanner.run(env);
    let Scanner {
        src,
        cursor,
        mut out,
        diag,
        ..
    } = scanner;
    // Whatever was not resolved (the tail, or everything after a blocking
    // signal) is passed through untouched.
    out.push_str(&src[cursor..]);
    (out, diag)
}

struct Scanner<'s> {
    src: &'s str,
    syntax: &'s Syntax,
    cursor: usize,
    out: String,
    diag: ExpandDiagnostics,
}

impl Scanner<'_> {
    fn run(&mut self, env: &Environment<'_>) {
        // A prefix revisited after skipping a quoted block in front of it is
        // not counted or escape-checked twice.
        let mut revisit: Option<usize> = None;

        while let Some(prefix) = self.find_prefix() {
            if revisit != Some(prefix) {
                self.diag.found_prefixes += 1;
                match self.escape_before(prefix) {
                    EscapeState::Single => {
                        self.emit_escaped_prefix(prefix);
                        continue;
                    }
                    EscapeState::Doubled => self.diag.escaped_escape_symbols += 1,
                    EscapeState::None => {}
                }
            }

            if let Some(open) = self.src[self.cursor..prefix].find(self.syntax.quote) {
                let open = self.cursor + open;
                let Some(close) = self.src[open + 1..].find(self.syntax.quote) else {
                    self.diag.unmatched_quotes = true;
                    return;
                };
                let close = open + 1 + close;
                self.copy_to(close + 1);
                self.diag.quoted_blocks += 1;
                revisit = Some(prefix);
                continue;
            }
            revisit = None;

            if !self.resolve_reference(prefix, env) {
                return;
            }
        }
    }

    fn find_prefix(&self) -> Option<usize> {
        let needle = self.syntax.prefix.as_bytes();
        self.src.as_bytes()[self.cursor..]
            .windows(needle.len())
            .position(|window| {
                if self.syntax.prefix_ignores_case {
                    window.eq_ignore_ascii_case(needle)
                } else {
                    window == needle
                }
            })
            .map(|idx| self.cursor + idx)
    }

    /// Only unresolved text is inspected; an escape symbol that was already
    /// consumed as part of an earlier reference does not count.
    fn escape_before(&self, prefix: usize) -> EscapeState {
        let bytes = self.src.as_bytes();
        let escape = self.syntax.escape as u8;
        if prefix <= self.cursor || bytes[prefix - 1] != escape {
            return EscapeState::None;
        }
        if prefix - 1 > self.cursor && bytes[prefix - 2] == escape {
            EscapeState::Doubled
        } else {
            EscapeState::Single
        }
    }

    fn emit_escaped_prefix(&mut self, prefix: usize) {
        self.out.push_str(&self.src[self.cursor..prefix - 1]);
        let end = prefix + self.syntax.prefix.len();
        self.out.push_str(&self.src[prefix..end]);
        self.cursor = end;
        self.diag.escaped_variables += 1;
    }

    fn copy_to(&mut self, end: usize) {
        self.out.push_str(&self.src[self.cursor..end]);
        self.cursor = end;
    }

    /// Returns `false` when scanning has to stop.
    fn resolve_reference(&mut self, prefix: usize, env: &Environment<'_>) -> bool {
        let src = self.src;
        let name_start = prefix + self.syntax.prefix.len();
        let braced = self.syntax.braces && src[name_start..].starts_with('{');

        let (name, end) = if braced {
            self.diag.brace_syntax_entries += 1;
            let Some(close) = src[name_start + 1..].find('}') else {
                let brace_in_output = self.out.len() + (prefix - self.cursor) + 1;
                self.diag.unclosed_brace_position = Some(brace_in_output);
                return false;
            };
            let close = name_start + 1 + close;
            self.diag.braced_variables += 1;
            (&src[name_start + 1..close], close + 1)
        } else {
            let rest = &src[name_start..];
            let len = rest
                .find(|ch: char| self.syntax.name_terminators.contains(&ch))
                .unwrap_or(rest.len());
            (&rest[..len], name_start + len)
        };

        self.out.push_str(&src[self.cursor..prefix]);

        if let Some(unescaped) = name.strip_prefix(self.syntax.escape) {
            // `$\NAME` stays a reference, written back without the escape.
            self.out.push_str(self.syntax.prefix);
            if braced {
                self.out.push('{');
                self.out.push_str(unescaped);
                self.out.push('}');
            } else {
                self.out.push_str(unescaped);
            }
            self.cursor = end;
            self.diag.variables_starting_with_escape += 1;
            return true;
        }

        let (name, literal) = match name.split_once(self.syntax.escape) {
            Some((name, literal)) => {
                self.diag.variables_with_escape_inside += 1;
                (name, literal)
            }
            None => (name, ""),
        };
        self.out.push_str(literal);
        self.out.push_str(&env.get(name));
        self.cursor = end;
        self.diag.variables_expanded += 1;
        true
    }
}
