//! Makefile-fragment depfile parsing.
//!
//! Accepts what GCC and Clang write with `-MD`/`-MMD` (optionally with `-MP`
//! and `-MT`):
//!
//! ```text
//! obj/main.o: src/main.c include/a.h \
//!   include/path\ with\ space.h
//! include/a.h:
//! ```
//!
//! A colon separates targets from dependencies only when it is not part of
//! a drive letter (`C:\x`, `C:/x`).

use crate::errors::DependencyParseError;

/// One `targets: dependencies` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepfileRule {
    /// Paths before the colon
    pub targets: Vec<String>,
    /// Paths after the colon, in file order
    pub deps: Vec<String>,
}

#[derive(Default)]
struct RuleBuilder {
    targets: Vec<String>,
    deps: Vec<String>,
    word: String,
    seen_colon: bool,
    line: usize,
}

impl RuleBuilder {
    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        if self.seen_colon {
            self.deps.push(word);
        } else {
            self.targets.push(word);
        }
    }

    fn is_blank(&self) -> bool {
        self.word.is_empty() && self.targets.is_empty() && !self.seen_colon
    }

    /// Finish the logical line; blank lines produce nothing.
    fn finish(&mut self, rules: &mut Vec<DepfileRule>) -> Result<(), DependencyParseError> {
        self.flush_word();
        let line = self.line;

        if !self.seen_colon {
            if self.targets.is_empty() {
                return Ok(());
            }
            return Err(DependencyParseError::MissingColon { line });
        }
        if self.targets.is_empty() {
            return Err(DependencyParseError::MissingTarget { line });
        }

        rules.push(DepfileRule {
            targets: std::mem::take(&mut self.targets),
            deps: std::mem::take(&mut self.deps),
        });
        self.seen_colon = false;
        Ok(())
    }
}

/// Parse a depfile into its rules.
pub fn parse_depfile(content: &str) -> Result<Vec<DepfileRule>, DependencyParseError> {
    if content.trim().is_empty() {
        return Err(DependencyParseError::Empty);
    }

    let mut rules = Vec::new();
    let mut rule = RuleBuilder {
        line: 1,
        ..RuleBuilder::default()
    };
    let mut line = 1;
    // Line of a continuation still waiting for its next line
    let mut continued_at: Option<usize> = None;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if !matches!(c, ' ' | '\t' | '\r' | '\\') {
            continued_at = None;
        }
        match c {
            '\\' => match chars.peek() {
                Some('\n') => {
                    chars.next();
                    continued_at = Some(line);
                    line += 1;
                    rule.flush_word();
                }
                Some('\r') => {
                    chars.next();
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    continued_at = Some(line);
                    line += 1;
                    rule.flush_word();
                }
                Some(' ') | Some('#') => {
                    continued_at = None;
                    rule.word.extend(chars.next());
                }
                None => return Err(DependencyParseError::UnterminatedContinuation { line }),
                // Backslashes inside Windows paths are literal
                Some(_) => {
                    continued_at = None;
                    rule.word.push('\\');
                }
            },
            '$' => {
                if chars.peek() == Some(&'$') {
                    chars.next();
                }
                rule.word.push('$');
            }
            '#' if rule.word.is_empty() => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
            }
            ':' if !rule.seen_colon && !is_drive_colon(&rule.word, chars.peek()) => {
                rule.flush_word();
                rule.seen_colon = true;
            }
            ' ' | '\t' | '\r' => rule.flush_word(),
            '\n' => {
                rule.finish(&mut rules)?;
                line += 1;
                rule.line = line;
            }
            other => {
                if rule.is_blank() {
                    rule.line = line;
                }
                rule.word.push(other);
            }
        }
    }

    // GCC never ends a depfile on a continuation; a file cut short does.
    if let Some(line) = continued_at {
        return Err(DependencyParseError::UnterminatedContinuation { line });
    }
    rule.finish(&mut rules)?;
    Ok(rules)
}

/// `C:` followed by a separator is a drive letter, not a rule colon.
fn is_drive_colon(word: &str, next: Option<&char>) -> bool {
    let mut chars = word.chars();
    let single_letter = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic());
    single_letter && matches!(next, Some('\\') | Some('/'))
}
