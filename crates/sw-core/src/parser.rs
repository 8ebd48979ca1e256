//! Source parser: splits a migration script into its leading comment block
//! and the SQL body.
//!
//! The comment block is every contiguous comment line starting at the first
//! non-blank line. A bare marker line (`--`) stays in the block as a blank
//! description line; a truly blank line ends the block. `hints:` lines inside
//! the block feed [`Hints`] and are left out of the description.

use crate::migration::Hints;

/// Line-comment marker shared by the supported SQL dialects.
pub const DEFAULT_COMMENT_MARKER: &str = "--";

const HINTS_PREFIX: &str = "hints:";

/// Result of parsing one migration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    /// Comment text with markers stripped, hint lines removed
    pub description: String,
    /// Tokens from every `hints:` line of the block
    pub hints: Hints,
    /// Remainder of the script, trimmed
    pub sql: String,
}

/// Parse a migration script using `comment_marker` as the line-comment prefix.
pub fn parse_source(text: &str, comment_marker: &str) -> ParsedSource {
    let mut block: Vec<&str> = Vec::new();
    let mut body_start = 0;

    for raw in text.split_inclusive('\n') {
        let line = raw.trim();
        if block.is_empty() && line.is_empty() {
            body_start += raw.len();
            continue;
        }
        match line.strip_prefix(comment_marker) {
            Some(rest) => {
                block.push(rest.trim());
                body_start += raw.len();
            }
            None => break,
        }
    }

    let mut hints = Hints::new();
    let mut description_lines = Vec::with_capacity(block.len());
    for line in block {
        match hint_tokens(line) {
            Some(tokens) => {
                for token in tokens.split([',', ';']) {
                    hints.insert(token);
                }
            }
            None => description_lines.push(line),
        }
    }

    ParsedSource {
        description: description_lines.join("\n").trim().to_string(),
        hints,
        sql: text[body_start..].trim().to_string(),
    }
}

/// Return the token list of a `hints:` line (case-insensitive prefix).
fn hint_tokens(line: &str) -> Option<&str> {
    let prefix = line.get(..HINTS_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(HINTS_PREFIX) {
        Some(&line[HINTS_PREFIX.len()..])
    } else {
        None
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
