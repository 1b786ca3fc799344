//! Command-line tokenizer.
//!
//! The grammar is deliberately tiny: whitespace separates words, single
//! and double quotes group text including whitespace, and a quote closes
//! only at its matching character. No escape sequences, no operators, no
//! expansion.

use thiserror::Error;

/// Tokenization error type.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeError {
    /// A quote was opened and never closed.
    #[error("unterminated quote")]
    UnterminatedQuote,
}

/// Split a command line into words.
///
/// Quoted sections glue onto adjacent unquoted text, so `a"b c"` is the
/// single word `ab c`. An empty quoted pair still produces a word.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                in_word = true;
                let quote = c;
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == quote {
                        closed = true;
                        break;
                    }
                    current.push(next);
                }
                if !closed {
                    return Err(TokenizeError::UnterminatedQuote);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
#[path = "tokenizer.test.rs"]
mod tests;
