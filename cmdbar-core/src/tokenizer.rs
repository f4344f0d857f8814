//! Command-line tokenizer.
//!
//! Splits a raw command line into tokens on runs of whitespace. A region
//! delimited by the quote character is kept as part of a single token, with
//! the quotes themselves stripped. An unterminated quote runs to the end of
//! the input; tokenizing never fails.

use serde::{Deserialize, Serialize};

/// Quote character used when none is configured.
pub const DEFAULT_QUOTE: char = '"';

/// Splits command lines into tokens using a configurable quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    quote: char,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE)
    }
}

impl Tokenizer {
    pub fn new(quote: char) -> Self {
        Self { quote }
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    /// Split `raw` into tokens.
    ///
    /// `""` produces an empty token; `a"b c"d` produces the single token `ab cd`.
    pub fn tokenize(&self, raw: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_quote = false;
        // Set once a quote has been seen, so that `""` still yields a token.
        let mut quoted = false;

        for ch in raw.chars() {
            if ch == self.quote {
                in_quote = !in_quote;
                quoted = true;
                continue;
            }
            if ch.is_whitespace() && !in_quote {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
                continue;
            }
            current.push(ch);
        }

        if !current.is_empty() || quoted {
            tokens.push(current);
        }
        tokens
    }

    /// The first token of `raw`, or `""` when the line is blank.
    pub fn command_name(&self, raw: &str) -> String {
        self.tokenize(raw).into_iter().next().unwrap_or_default()
    }
}

/// Tokenize with the default quote character.
pub fn tokenize(raw: &str) -> Vec<String> {
    Tokenizer::default().tokenize(raw)
}
