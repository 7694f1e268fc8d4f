//! Lexical tagger for console input
//!
//! Labels each token of a typed command for the console's analysis table.
//! The first token is a reserved word when it is one of the aliases; every
//! following token is an identifier. When the command produced an error,
//! the error message replaces the token list.

use serde::{Deserialize, Serialize};

use crate::aliases::AliasTable;

/// Category assigned to a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    ReservedWord,
    NonReservedWord,
    Identifier,
    Error,
}

/// One tagged token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token: String,
    pub category: TokenCategory,
    pub is_error: bool,
}

impl Token {
    fn new(token: impl Into<String>, category: TokenCategory) -> Self {
        Self {
            token: token.into(),
            category,
            is_error: category == TokenCategory::Error,
        }
    }
}

/// Tag `input` against the alias vocabulary
///
/// Splits on single spaces after trimming, so repeated spaces yield empty
/// identifier tokens, the same way the console splits its input.
pub fn classify(input: &str, prior_is_error: bool, message: &str, aliases: &AliasTable) -> Vec<Token> {
    if prior_is_error {
        return vec![Token::new(message, TokenCategory::Error)];
    }

    let mut tokens = input.trim().split(' ');
    let command = tokens.next().unwrap_or_default();

    let head = if aliases.is_reserved(command) {
        TokenCategory::ReservedWord
    } else {
        TokenCategory::NonReservedWord
    };

    std::iter::once(Token::new(command, head))
        .chain(tokens.map(|arg| Token::new(arg, TokenCategory::Identifier)))
        .collect()
}
