use super::operator::Operator;
use crate::parsing::source::{Span, SourceOffset};
use crate::parsing::tokenizer::TokenizerState;

use regex::Regex;
use once_cell::sync::Lazy;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub data: TokenData,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenData {
  /// A numeric literal, kept as written.
  Number(String),
  Identifier(String),
  Operator(Operator),
  LeftParen,
  RightParen,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum TokenizerError {
  #[error("Unexpected character '{0}'")]
  UnexpectedChar(char, SourceOffset),
}

impl Token {
  pub fn new(data: TokenData, span: Span) -> Self {
    Self { data, span }
  }
}

impl TokenizerError {
  pub fn position(&self) -> SourceOffset {
    match self {
      TokenizerError::UnexpectedChar(_, pos) => *pos,
    }
  }
}

/// Reads tokens until the end of the input. On failure, the state is
/// left at the offending character.
pub fn read_tokens(state: &mut TokenizerState<'_>) -> Result<Vec<Token>, TokenizerError> {
  let mut tokens = Vec::new();
  loop {
    state.consume_spaces();
    match state.peek() {
      None => return Ok(tokens),
      Some(ch) => match read_one_token(state) {
        Some(token) => tokens.push(token),
        None => return Err(TokenizerError::UnexpectedChar(ch, state.current_pos())),
      },
    }
  }
}

fn read_one_token(state: &mut TokenizerState<'_>) -> Option<Token> {
  read_char_token(state)
    .or_else(|| read_number_literal(state))
    .or_else(|| read_identifier(state))
    .or_else(|| read_operator(state))
}

fn read_char_token(state: &mut TokenizerState<'_>) -> Option<Token> {
  #[allow(clippy::manual_map)] // Cleaner in an if-else chain
  if let Some(m) = state.read_literal("(") {
    Some(Token::new(TokenData::LeftParen, m.span()))
  } else if let Some(m) = state.read_literal(")") {
    Some(Token::new(TokenData::RightParen, m.span()))
  } else {
    None
  }
}

fn read_number_literal(state: &mut TokenizerState<'_>) -> Option<Token> {
  static RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap()
  });
  state.read_regex(&RE).map(|m| {
    Token::new(TokenData::Number(m.as_str().to_owned()), m.span())
  })
}

fn read_identifier(state: &mut TokenizerState<'_>) -> Option<Token> {
  static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").unwrap());
  state.read_regex(&RE).map(|m| {
    Token::new(TokenData::Identifier(m.as_str().to_owned()), m.span())
  })
}

fn read_operator(state: &mut TokenizerState<'_>) -> Option<Token> {
  Operator::ALL.into_iter().find_map(|op| {
    state.read_literal(op.symbol()).map(|m| Token::new(TokenData::Operator(op), m.span()))
  })
}
