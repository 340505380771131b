//! Source positions and a cursor for hand-written tokenizers.

pub mod source;
pub mod tokenizer;
