mod error;
pub(crate) mod grammar;
pub(crate) mod literal;
mod tokenizer;

pub use error::ParseError;
pub use tokenizer::Tokenizer;
