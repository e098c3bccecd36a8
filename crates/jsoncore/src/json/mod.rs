//! JSON text format.

mod bootstrap;
mod escape;
mod generator;
mod literal;
mod options;
mod parser;

pub use bootstrap::{CharsReader, JsonEncoding, JsonReader, Prefixed, WideReader, sniff};
pub use generator::JsonGenerator;
pub use options::{GeneratorOptions, ParserOptions};
pub use parser::JsonParser;
