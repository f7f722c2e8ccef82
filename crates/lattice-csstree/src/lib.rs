//! CSS toolkit for Horizon Lattice: tokenizer, concrete syntax tree, text
//! generation and value grammar matching.
//!
//! This crate provides the pieces needed to read, rewrite and validate CSS:
//!
//! - **Tokenizer**: CSS Syntax Level 3 tokens with bracket balance and
//!   offset to line/column mapping
//! - **Parser**: a recoverable recursive-descent parser producing a
//!   concrete syntax tree, with any production usable as the entry point
//! - **Generator**: CST back to text, optionally with source map mappings
//! - **Definition syntax**: parse and print value grammars such as
//!   `[ <length> | auto ]{1,4}`
//! - **Lexer**: match values against property, type and at-rule grammars
//!   with located mismatch diagnostics
//!
//! # Example
//!
//! ```ignore
//! use lattice_csstree::prelude::*;
//!
//! let ast = parse(".a { color: red }", &ParseOptions::new())?;
//! assert_eq!(generate(&ast), ".a{color:red}");
//!
//! let value = parse("1px solid red", &ParseOptions::new().context(Context::Value))?;
//! assert!(Lexer::default_lexer().match_property("border", &value).is_match());
//! ```

pub mod ast;
pub mod definition_syntax;
pub mod escape;
pub mod generator;
pub mod lexer;
pub mod list;
pub mod logging;
pub mod parser;
pub mod tokenizer;

mod error;

pub use error::{
    Error, MatchError, MatchErrorKind, ParseError, Result, StructureError, SyntaxParseError, SyntaxReferenceError,
};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::ast::{check_structure, from_plain_object, to_plain_object, Node};
    pub use crate::definition_syntax::{GenerateSyntaxOptions, SyntaxNode};
    pub use crate::generator::{generate, generate_with, GenerateMode, GenerateOptions, Generated};
    pub use crate::lexer::{Lexer, LexerConfig, MatchResult};
    pub use crate::list::List;
    pub use crate::parser::{parse, parse_with_hooks, Context, ParseHooks, ParseOptions};
    pub use crate::tokenizer::{tokenize, Loc, Position, TokenStream, TokenType};
    pub use crate::{Error, Result};
}
