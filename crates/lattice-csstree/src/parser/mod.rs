//! CSS parser producing a concrete syntax tree.
//!
//! Parsing is recursive descent over a [`TokenStream`]. Rules, declarations
//! and at-rule preludes are recoverable regions: when one of them fails to
//! parse, the tokens it covers are kept as a [`Raw`](crate::ast::Raw) node,
//! the error is reported to [`ParseHooks::on_parse_error`] and parsing goes
//! on with the next sibling.
//!
//! # Example
//!
//! ```
//! use lattice_csstree::parser::{parse, Context, ParseOptions};
//!
//! let ast = parse("red 1px", &ParseOptions::new().context(Context::Value)).unwrap();
//! assert_eq!(ast.kind(), "Value");
//! ```

mod atrule;
mod media;
mod selector;
mod sequence;
mod state;
mod stylesheet;
mod value;

use crate::ast::Node;
use crate::error::ParseError;
use crate::logging::{targets, PerfSpan};
use crate::tokenizer::{Loc, TokenStream, TokenType};

pub use state::Parser;

/// Entry production for [`parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Context {
    #[default]
    StyleSheet,
    Atrule,
    AtrulePrelude,
    MediaQueryList,
    MediaQuery,
    Rule,
    SelectorList,
    Selector,
    Block,
    DeclarationList,
    Declaration,
    Value,
}

impl Context {
    pub fn name(self) -> &'static str {
        match self {
            Context::StyleSheet => "stylesheet",
            Context::Atrule => "atrule",
            Context::AtrulePrelude => "atrulePrelude",
            Context::MediaQueryList => "mediaQueryList",
            Context::MediaQuery => "mediaQuery",
            Context::Rule => "rule",
            Context::SelectorList => "selectorList",
            Context::Selector => "selector",
            Context::Block => "block",
            Context::DeclarationList => "declarationList",
            Context::Declaration => "declaration",
            Context::Value => "value",
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub context: Context,
    /// Attach a `loc` to every node.
    pub positions: bool,
    /// Offset, line and column of the first character, for fragments
    /// embedded in a larger document.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    /// Name stored in `loc.source`.
    pub filename: String,
    pub parse_atrule_prelude: bool,
    pub parse_rule_prelude: bool,
    pub parse_value: bool,
    pub parse_custom_property: bool,
    /// At-rule name for the `AtrulePrelude` context.
    pub atrule: Option<String>,
    /// Property name for the `Value` context.
    pub property: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            context: Context::default(),
            positions: false,
            offset: 0,
            line: 1,
            column: 1,
            filename: "<unknown>".to_string(),
            parse_atrule_prelude: true,
            parse_rule_prelude: true,
            parse_value: true,
            parse_custom_property: false,
            atrule: None,
            property: None,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn positions(mut self, positions: bool) -> Self {
        self.positions = positions;
        self
    }

    /// Set the position of the first character.
    pub fn start(mut self, offset: usize, line: usize, column: usize) -> Self {
        self.offset = offset;
        self.line = line;
        self.column = column;
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn parse_atrule_prelude(mut self, value: bool) -> Self {
        self.parse_atrule_prelude = value;
        self
    }

    pub fn parse_rule_prelude(mut self, value: bool) -> Self {
        self.parse_rule_prelude = value;
        self
    }

    pub fn parse_value(mut self, value: bool) -> Self {
        self.parse_value = value;
        self
    }

    pub fn parse_custom_property(mut self, value: bool) -> Self {
        self.parse_custom_property = value;
        self
    }

    pub fn atrule(mut self, name: impl Into<String>) -> Self {
        self.atrule = Some(name.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.property = Some(name.into());
        self
    }
}

type ParseErrorCallback<'h> = Box<dyn FnMut(&ParseError, &Node) -> Result<(), ParseError> + 'h>;
type CommentCallback<'h> = Box<dyn FnMut(&str, Option<&Loc>) + 'h>;
type TokenCallback<'h> = Box<dyn FnMut(TokenType, usize, usize, usize) + 'h>;

/// Callbacks invoked while parsing.
#[derive(Default)]
pub struct ParseHooks<'h> {
    pub(crate) on_parse_error: Option<ParseErrorCallback<'h>>,
    pub(crate) on_comment: Option<CommentCallback<'h>>,
    pub(crate) on_token: Option<TokenCallback<'h>>,
}

impl<'h> ParseHooks<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive each recovered error with the Raw node that replaced the
    /// failed region. Returning `Err` aborts the parse with that error.
    pub fn on_parse_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ParseError, &Node) -> Result<(), ParseError> + 'h,
    {
        self.on_parse_error = Some(Box::new(callback));
        self
    }

    /// Abort on the first error instead of recovering.
    pub fn strict(self) -> Self {
        self.on_parse_error(|error, _| Err(error.clone()))
    }

    /// Receive the body and location of every comment in the source.
    pub fn on_comment<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str, Option<&Loc>) + 'h,
    {
        self.on_comment = Some(Box::new(callback));
        self
    }

    /// Receive every token as `(type, start, end, index)` before parsing.
    pub fn on_token<F>(mut self, callback: F) -> Self
    where
        F: FnMut(TokenType, usize, usize, usize) + 'h,
    {
        self.on_token = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for ParseHooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseHooks")
            .field("on_parse_error", &self.on_parse_error.is_some())
            .field("on_comment", &self.on_comment.is_some())
            .field("on_token", &self.on_token.is_some())
            .finish()
    }
}

/// Parse `source` with default hooks: recoverable errors are logged and
/// replaced by Raw nodes.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    parse_with_hooks(source, options, &mut ParseHooks::default())
}

/// Parse `source`, reporting errors, comments and tokens to `hooks`.
pub fn parse_with_hooks(
    source: &str,
    options: &ParseOptions,
    hooks: &mut ParseHooks<'_>,
) -> Result<Node, ParseError> {
    let _perf = PerfSpan::new("parse");

    tracing::debug!(
        target: targets::PARSER,
        context = options.context.name(),
        length = source.len(),
        "parsing"
    );

    let stream = TokenStream::new(source);

    if let Some(on_token) = hooks.on_token.as_mut() {
        stream.for_each_token(|ty, start, end, index| on_token(ty, start, end, index));
    }

    if let Some(on_comment) = hooks.on_comment.as_mut() {
        emit_comments(&stream, options, on_comment);
    }

    let mut parser = Parser::new(stream, options, hooks);
    let ast = match options.context {
        Context::StyleSheet => parser.style_sheet()?,
        Context::Atrule => parser.atrule()?,
        Context::AtrulePrelude => {
            let name = options.atrule.clone().unwrap_or_default();
            parser.atrule_prelude(&name)?
        }
        Context::MediaQueryList => parser.media_query_list()?,
        Context::MediaQuery => parser.media_query()?,
        Context::Rule => parser.rule()?,
        Context::SelectorList => parser.selector_list()?,
        Context::Selector => parser.selector()?,
        Context::Block => parser.block(false)?,
        Context::DeclarationList => parser.declaration_list()?,
        Context::Declaration => parser.declaration()?,
        Context::Value => match options.property.as_deref() {
            Some(property) if property.starts_with("--") && !options.parse_custom_property => {
                let start = parser.stream.token_index;
                parser.raw(start, sequence::RawMode::Default, false)
            }
            _ => parser.value()?,
        },
    };

    if !parser.stream.eof {
        return Err(parser.error("Unexpected input", None));
    }

    Ok(ast)
}

fn emit_comments(stream: &TokenStream<'_>, options: &ParseOptions, on_comment: &mut CommentCallback<'_>) {
    let locations = crate::tokenizer::OffsetToLocation::with_bias(
        stream.source(),
        options.offset,
        options.line,
        options.column,
    );

    stream.for_each_token(|ty, start, end, _| {
        if ty != TokenType::Comment {
            return;
        }

        let text = stream.substring(start, end);
        let body_end = if text.len() >= 4 && text.ends_with("*/") { end - 2 } else { end };
        let loc = options
            .positions
            .then(|| locations.location_range(start, end, &options.filename));
        on_comment(stream.substring(start + 2, body_end), loc.as_ref());
    });
}
