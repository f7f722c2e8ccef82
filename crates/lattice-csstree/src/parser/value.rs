//! Component value productions.

use crate::ast::{
    Brackets, Dimension, Function, Hash, Identifier, Node, Number, Operator, Parentheses,
    Percentage, QuotedString, UnicodeRange, Url, Value,
};
use crate::escape::{decode_string, decode_url};
use crate::list::List;
use crate::tokenizer::char_code::is_hex_digit;
use crate::tokenizer::{utils, TokenType};

use super::sequence::{RawMode, Scope};
use super::state::{PResult, Parser};

const PLUS_SIGN: u32 = 0x002B;
const HYPHEN_MINUS: u32 = 0x002D;
const QUESTION_MARK: u32 = 0x003F;

impl<'s> Parser<'s, '_, '_> {
    pub fn value(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let children = self.read_sequence(Scope::Value)?;

        Ok(Node::Value(Value {
            loc: self.location(start, self.stream.token_start),
            children,
        }))
    }

    pub fn identifier(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let name = self.consume(TokenType::Ident)?;

        Ok(Node::Identifier(Identifier {
            loc: self.location(start, self.stream.token_start),
            name: name.to_string(),
        }))
    }

    /// A single token kept as its source text (`,`, `/`, `+` and friends).
    pub fn operator(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        self.stream.next();

        Ok(Node::Operator(Operator {
            loc: self.location(start, self.stream.token_start),
            value: self.stream.substr_to_cursor(start).to_string(),
        }))
    }

    fn consume_number(&mut self, ty: TokenType) -> PResult<&'s str> {
        let start = self.stream.token_start;
        let end = utils::consume_number(self.stream.source().as_bytes(), start);
        let number = self.stream.substring(start, end);
        self.eat(ty)?;
        Ok(number)
    }

    pub fn number(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let value = self.consume(TokenType::Number)?;

        Ok(Node::Number(Number {
            loc: self.location(start, self.stream.token_start),
            value: value.to_string(),
        }))
    }

    pub fn percentage(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let value = self.consume_number(TokenType::Percentage)?;

        Ok(Node::Percentage(Percentage {
            loc: self.location(start, self.stream.token_start),
            value: value.to_string(),
        }))
    }

    pub fn dimension(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let value = self.consume_number(TokenType::Dimension)?;
        let unit = self.stream.substring(start + value.len(), self.stream.token_start);

        Ok(Node::Dimension(Dimension {
            loc: self.location(start, self.stream.token_start),
            value: value.to_string(),
            unit: unit.to_string(),
        }))
    }

    pub fn hash(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        self.eat(TokenType::Hash)?;

        Ok(Node::Hash(Hash {
            loc: self.location(start, self.stream.token_start),
            value: self.stream.substr_to_cursor(start + 1).to_string(),
        }))
    }

    pub fn string(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let raw = self.consume(TokenType::String)?;

        Ok(Node::String(QuotedString {
            loc: self.location(start, self.stream.token_start),
            value: decode_string(raw),
        }))
    }

    /// `url(...)` as an unquoted url token or as a function wrapping a string.
    pub fn url(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;

        let value = match self.stream.token_type {
            TokenType::Url => decode_url(self.consume(TokenType::Url)?),
            TokenType::Function => {
                if !self
                    .stream
                    .cmp_str(self.stream.token_start, self.stream.token_end, "url(")
                {
                    return Err(self.error("Function name must be `url`", None));
                }

                self.eat(TokenType::Function)?;
                self.stream.skip_sc();
                let value = decode_string(self.consume(TokenType::String)?);
                self.stream.skip_sc();
                if !self.stream.eof {
                    self.eat(TokenType::RightParenthesis)?;
                }
                value
            }
            _ => return Err(self.error("Url or Function is expected", None)),
        };

        Ok(Node::Url(Url {
            loc: self.location(start, self.stream.token_start),
            value,
        }))
    }

    pub fn parentheses(&mut self, scope: Scope) -> PResult<Node> {
        self.parentheses_with(|parser| parser.read_sequence(scope))
    }

    pub(crate) fn parentheses_with<F>(&mut self, read_children: F) -> PResult<Node>
    where
        F: FnOnce(&mut Self) -> PResult<List<Node>>,
    {
        let start = self.stream.token_start;
        self.eat(TokenType::LeftParenthesis)?;
        let children = read_children(self)?;
        if !self.stream.eof {
            self.eat(TokenType::RightParenthesis)?;
        }

        Ok(Node::Parentheses(Parentheses {
            loc: self.location(start, self.stream.token_start),
            children,
        }))
    }

    pub fn brackets(&mut self, scope: Scope) -> PResult<Node> {
        let start = self.stream.token_start;
        self.eat(TokenType::LeftSquareBracket)?;
        let children = self.read_sequence(scope)?;
        if !self.stream.eof {
            self.eat(TokenType::RightSquareBracket)?;
        }

        Ok(Node::Brackets(Brackets {
            loc: self.location(start, self.stream.token_start),
            children,
        }))
    }

    /// A function call. In values `var()`, `element()` and `expression()`
    /// get dedicated argument parsing.
    pub fn function(&mut self, scope: Scope) -> PResult<Node> {
        self.function_with(|parser, name| {
            if scope == Scope::Value {
                match name.to_ascii_lowercase().as_str() {
                    "var" => return parser.var_arguments(),
                    "element" | "-moz-element" => return parser.element_arguments(),
                    "expression" => {
                        let start = parser.stream.token_index;
                        return Ok(List::from_vec(vec![parser.raw(start, RawMode::Default, false)]));
                    }
                    _ => {}
                }
            }

            parser.read_sequence(scope)
        })
    }

    pub(crate) fn function_with<F>(&mut self, read_arguments: F) -> PResult<Node>
    where
        F: FnOnce(&mut Self, &str) -> PResult<List<Node>>,
    {
        let start = self.stream.token_start;
        let name = self.consume_function_name()?;
        let children = read_arguments(self, name)?;
        if !self.stream.eof {
            self.eat(TokenType::RightParenthesis)?;
        }

        Ok(Node::Function(Function {
            loc: self.location(start, self.stream.token_start),
            name: name.to_string(),
            children,
        }))
    }

    // var( <ident> [, <fallback>]? )
    fn var_arguments(&mut self) -> PResult<List<Node>> {
        let mut children = List::new();

        self.stream.skip_sc();
        children.push(self.identifier()?);
        self.stream.skip_sc();

        if self.stream.token_type == TokenType::Comma {
            children.push(self.operator()?);

            let start = self.stream.token_index;
            let mut fallback = if self.options.parse_custom_property {
                self.value()?
            } else {
                self.raw(start, RawMode::ExclamationMarkOrSemicolon, false)
            };
            self.keep_single_space(&mut fallback, start);
            children.push(fallback);
        }

        Ok(children)
    }

    fn element_arguments(&mut self) -> PResult<List<Node>> {
        self.stream.skip_sc();
        let id = self.id_selector()?;
        self.stream.skip_sc();

        Ok(List::from_vec(vec![id]))
    }

    /// An empty custom property value that was whitespace in the source
    /// keeps one WhiteSpace child.
    pub(crate) fn keep_single_space(&self, value: &mut Node, start_token: usize) {
        let Node::Value(value) = value else {
            return;
        };

        if !value.children.is_empty() {
            return;
        }

        let current = self.stream.token_index as isize;
        let had_space = (start_token as isize..=current)
            .any(|index| self.stream.lookup_type(index - current) == TokenType::WhiteSpace);

        if had_space {
            value.children.push(Node::white_space());
        }
    }

    /// `u+` followed by hex digits, an optional `-` range end and `?` wildcards.
    pub fn unicode_range(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;

        if self.stream.token_type != TokenType::Ident || !self.stream.cmp_char(start, 'u' as u32) {
            return Err(self.error("U is expected", None));
        }
        if self.stream.get_token_length() != 1 {
            return Err(self.error("Unexpected input", Some(start + 1)));
        }
        self.stream.next();

        match self.stream.token_type {
            // u <number-token> '?'*
            // u <number-token> <dimension-token>
            // u <number-token> <number-token>
            TokenType::Number => {
                self.starts_with(PLUS_SIGN)?;
                let hex_length = self.eat_hex_sequence(1, true)?;

                if self.stream.is_delim(QUESTION_MARK, 0) {
                    self.eat_question_mark_sequence(6 - hex_length)?;
                } else if matches!(self.stream.token_type, TokenType::Dimension | TokenType::Number) {
                    self.starts_with(HYPHEN_MINUS)?;
                    self.eat_hex_sequence(1, false)?;
                }
            }
            // u <dimension-token> '?'*
            TokenType::Dimension => {
                self.starts_with(PLUS_SIGN)?;
                let hex_length = self.eat_hex_sequence(1, true)?;
                if hex_length > 0 {
                    self.eat_question_mark_sequence(6 - hex_length)?;
                }
            }
            // u '+' <ident-token> '?'*
            // u '+' '?'+
            _ => {
                self.eat_delim(PLUS_SIGN)?;

                if self.stream.token_type == TokenType::Ident {
                    let hex_length = self.eat_hex_sequence(0, true)?;
                    if hex_length > 0 {
                        self.eat_question_mark_sequence(6 - hex_length)?;
                    }
                } else if self.stream.is_delim(QUESTION_MARK, 0) {
                    self.stream.next();
                    self.eat_question_mark_sequence(5)?;
                } else {
                    return Err(self.error("Hex digit or question mark is expected", None));
                }
            }
        }

        Ok(Node::UnicodeRange(UnicodeRange {
            loc: self.location(start, self.stream.token_start),
            value: self.stream.substr_to_cursor(start).to_string(),
        }))
    }

    fn starts_with(&self, code: u32) -> PResult<()> {
        if self.stream.char_code_at(self.stream.token_start) != code {
            let what = if code == PLUS_SIGN { "Plus sign" } else { "Hyphen minus" };
            return Err(self.error(&format!("{what} is expected"), None));
        }

        Ok(())
    }

    /// Check the current token holds up to six hex digits from `offset` on,
    /// optionally followed by `-` and a second sequence. Returns the digit
    /// count, or 0 when a range end was consumed.
    fn eat_hex_sequence(&mut self, offset: usize, allow_dash: bool) -> PResult<usize> {
        let start = self.stream.token_start + offset;
        let mut length = 0usize;

        for pos in start..self.stream.token_end {
            let code = self.stream.char_code_at(pos);

            if code == HYPHEN_MINUS && allow_dash && length != 0 {
                self.check_hex_run(pos + 1, self.stream.token_end)?;
                self.stream.next();
                return Ok(0);
            }

            if !is_hex_digit(code) {
                let message = if allow_dash && length != 0 {
                    if length < 6 {
                        "Hyphen minus or hex digit is expected"
                    } else {
                        "Hyphen minus is expected"
                    }
                } else if length < 6 {
                    "Hex digit is expected"
                } else {
                    "Unexpected input"
                };
                return Err(self.error(message, Some(pos)));
            }

            length += 1;
            if length > 6 {
                return Err(self.error("Too many hex digits", Some(pos)));
            }
        }

        self.stream.next();
        Ok(length)
    }

    fn check_hex_run(&self, start: usize, end: usize) -> PResult<()> {
        let mut length = 0usize;

        for pos in start..end {
            let code = self.stream.char_code_at(pos);
            if !is_hex_digit(code) {
                let message = if length < 6 { "Hex digit is expected" } else { "Unexpected input" };
                return Err(self.error(message, Some(pos)));
            }

            length += 1;
            if length > 6 {
                return Err(self.error("Too many hex digits", Some(pos)));
            }
        }

        Ok(())
    }

    fn eat_question_mark_sequence(&mut self, max: usize) -> PResult<()> {
        let mut count = 0usize;

        while self.stream.is_delim(QUESTION_MARK, 0) {
            count += 1;
            if count > max {
                return Err(self.error("Too many question marks", None));
            }
            self.stream.next();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Node;
    use crate::parser::{parse, parse_with_hooks, Context, ParseHooks, ParseOptions};

    fn value(source: &str) -> Node {
        parse(source, &ParseOptions::new().context(Context::Value)).unwrap()
    }

    fn children(node: &Node) -> Vec<&Node> {
        node.children().map(|list| list.iter().collect()).unwrap_or_default()
    }

    fn strict_value(source: &str) -> Result<Node, crate::error::ParseError> {
        let mut hooks = ParseHooks::new().strict();
        parse_with_hooks(source, &ParseOptions::new().context(Context::Value), &mut hooks)
    }

    #[test]
    fn numeric_values_split_number_and_unit() {
        let node = value("10px 50% -1.5e3");
        let items = children(&node);

        match items[0] {
            Node::Dimension(dimension) => {
                assert_eq!(dimension.value, "10");
                assert_eq!(dimension.unit, "px");
            }
            other => panic!("unexpected {other:?}"),
        }
        match items[2] {
            Node::Percentage(percentage) => assert_eq!(percentage.value, "50"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(*items[4], Node::number("-1.5e3"));
    }

    #[test]
    fn strings_and_urls_are_decoded() {
        let node = value(r#""a\"b" url(x\).png) url( "y.png" )"#);
        let items = children(&node);

        match (items[0], items[2], items[4]) {
            (Node::String(string), Node::Url(first), Node::Url(second)) => {
                assert_eq!(string.value, "a\"b");
                assert_eq!(first.value, "x).png");
                assert_eq!(second.value, "y.png");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn functions_and_blocks_nest() {
        let node = value("calc(1px + (2 * 3)) [a b]");
        let items = children(&node);

        match items[0] {
            Node::Function(function) => {
                assert_eq!(function.name, "calc");
                let kinds: Vec<_> = function.children.iter().map(Node::kind).collect();
                assert_eq!(
                    kinds,
                    ["Dimension", "WhiteSpace", "Operator", "WhiteSpace", "Parentheses"]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(items[2].kind(), "Brackets");
    }

    #[test]
    fn var_fallback_is_raw_by_default() {
        let node = value("var(--x, 1px 2px)");

        match children(&node)[0] {
            Node::Function(function) => {
                let args: Vec<_> = function.children.iter().collect();
                assert_eq!(*args[0], Node::identifier("--x"));
                assert_eq!(*args[1], Node::operator(","));
                assert_eq!(*args[2], Node::raw(" 1px 2px"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn var_fallback_is_parsed_on_request() {
        let options = ParseOptions::new()
            .context(Context::Value)
            .parse_custom_property(true);

        let node = parse("var(--x, red)", &options).unwrap();

        match children(&node)[0] {
            Node::Function(function) => {
                assert_eq!(function.children.last().map(Node::kind), Some("Value"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unicode_ranges() {
        for source in ["U+26", "u+0-7F", "u+0025-00ff", "u+4??", "u+??????", "U+A5"] {
            match children(&value(source))[0] {
                Node::UnicodeRange(range) => assert_eq!(range.value, source),
                other => panic!("{source}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unicode_range_errors() {
        assert_eq!(strict_value("u+1234567").unwrap_err().message, "Too many hex digits");
        assert_eq!(strict_value("u+1???????").unwrap_err().message, "Too many question marks");
        assert_eq!(
            strict_value("u+ x").unwrap_err().message,
            "Hex digit or question mark is expected"
        );
    }

    #[test]
    fn hash_delim_is_an_error() {
        let error = strict_value("# a").unwrap_err();
        assert_eq!(error.message, "Hex or identifier is expected");
        assert_eq!(error.offset, 1);
    }

    #[test]
    fn url_function_must_be_named_url() {
        let options = ParseOptions::new();
        let mut hooks = ParseHooks::new();
        let mut parser = crate::parser::Parser::new(
            crate::tokenizer::TokenStream::new("uri(\"a\")"),
            &options,
            &mut hooks,
        );
        assert_eq!(parser.url().unwrap_err().message, "Function name must be `url`");
    }
}
