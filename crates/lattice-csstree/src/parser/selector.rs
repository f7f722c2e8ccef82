//! Selector productions, including the `An+B` microsyntax.

use crate::ast::{
    AnPlusB, AttributeSelector, ClassSelector, Combinator, IdSelector, Identifier, Node, Nth,
    PseudoClassSelector, PseudoElementSelector, Selector, SelectorList, TypeSelector,
};
use crate::list::List;
use crate::tokenizer::char_code::is_digit;
use crate::tokenizer::TokenType;

use super::sequence::{RawMode, Scope};
use super::state::{PResult, Parser};

const DOLLAR_SIGN: u32 = 0x0024;
const ASTERISK: u32 = 0x002A;
const PLUS_SIGN: u32 = 0x002B;
const HYPHEN_MINUS: u32 = 0x002D;
const FULL_STOP: u32 = 0x002E;
const SOLIDUS: u32 = 0x002F;
const EQUALS_SIGN: u32 = 0x003D;
const GREATER_THAN_SIGN: u32 = 0x003E;
const CIRCUMFLEX_ACCENT: u32 = 0x005E;
const VERTICAL_LINE: u32 = 0x007C;
const TILDE: u32 = 0x007E;
const LOWER_N: u32 = 0x006E;

/// How the arguments of a functional pseudo class or element are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PseudoArguments {
    Identifier,
    SelectorList,
    Selector,
    Nth { of_clause: bool },
    Raw,
}

fn pseudo_arguments(name: &str) -> PseudoArguments {
    match name.to_ascii_lowercase().as_str() {
        "dir" | "lang" => PseudoArguments::Identifier,
        "has" | "is" | "where" | "not" | "matches" | "any" | "-moz-any" | "-webkit-any" => {
            PseudoArguments::SelectorList
        }
        "slotted" | "host" | "host-context" => PseudoArguments::Selector,
        "nth-child" | "nth-last-child" => PseudoArguments::Nth { of_clause: true },
        "nth-of-type" | "nth-last-of-type" => PseudoArguments::Nth { of_clause: false },
        _ => PseudoArguments::Raw,
    }
}

impl Parser<'_, '_, '_> {
    pub fn selector_list(&mut self) -> PResult<Node> {
        let mut children = List::new();

        while !self.stream.eof {
            children.push(self.selector()?);

            if self.stream.token_type != TokenType::Comma {
                break;
            }
            self.stream.next();
        }

        Ok(Node::SelectorList(SelectorList {
            loc: self.location_from_list(&children),
            children,
        }))
    }

    pub fn selector(&mut self) -> PResult<Node> {
        let children = self.read_sequence(Scope::Selector)?;

        if children.is_empty() {
            return Err(self.error("Selector is expected", None));
        }

        Ok(Node::Selector(Selector {
            loc: self.location_from_list(&children),
            children,
        }))
    }

    fn eat_identifier_or_asterisk(&mut self) -> PResult<()> {
        if self.stream.token_type != TokenType::Ident && !self.stream.is_delim(ASTERISK, 0) {
            return Err(self.error("Identifier or asterisk is expected", None));
        }

        self.stream.next();
        Ok(())
    }

    /// `name`, `*`, `ns|name`, `*|*` or `|name`.
    pub fn type_selector(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;

        if self.stream.is_delim(VERTICAL_LINE, 0) {
            self.stream.next();
            self.eat_identifier_or_asterisk()?;
        } else {
            self.eat_identifier_or_asterisk()?;
            if self.stream.is_delim(VERTICAL_LINE, 0) {
                self.stream.next();
                self.eat_identifier_or_asterisk()?;
            }
        }

        Ok(Node::TypeSelector(TypeSelector {
            loc: self.location(start, self.stream.token_start),
            name: self.stream.substr_to_cursor(start).to_string(),
        }))
    }

    pub fn class_selector(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        self.eat_delim(FULL_STOP)?;
        let name = self.consume(TokenType::Ident)?;

        Ok(Node::ClassSelector(ClassSelector {
            loc: self.location(start, self.stream.token_start),
            name: name.to_string(),
        }))
    }

    pub fn id_selector(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        self.eat(TokenType::Hash)?;

        Ok(Node::IdSelector(IdSelector {
            loc: self.location(start, self.stream.token_start),
            name: self.stream.substr_to_cursor(start + 1).to_string(),
        }))
    }

    fn attribute_name(&mut self) -> PResult<Node> {
        if self.stream.eof {
            return Err(self.error("Unexpected end of input", None));
        }

        let start = self.stream.token_start;
        let mut expect_ident = false;

        if self.stream.is_delim(ASTERISK, 0) {
            expect_ident = true;
            self.stream.next();
        } else if !self.stream.is_delim(VERTICAL_LINE, 0) {
            self.eat(TokenType::Ident)?;
        }

        if self.stream.is_delim(VERTICAL_LINE, 0) {
            if self.stream.char_code_at(self.stream.token_start + 1) != EQUALS_SIGN {
                self.stream.next();
                self.eat(TokenType::Ident)?;
            } else if expect_ident {
                return Err(self.error("Identifier is expected", Some(self.stream.token_end)));
            }
        } else if expect_ident {
            return Err(self.error("Vertical line is expected", None));
        }

        Ok(Node::Identifier(Identifier {
            loc: self.location(start, self.stream.token_start),
            name: self.stream.substr_to_cursor(start).to_string(),
        }))
    }

    fn attribute_matcher(&mut self) -> PResult<String> {
        let start = self.stream.token_start;
        let code = self.stream.char_code_at(start);

        if self.stream.token_type != TokenType::Delim
            || !matches!(
                code,
                EQUALS_SIGN | TILDE | CIRCUMFLEX_ACCENT | DOLLAR_SIGN | ASTERISK | VERTICAL_LINE
            )
        {
            return Err(self.error("Attribute selector (=, ~=, ^=, $=, *=, |=) is expected", None));
        }

        self.stream.next();

        if code != EQUALS_SIGN {
            if !self.stream.is_delim(EQUALS_SIGN, 0) {
                return Err(self.error("Equal sign is expected", None));
            }
            self.stream.next();
        }

        Ok(self.stream.substr_to_cursor(start).to_string())
    }

    /// `[name]`, `[name op value]` and `[name op value flags]`.
    pub fn attribute_selector(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let mut matcher = None;
        let mut value = None;
        let mut flags = None;

        self.eat(TokenType::LeftSquareBracket)?;
        self.stream.skip_sc();

        let name = self.attribute_name()?;
        self.stream.skip_sc();

        if self.stream.token_type != TokenType::RightSquareBracket {
            // `[name i]` has flags but no matcher
            if self.stream.token_type != TokenType::Ident {
                matcher = Some(self.attribute_matcher()?);
                self.stream.skip_sc();

                value = Some(Box::new(if self.stream.token_type == TokenType::String {
                    self.string()?
                } else {
                    self.identifier()?
                }));
                self.stream.skip_sc();
            }

            if self.stream.token_type == TokenType::Ident {
                flags = Some(self.consume(TokenType::Ident)?.to_string());
                self.stream.skip_sc();
            }
        }

        self.eat(TokenType::RightSquareBracket)?;

        Ok(Node::AttributeSelector(AttributeSelector {
            loc: self.location(start, self.stream.token_start),
            name: Box::new(name),
            matcher,
            value,
            flags,
        }))
    }

    /// Name and optional argument list of a pseudo class or element, with
    /// the cursor just past the colons.
    fn pseudo(&mut self) -> PResult<(String, Option<List<Node>>)> {
        if self.stream.token_type != TokenType::Function {
            let name = self.consume(TokenType::Ident)?;
            return Ok((name.to_string(), None));
        }

        let name = self.consume_function_name()?;

        let children = match pseudo_arguments(name) {
            PseudoArguments::Raw => {
                let start = self.stream.token_index;
                List::from_vec(vec![self.raw(start, RawMode::Default, false)])
            }
            PseudoArguments::Identifier => self.single_argument(Self::identifier)?,
            PseudoArguments::SelectorList => self.single_argument(Self::selector_list)?,
            PseudoArguments::Selector => self.single_argument(Self::selector)?,
            PseudoArguments::Nth { of_clause } => self.single_argument(|parser| parser.nth(of_clause))?,
        };

        self.eat(TokenType::RightParenthesis)?;

        Ok((name.to_string(), Some(children)))
    }

    fn single_argument<F>(&mut self, read: F) -> PResult<List<Node>>
    where
        F: FnOnce(&mut Self) -> PResult<Node>,
    {
        self.stream.skip_sc();
        let child = read(self)?;
        self.stream.skip_sc();

        Ok(List::from_vec(vec![child]))
    }

    pub fn pseudo_class_selector(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        self.eat(TokenType::Colon)?;
        let (name, children) = self.pseudo()?;

        Ok(Node::PseudoClassSelector(PseudoClassSelector {
            loc: self.location(start, self.stream.token_start),
            name,
            children,
        }))
    }

    pub fn pseudo_element_selector(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        self.eat(TokenType::Colon)?;
        self.eat(TokenType::Colon)?;
        let (name, children) = self.pseudo()?;

        Ok(Node::PseudoElementSelector(PseudoElementSelector {
            loc: self.location(start, self.stream.token_start),
            name,
            children,
        }))
    }

    /// `>`, `+`, `~` or `/deep/`.
    pub fn combinator(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;

        let name = match self.stream.token_type {
            TokenType::WhiteSpace => {
                self.stream.next();
                " ".to_string()
            }
            TokenType::Delim => {
                match self.stream.char_code_at(start) {
                    GREATER_THAN_SIGN | PLUS_SIGN | TILDE => self.stream.next(),
                    SOLIDUS => {
                        self.stream.next();
                        self.eat_ident("deep")?;
                        self.eat_delim(SOLIDUS)?;
                    }
                    _ => return Err(self.error("Combinator is expected", None)),
                }
                self.stream.substr_to_cursor(start).to_string()
            }
            _ => return Err(self.error("Combinator is expected", None)),
        };

        Ok(Node::Combinator(Combinator {
            loc: self.location(start, self.stream.token_start),
            name,
        }))
    }

    /// `odd`, `even` or `An+B`, optionally followed by `of <selector-list>`.
    pub fn nth(&mut self, of_clause: bool) -> PResult<Node> {
        self.stream.skip_sc();

        let start = self.stream.token_start;
        let nth = if self.stream.lookup_value(0, "odd") || self.stream.lookup_value(0, "even") {
            self.identifier()?
        } else {
            self.an_plus_b()?
        };

        let mut end = self.stream.token_start;
        self.stream.skip_sc();

        let mut selector = None;
        if of_clause && self.stream.lookup_value(0, "of") {
            self.stream.next();
            selector = Some(Box::new(self.selector_list()?));
            end = self.stream.token_start;
        }

        Ok(Node::Nth(Nth {
            loc: self.location(start, end),
            nth: Box::new(nth),
            selector,
        }))
    }

    fn check_integer(&self, offset: usize, disallow_sign: bool) -> PResult<()> {
        let mut pos = self.stream.token_start + offset;
        let code = self.stream.char_code_at(pos);

        if code == PLUS_SIGN || code == HYPHEN_MINUS {
            if disallow_sign {
                return Err(self.error("Number sign is not allowed", Some(pos)));
            }
            pos += 1;
        }

        while pos < self.stream.token_end {
            if !is_digit(self.stream.char_code_at(pos)) {
                return Err(self.error("Integer is expected", Some(pos)));
            }
            pos += 1;
        }

        Ok(())
    }

    fn expect_char_code(&self, offset: usize, code: u32) -> PResult<()> {
        let pos = self.stream.token_start + offset;

        if !self.stream.cmp_char(pos, code) {
            let message = if code == LOWER_N { "N is expected" } else { "HyphenMinus is expected" };
            return Err(self.error(message, Some(pos)));
        }

        Ok(())
    }

    // <signed-integer> | ['+' | '-'] <signless-integer>
    fn an_plus_b_tail(&mut self) -> PResult<Option<String>> {
        let is_trivia = |ty| matches!(ty, TokenType::WhiteSpace | TokenType::Comment);

        let mut offset = 0isize;
        let mut sign = 0u32;
        let mut ty = self.stream.token_type;

        while is_trivia(ty) {
            offset += 1;
            ty = self.stream.lookup_type(offset);
        }

        if ty != TokenType::Number {
            if self.stream.is_delim(PLUS_SIGN, offset) || self.stream.is_delim(HYPHEN_MINUS, offset) {
                sign = if self.stream.is_delim(PLUS_SIGN, offset) { PLUS_SIGN } else { HYPHEN_MINUS };

                loop {
                    offset += 1;
                    ty = self.stream.lookup_type(offset);
                    if !is_trivia(ty) {
                        break;
                    }
                }

                if ty != TokenType::Number {
                    self.stream.skip(offset);
                    self.check_integer(0, true)?;
                    offset = 0;
                }
            } else {
                return Ok(None);
            }
        }

        if offset > 0 {
            self.stream.skip(offset);
        }

        if sign == 0 {
            let code = self.stream.char_code_at(self.stream.token_start);
            if code != PLUS_SIGN && code != HYPHEN_MINUS {
                return Err(self.error("Number sign is expected", None));
            }
        }

        self.check_integer(0, sign != 0)?;
        let number = self.consume(TokenType::Number)?;

        Ok(Some(if sign == HYPHEN_MINUS {
            format!("-{number}")
        } else {
            number.to_string()
        }))
    }

    // n- <signless-integer>
    fn an_plus_b_dash_tail(&mut self) -> PResult<String> {
        self.stream.next();
        self.stream.skip_sc();
        self.check_integer(0, true)?;
        Ok(format!("-{}", self.consume(TokenType::Number)?))
    }

    pub fn an_plus_b(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let mut a: Option<String> = None;
        let b: Option<String>;

        if self.stream.token_type == TokenType::Number {
            // <integer>
            self.check_integer(0, false)?;
            b = Some(self.consume(TokenType::Number)?.to_string());
        } else if self.stream.token_type == TokenType::Ident && self.stream.cmp_char(start, HYPHEN_MINUS) {
            a = Some("-1".to_string());
            self.expect_char_code(1, LOWER_N)?;

            b = match self.stream.get_token_length() {
                // -n, -n <signed-integer>, -n ['+' | '-'] <signless-integer>
                2 => {
                    self.stream.next();
                    self.an_plus_b_tail()?
                }
                // -n- <signless-integer>
                3 => {
                    self.expect_char_code(2, HYPHEN_MINUS)?;
                    Some(self.an_plus_b_dash_tail()?)
                }
                // -n-<digits>
                _ => {
                    self.expect_char_code(2, HYPHEN_MINUS)?;
                    self.check_integer(3, true)?;
                    self.stream.next();
                    Some(self.stream.substr_to_cursor(start + 2).to_string())
                }
            };
        } else if self.stream.token_type == TokenType::Ident
            || (self.stream.is_delim(PLUS_SIGN, 0) && self.stream.lookup_type(1) == TokenType::Ident)
        {
            a = Some("1".to_string());

            let mut sign = 0;
            if self.stream.is_delim(PLUS_SIGN, 0) {
                sign = 1;
                self.stream.next();
            }

            self.expect_char_code(0, LOWER_N)?;

            b = match self.stream.get_token_length() {
                // n, n <signed-integer>, n ['+' | '-'] <signless-integer>
                1 => {
                    self.stream.next();
                    self.an_plus_b_tail()?
                }
                // n- <signless-integer>
                2 => {
                    self.expect_char_code(1, HYPHEN_MINUS)?;
                    Some(self.an_plus_b_dash_tail()?)
                }
                // n-<digits>
                _ => {
                    self.expect_char_code(1, HYPHEN_MINUS)?;
                    self.check_integer(2, true)?;
                    self.stream.next();
                    Some(self.stream.substr_to_cursor(start + sign + 1).to_string())
                }
            };
        } else if self.stream.token_type == TokenType::Dimension {
            let token_start = self.stream.token_start;
            let code = self.stream.char_code_at(token_start);
            let sign = usize::from(code == PLUS_SIGN || code == HYPHEN_MINUS);

            let mut i = token_start + sign;
            while i < self.stream.token_end && is_digit(self.stream.char_code_at(i)) {
                i += 1;
            }

            if i == token_start + sign {
                return Err(self.error("Integer is expected", Some(token_start + sign)));
            }

            self.expect_char_code(i - token_start, LOWER_N)?;
            a = Some(self.stream.substring(start, i).to_string());

            b = if i + 1 == self.stream.token_end {
                // <n-dimension> followed by an optional signed tail
                self.stream.next();
                self.an_plus_b_tail()?
            } else {
                self.expect_char_code(i - token_start + 1, HYPHEN_MINUS)?;

                if i + 2 == self.stream.token_end {
                    // <ndash-dimension> <signless-integer>
                    Some(self.an_plus_b_dash_tail()?)
                } else {
                    // <ndashdigit-dimension>
                    self.check_integer(i - token_start + 2, true)?;
                    self.stream.next();
                    Some(self.stream.substr_to_cursor(i + 1).to_string())
                }
            };
        } else {
            return Err(self.error("Unexpected input", None));
        }

        let strip_plus = |value: String| match value.strip_prefix('+') {
            Some(rest) => rest.to_string(),
            None => value,
        };

        Ok(Node::AnPlusB(AnPlusB {
            loc: self.location(start, self.stream.token_start),
            a: a.map(strip_plus),
            b: b.map(strip_plus),
        }))
    }
}
