//! Media query productions.

use crate::ast::{MediaFeature, MediaQuery, MediaQueryList, Node, Ratio};
use crate::list::List;
use crate::tokenizer::char_code::is_digit;
use crate::tokenizer::TokenType;

use super::state::{PResult, Parser};

const FULL_STOP: u32 = 0x002E;
const SOLIDUS: u32 = 0x002F;

impl<'s> Parser<'s, '_, '_> {
    pub fn media_query_list(&mut self) -> PResult<Node> {
        let mut children = List::new();

        self.stream.skip_sc();

        while !self.stream.eof {
            children.push(self.media_query()?);

            if self.stream.token_type != TokenType::Comma {
                break;
            }
            self.stream.next();
        }

        Ok(Node::MediaQueryList(MediaQueryList {
            loc: self.location_from_list(&children),
            children,
        }))
    }

    /// Identifiers and parenthesized features, e.g. `not screen and (color)`.
    pub fn media_query(&mut self) -> PResult<Node> {
        let mut children = List::new();

        self.stream.skip_sc();

        while !self.stream.eof {
            let child = match self.stream.token_type {
                TokenType::Comment | TokenType::WhiteSpace => {
                    self.stream.next();
                    continue;
                }
                TokenType::Ident => self.identifier()?,
                TokenType::LeftParenthesis => self.media_feature()?,
                _ => break,
            };

            children.push(child);
        }

        if children.is_empty() {
            return Err(self.error("Identifier or parenthesis is expected", None));
        }

        Ok(Node::MediaQuery(MediaQuery {
            loc: self.location_from_list(&children),
            children,
        }))
    }

    /// `(name)` or `(name: value)`.
    pub fn media_feature(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;
        let mut value = None;

        self.eat(TokenType::LeftParenthesis)?;
        self.stream.skip_sc();

        let name = self.consume(TokenType::Ident)?;
        self.stream.skip_sc();

        if self.stream.token_type != TokenType::RightParenthesis {
            self.eat(TokenType::Colon)?;
            self.stream.skip_sc();

            let feature_value = match self.stream.token_type {
                TokenType::Number => {
                    if self.lookup_non_ws_type(1) == TokenType::Delim {
                        self.ratio()?
                    } else {
                        self.number()?
                    }
                }
                TokenType::Dimension => self.dimension()?,
                TokenType::Ident => self.identifier()?,
                _ => {
                    return Err(self.error("Number, dimension, ratio or identifier is expected", None));
                }
            };

            value = Some(Box::new(feature_value));
            self.stream.skip_sc();
        }

        self.eat(TokenType::RightParenthesis)?;

        Ok(Node::MediaFeature(MediaFeature {
            loc: self.location(start, self.stream.token_start),
            name: name.to_string(),
            value,
        }))
    }

    // Terms are unsigned numbers without exponent; fractional terms are
    // tolerated since `-o-min-device-pixel-ratio` uses them.
    fn ratio_term(&mut self) -> PResult<&'s str> {
        self.stream.skip_sc();

        let start = self.stream.token_start;
        let value = self.consume(TokenType::Number)?;

        for (index, byte) in value.bytes().enumerate() {
            let code = u32::from(byte);
            if !is_digit(code) && code != FULL_STOP {
                return Err(self.error("Unsigned number is expected", Some(start + index)));
            }
        }

        if value.parse::<f64>().is_ok_and(|number| number == 0.0) {
            return Err(self.error("Zero number is not allowed", Some(start)));
        }

        Ok(value)
    }

    /// `<number> / <number>`.
    pub fn ratio(&mut self) -> PResult<Node> {
        let start = self.stream.token_start;

        let left = self.ratio_term()?;
        self.stream.skip_sc();
        self.eat_delim(SOLIDUS)?;
        let right = self.ratio_term()?;

        Ok(Node::Ratio(Ratio {
            loc: self.location(start, self.stream.token_start),
            left: left.to_string(),
            right: right.to_string(),
        }))
    }
}
