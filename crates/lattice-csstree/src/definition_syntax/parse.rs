//! Recursive descent parser for value definitions.

use crate::error::SyntaxParseError;

use super::{Combinator, Range, SyntaxNode};

const INFINITY: char = '\u{221E}';

type PResult<T> = Result<T, SyntaxParseError>;

/// Parse a value definition into a grammar tree.
///
/// A top-level definition consisting of a single bracketed group is
/// returned as that group.
pub fn parse(source: &str) -> PResult<SyntaxNode> {
    let mut scanner = Scanner { source, pos: 0 };
    let result = scanner.implicit_group()?;

    if scanner.pos != source.len() {
        return Err(scanner.error("Unexpected input"));
    }

    match result {
        SyntaxNode::Group { mut terms, .. }
            if terms.len() == 1 && matches!(terms[0], SyntaxNode::Group { .. }) =>
        {
            Ok(terms.remove(0))
        }
        other => Ok(other),
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-'
}

fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{c}')
}

enum Item {
    Term(SyntaxNode),
    Combinator(Combinator),
    Spaces,
}

struct Scanner<'s> {
    source: &'s str,
    pos: usize,
}

impl Scanner<'_> {
    fn error(&self, message: &str) -> SyntaxParseError {
        SyntaxParseError::new(message, self.source, self.pos)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn next_char(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn is(&self, ch: char) -> bool {
        self.peek_char() == Some(ch)
    }

    fn bump(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn eat(&mut self, ch: char) -> PResult<()> {
        if !self.is(ch) {
            return Err(self.error(&format!("Expect `{ch}`")));
        }
        self.bump();
        Ok(())
    }

    fn skip_ws(&mut self) {
        while self.peek_char().is_some_and(is_space) {
            self.bump();
        }
    }

    fn scan_while(&mut self, predicate: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        while self.peek_char().is_some_and(&predicate) {
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn scan_word(&mut self) -> PResult<String> {
        let word = self.scan_while(is_name_char).to_string();
        if word.is_empty() {
            return Err(self.error("Expect a keyword"));
        }
        Ok(word)
    }

    fn scan_number(&mut self) -> PResult<u32> {
        let digits = self.scan_while(|ch| ch.is_ascii_digit());
        if digits.is_empty() {
            return Err(self.error("Expect a number"));
        }
        digits.parse().map_err(|_| self.error("Expect a number"))
    }

    fn scan_string(&mut self) -> PResult<String> {
        let start = self.pos;
        match self.source[start + 1..].find('\'') {
            Some(end) => {
                self.pos = start + 1 + end + 1;
                Ok(self.source[start..self.pos].to_string())
            }
            None => {
                self.pos = self.source.len();
                Err(self.error("Expect an apostrophe"))
            }
        }
    }

    // terms and combinators up to a closing bracket or parenthesis
    fn implicit_group(&mut self) -> PResult<SyntaxNode> {
        let mut terms = Vec::new();
        let mut combinators = Vec::new();
        let mut prev_is_combinator: Option<bool> = None;
        let mut combinator_start = self.pos;

        loop {
            let start = self.pos;
            let Some(item) = self.peek()? else {
                break;
            };

            match item {
                Item::Spaces => {}
                Item::Combinator(combinator) => {
                    if prev_is_combinator != Some(false) {
                        self.pos = start;
                        return Err(self.error("Unexpected combinator"));
                    }
                    combinators.push(combinator);
                    combinator_start = start;
                    prev_is_combinator = Some(true);
                }
                Item::Term(term) => {
                    if prev_is_combinator == Some(false) {
                        combinators.push(Combinator::Juxtapose);
                    }
                    terms.push(term);
                    prev_is_combinator = Some(false);
                }
            }
        }

        if prev_is_combinator == Some(true) {
            self.pos = combinator_start;
            return Err(self.error("Unexpected combinator"));
        }

        Ok(regroup(terms, &combinators))
    }

    fn group(&mut self) -> PResult<SyntaxNode> {
        self.eat('[')?;
        let inner = self.implicit_group()?;
        self.eat(']')?;

        let disallow_empty = self.is('!');
        if disallow_empty {
            self.bump();
        }

        Ok(match inner {
            SyntaxNode::Group { combinator, terms, .. } => SyntaxNode::Group {
                combinator,
                terms,
                explicit: true,
                disallow_empty,
            },
            other => other,
        })
    }

    fn multiplier_range(&mut self) -> PResult<(u32, Option<u32>)> {
        self.eat('{')?;
        self.skip_ws();
        let min = self.scan_number()?;
        self.skip_ws();

        let max = if self.is(',') {
            self.bump();
            self.skip_ws();
            if self.is('}') {
                None
            } else {
                let max = self.scan_number()?;
                self.skip_ws();
                Some(max)
            }
        } else {
            Some(min)
        };

        self.eat('}')?;
        Ok((min, max))
    }

    fn multiplier(&mut self) -> PResult<Option<(u32, Option<u32>, bool)>> {
        let multiplier = match self.peek_char() {
            Some('*') => {
                self.bump();
                (0, None, false)
            }
            Some('+') => {
                self.bump();
                (1, None, false)
            }
            Some('?') => {
                self.bump();
                (0, Some(1), false)
            }
            Some('#') => {
                self.bump();
                match self.peek_char() {
                    Some('{') => {
                        let (min, max) = self.multiplier_range()?;
                        (min, max, true)
                    }
                    Some('?') => {
                        self.bump();
                        (0, None, true)
                    }
                    _ => (1, None, true),
                }
            }
            Some('{') => {
                let (min, max) = self.multiplier_range()?;
                (min, max, false)
            }
            _ => return Ok(None),
        };

        Ok(Some(multiplier))
    }

    fn maybe_multiplied(&mut self, node: SyntaxNode) -> PResult<SyntaxNode> {
        let Some((min, max, comma)) = self.multiplier()? else {
            return Ok(node);
        };

        // `{1}` alone changes nothing
        if min == 1 && max == Some(1) && !comma {
            return Ok(node);
        }

        let was_plus = !comma && min == 1 && max.is_none() && self.source[..self.pos].ends_with('+');
        let node = SyntaxNode::Multiplier {
            min,
            max,
            comma,
            term: Box::new(node),
        };

        // `+#` is a comma separated list of space separated lists
        if was_plus && self.is('#') {
            return self.maybe_multiplied(node);
        }

        Ok(node)
    }

    fn property(&mut self) -> PResult<SyntaxNode> {
        self.eat('<')?;
        self.eat('\'')?;
        let name = self.scan_word()?;
        self.eat('\'')?;
        self.eat('>')?;

        self.maybe_multiplied(SyntaxNode::Property { name })
    }

    fn range_bound(&mut self, allow_negative_infinity: bool) -> PResult<Option<f64>> {
        let negative = self.is('-');
        if negative {
            self.bump();
        }

        if self.is(INFINITY) {
            if negative != allow_negative_infinity {
                return Err(self.error("Unexpected infinity"));
            }
            self.bump();
            return Ok(None);
        }

        let value = f64::from(self.scan_number()?);
        Ok(Some(if negative { -value } else { value }))
    }

    // `[min,max]` after a type name
    fn type_range(&mut self) -> PResult<Range> {
        self.eat('[')?;
        self.skip_ws();
        let min = self.range_bound(true)?;
        self.skip_ws();
        self.eat(',')?;
        self.skip_ws();
        let max = self.range_bound(false)?;
        self.skip_ws();
        self.eat(']')?;

        Ok(Range { min, max })
    }

    fn type_ref(&mut self) -> PResult<SyntaxNode> {
        self.eat('<')?;
        let mut name = self.scan_word()?;

        if self.source[self.pos..].starts_with("()") {
            self.pos += 2;
            name.push_str("()");
        }

        let mut range = None;
        let rest = self.source[self.pos..].trim_start_matches(is_space);
        if rest.starts_with('[') {
            self.skip_ws();
            let parsed = self.type_range()?;
            // `[-∞,∞]` is no restriction at all
            if parsed.min.is_some() || parsed.max.is_some() {
                range = Some(parsed);
            }
        }

        self.eat('>')?;
        self.maybe_multiplied(SyntaxNode::Type { name, range })
    }

    fn keyword_or_function(&mut self) -> PResult<SyntaxNode> {
        let name = self.scan_word()?;

        if self.is('(') {
            self.bump();
            let children = self.implicit_group()?;
            self.eat(')')?;
            return self.maybe_multiplied(SyntaxNode::Function {
                name,
                children: Box::new(children),
            });
        }

        self.maybe_multiplied(SyntaxNode::Keyword { name })
    }

    fn parentheses(&mut self) -> PResult<SyntaxNode> {
        self.eat('(')?;
        let children = self.implicit_group()?;
        self.eat(')')?;

        self.maybe_multiplied(SyntaxNode::Parentheses {
            children: Box::new(children),
        })
    }

    fn peek(&mut self) -> PResult<Option<Item>> {
        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };

        if is_name_char(ch) {
            return Ok(Some(Item::Term(self.keyword_or_function()?)));
        }

        let item = match ch {
            // closers end the current group
            ']' | ')' => return Ok(None),
            '[' => {
                let group = self.group()?;
                Item::Term(self.maybe_multiplied(group)?)
            }
            '<' if self.next_char() == Some('\'') => Item::Term(self.property()?),
            '<' => Item::Term(self.type_ref()?),
            '(' => Item::Term(self.parentheses()?),
            '|' => {
                self.bump();
                if self.is('|') {
                    self.bump();
                    Item::Combinator(Combinator::DoubleVerticalLine)
                } else {
                    Item::Combinator(Combinator::VerticalLine)
                }
            }
            '&' => {
                self.bump();
                self.eat('&')?;
                Item::Combinator(Combinator::DoubleAmpersand)
            }
            ',' => {
                self.bump();
                Item::Term(SyntaxNode::Comma)
            }
            '\'' => {
                let value = self.scan_string()?;
                Item::Term(self.maybe_multiplied(SyntaxNode::String { value })?)
            }
            ch if is_space(ch) => {
                self.skip_ws();
                Item::Spaces
            }
            '@' if self.next_char().is_some_and(is_name_char) => {
                self.bump();
                Item::Term(SyntaxNode::AtKeyword {
                    name: self.scan_word()?,
                })
            }
            // multiplier characters cannot start a term
            '*' | '+' | '?' | '#' | '!' => return Ok(None),
            '{' if self.next_char().is_some_and(|next| next.is_ascii_digit()) => return Ok(None),
            ch => {
                self.bump();
                Item::Term(SyntaxNode::Token { value: ch.to_string() })
            }
        };

        Ok(Some(item))
    }
}

/// Nest `terms` by combinator precedence: runs joined by a tighter
/// combinator become implicit groups inside looser ones.
fn regroup(terms: Vec<SyntaxNode>, combinators: &[Combinator]) -> SyntaxNode {
    let Some(&loosest) = combinators.iter().max() else {
        return SyntaxNode::group(Combinator::Juxtapose, terms);
    };

    let mut groups = Vec::new();
    let mut run = Vec::new();
    let mut run_combinators = Vec::new();
    let mut separators = combinators.iter();

    for term in terms {
        run.push(term);

        match separators.next() {
            Some(&combinator) if combinator == loosest => {
                groups.push(collapse(std::mem::take(&mut run), std::mem::take(&mut run_combinators)));
            }
            Some(&combinator) => run_combinators.push(combinator),
            None => {}
        }
    }
    groups.push(collapse(run, run_combinators));

    SyntaxNode::group(loosest, groups)
}

fn collapse(mut run: Vec<SyntaxNode>, combinators: Vec<Combinator>) -> SyntaxNode {
    if run.len() == 1 {
        return run.remove(0);
    }
    regroup(run, &combinators)
}
