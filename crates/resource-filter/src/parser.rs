//! Filter expression parser.
//!
//! ```text
//! filter   := or EOF
//! or       := and (("or" | "||") and)*
//! and      := term (("and" | "&&") term)*
//! term     := "(" or ")" | value operator value
//! value    := string | number | date | null | true | false
//!           | "$" ident | ident "(" args ")" | "[" path "]" | ident
//! ```
//!
//! Keywords are case-insensitive. `true` and `false` are read as text.

use crate::error::ParseError;
use crate::types::{ComparisonOperator, Node};

/// Word operators, longest phrase first within each prefix.
const WORD_OPERATORS: &[(&[&str], ComparisonOperator)] = &[
    (&["is", "not"], ComparisonOperator::NotEqual),
    (&["is"], ComparisonOperator::Equal),
    (&["less", "than"], ComparisonOperator::Less),
    (&["greater", "than"], ComparisonOperator::Greater),
    (&["like", "not"], ComparisonOperator::NotLike),
    (&["like"], ComparisonOperator::Like),
    (&["not", "like"], ComparisonOperator::NotLike),
    (&["not", "in"], ComparisonOperator::NotIn),
    (&["contains", "not", "any"], ComparisonOperator::NotContainsAny),
    (&["contains", "not"], ComparisonOperator::NotContains),
    (&["contains", "any"], ComparisonOperator::ContainsAny),
    (&["contains"], ComparisonOperator::Contains),
    (&["in"], ComparisonOperator::In),
];

const SYMBOL_OPERATORS: &[(&str, ComparisonOperator)] = &[
    ("==", ComparisonOperator::Equal),
    ("!=", ComparisonOperator::NotEqual),
    ("<>", ComparisonOperator::NotEqual),
    ("<=", ComparisonOperator::LessEqual),
    (">=", ComparisonOperator::GreaterEqual),
    ("<", ComparisonOperator::Less),
    (">", ComparisonOperator::Greater),
    ("=", ComparisonOperator::Equal),
];

/// Filter expression parser.
pub struct FilterParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> FilterParser<'a> {
    /// Parse a filter expression into a tree.
    pub fn parse(input: &'a str) -> Result<Node, ParseError> {
        let mut parser = Self { input, pos: 0 };
        parser.parse_filter()
    }

    fn parse_filter(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        if self.is_at_end() {
            return Err(ParseError::Empty);
        }
        let node = self.parse_or()?;
        self.skip_whitespace();
        if !self.is_at_end() {
            return Err(ParseError::UnexpectedToken {
                token: self.next_word(),
                column: self.column(),
            });
        }
        Ok(node)
    }

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let mut operands = vec![self.parse_and()?];
        loop {
            self.skip_whitespace();
            if self.peek_str("||") {
                self.advance_by(2);
            } else if let Some(end) = self.match_phrase(&["or"]) {
                self.pos = end;
            } else {
                break;
            }
            operands.push(self.parse_and()?);
        }
        Ok(collapse(operands, Node::Or))
    }

    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let mut operands = vec![self.parse_term()?];
        loop {
            self.skip_whitespace();
            if self.peek_str("&&") {
                self.advance_by(2);
            } else if let Some(end) = self.match_phrase(&["and"]) {
                self.pos = end;
            } else {
                break;
            }
            operands.push(self.parse_term()?);
        }
        Ok(collapse(operands, Node::And))
    }

    fn parse_term(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.advance();
            let node = self.parse_or()?;
            self.skip_whitespace();
            self.expect(')')?;
            return Ok(node);
        }

        let left = self.parse_value()?;
        self.skip_whitespace();
        let operator = self
            .parse_operator()
            .ok_or(ParseError::ExpectedOperator {
                column: self.column(),
            })?;
        let right = self.parse_value()?;
        Ok(Node::Comparison {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_operator(&mut self) -> Option<ComparisonOperator> {
        for (symbol, operator) in SYMBOL_OPERATORS {
            if self.peek_str(symbol) {
                self.advance_by(symbol.len());
                return Some(*operator);
            }
        }
        for (words, operator) in WORD_OPERATORS {
            if let Some(end) = self.match_phrase(words) {
                self.pos = end;
                return Some(*operator);
            }
        }
        None
    }

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ParseError::UnexpectedEnd {
                column: self.column(),
            }),
            Some('\'') | Some('"') => self.parse_string().map(Node::Text),
            Some('[') => self.parse_bracket_property(),
            Some('$') => {
                self.advance();
                let name = self.parse_identifier()?;
                Ok(Node::DynamicArg(name))
            }
            Some(c) if c.is_ascii_digit() => {
                if self.matches_shape(self.pos, "9999-99-99") {
                    Ok(self.parse_date())
                } else {
                    self.parse_number()
                }
            }
            Some('-') | Some('+') if self.next_is_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(ParseError::UnexpectedChar {
                ch: c,
                column: self.column(),
            }),
        }
    }

    /// Keyword literal, function call or bare property name.
    fn parse_word(&mut self) -> Result<Node, ParseError> {
        let word = self.parse_identifier()?;
        match word.to_ascii_lowercase().as_str() {
            "null" => return Ok(Node::Null),
            lower @ ("true" | "false") => return Ok(Node::Text(lower.to_string())),
            _ => {}
        }

        let before_args = self.pos;
        self.skip_whitespace();
        if self.peek() != Some('(') {
            self.pos = before_args;
            return Ok(Node::Property(word));
        }
        self.advance();

        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.advance();
                    break;
                }
                Some(',') if !args.is_empty() => self.advance(),
                None => {
                    return Err(ParseError::UnexpectedEnd {
                        column: self.column(),
                    })
                }
                _ => args.push(self.parse_value()?),
            }
        }
        Ok(Node::Function { name: word, args })
    }

    fn parse_bracket_property(&mut self) -> Result<Node, ParseError> {
        let column = self.column();
        self.expect('[')?;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ']' {
                let path = self.input[start..self.pos].trim().to_string();
                self.advance();
                return Ok(Node::Property(path));
            }
            self.advance();
        }
        Err(ParseError::UnclosedProperty { column })
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                self.advance();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(ch) => ParseError::UnexpectedChar {
                    ch,
                    column: self.column(),
                },
                None => ParseError::UnexpectedEnd {
                    column: self.column(),
                },
            });
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let column = self.column();
        let quote = match self.peek() {
            Some(q) => q,
            None => return Err(ParseError::UnexpectedEnd { column }),
        };
        self.advance();

        let mut result = String::new();

        loop {
            match self.peek() {
                None => return Err(ParseError::UnclosedString { column }),
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let escape_column = self.column();
                    self.advance();
                    match self.peek() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('\\') => result.push('\\'),
                        Some('\'') => result.push('\''),
                        Some('"') => result.push('"'),
                        Some('u') => {
                            let ch = self
                                .input
                                .get(self.pos + 1..self.pos + 5)
                                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                                .and_then(char::from_u32)
                                .ok_or(ParseError::InvalidEscape {
                                    column: escape_column,
                                })?;
                            result.push(ch);
                            self.advance_by(4);
                        }
                        _ => {
                            return Err(ParseError::InvalidEscape {
                                column: escape_column,
                            })
                        }
                    }
                    self.advance();
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }

        Ok(result)
    }

    fn parse_number(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }
        self.skip_digits();

        if self.peek() == Some('.') && self.next_is_digit() {
            self.advance();
            self.skip_digits();
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let exponent = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if matches!(self.peek(), Some('0'..='9')) {
                self.skip_digits();
            } else {
                // Not an exponent after all.
                self.pos = exponent;
            }
        }

        Ok(Node::Number(self.input[start..self.pos].to_string()))
    }

    /// `YYYY-MM-DD`, optionally followed by `Thh:mm[:ss[.f]]` and an offset.
    fn parse_date(&mut self) -> Node {
        let start = self.pos;
        self.advance_by(10);

        if !self.matches_shape(self.pos, "T99:99") {
            return Node::Date(self.input[start..self.pos].to_string());
        }
        self.advance_by(6);
        if self.matches_shape(self.pos, ":99") {
            self.advance_by(3);
            if self.peek() == Some('.') && self.next_is_digit() {
                self.advance();
                self.skip_digits();
            }
        }

        if self.peek() == Some('Z') {
            self.advance();
        } else if self.matches_shape(self.pos, "+99:99") || self.matches_shape(self.pos, "-99:99") {
            self.advance_by(6);
        } else {
            return Node::DateTime(self.input[start..self.pos].to_string());
        }
        Node::OffsetDateTime(self.input[start..self.pos].to_string())
    }

    /// Matches a case-insensitive keyword phrase at the current position.
    /// Returns the end offset without consuming input.
    fn match_phrase(&self, words: &[&str]) -> Option<usize> {
        let mut pos = self.pos;
        for (i, word) in words.iter().enumerate() {
            if i > 0 {
                let rest = &self.input[pos..];
                let trimmed = rest.trim_start();
                if trimmed.len() == rest.len() {
                    return None;
                }
                pos += rest.len() - trimmed.len();
            }
            let rest = &self.input[pos..];
            let head = rest.get(..word.len())?;
            if !head.eq_ignore_ascii_case(word) {
                return None;
            }
            if rest[word.len()..].chars().next().is_some_and(is_identifier_char) {
                return None;
            }
            pos += word.len();
        }
        Some(pos)
    }

    /// `shape` uses `9` for any ASCII digit; other characters match literally.
    fn matches_shape(&self, at: usize, shape: &str) -> bool {
        let bytes = self.input.as_bytes();
        shape.bytes().enumerate().all(|(i, s)| match bytes.get(at + i) {
            Some(b) if s == b'9' => b.is_ascii_digit(),
            Some(b) => *b == s,
            None => false,
        })
    }

    fn next_word(&self) -> String {
        self.input[self.pos..]
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    }

    fn next_is_digit(&self) -> bool {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        matches!(chars.next(), Some('0'..='9'))
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
    }

    fn column(&self) -> usize {
        self.input[..self.pos].chars().count() + 1
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError::UnexpectedChar {
                ch,
                column: self.column(),
            }),
            None => Err(ParseError::UnexpectedEnd {
                column: self.column(),
            }),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '/')
}

fn collapse(mut operands: Vec<Node>, join: fn(Vec<Node>) -> Node) -> Node {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        join(operands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;

    fn parse(input: &str) -> Node {
        FilterParser::parse(input).unwrap()
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            parse("[jcr:content/jcr:title] == 'English'"),
            Ast::eq(Ast::property("jcr:content/jcr:title"), Ast::text("English"))
        );
        assert_eq!(parse("name = \"joe\""), Ast::eq(Ast::property("name"), Ast::text("joe")));
    }

    #[test]
    fn test_operator_spellings() {
        let cases = [
            ("a is 1", ComparisonOperator::Equal),
            ("a IS NOT 1", ComparisonOperator::NotEqual),
            ("a <> 1", ComparisonOperator::NotEqual),
            ("a less than 1", ComparisonOperator::Less),
            ("a <= 1", ComparisonOperator::LessEqual),
            ("a greater than 1", ComparisonOperator::Greater),
            ("a >= 1", ComparisonOperator::GreaterEqual),
            ("a like 1", ComparisonOperator::Like),
            ("a like not 1", ComparisonOperator::NotLike),
            ("a not like 1", ComparisonOperator::NotLike),
            ("a contains 1", ComparisonOperator::Contains),
            ("a contains not 1", ComparisonOperator::NotContains),
            ("a contains any 1", ComparisonOperator::ContainsAny),
            ("a contains not any 1", ComparisonOperator::NotContainsAny),
            ("a in 1", ComparisonOperator::In),
            ("a not in 1", ComparisonOperator::NotIn),
        ];
        for (input, operator) in cases {
            assert_eq!(
                parse(input),
                Ast::comparison(operator, Ast::property("a"), Ast::number("1")),
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_logical_chains_are_flattened() {
        let a = || Ast::eq(Ast::property("a"), Ast::number("1"));
        assert_eq!(parse("a = 1 and a = 1 && a = 1"), Ast::and(vec![a(), a(), a()]));
        assert_eq!(
            parse("a = 1 or a = 1 AND a = 1"),
            Ast::or(vec![a(), Ast::and(vec![a(), a()])])
        );
        assert_eq!(
            parse("(a = 1 || a = 1) and a = 1"),
            Ast::and(vec![Ast::or(vec![a(), a()]), a()])
        );
    }

    #[test]
    fn test_literals() {
        let right = |input: &str| match parse(input) {
            Node::Comparison { right, .. } => *right,
            other => panic!("not a comparison: {:?}", other),
        };
        assert_eq!(right("a = null"), Ast::null());
        assert_eq!(right("a = TRUE"), Ast::text("true"));
        assert_eq!(right("a = -1.5e3"), Ast::number("-1.5e3"));
        assert_eq!(right("a = 2020-01-01"), Ast::date("2020-01-01"));
        assert_eq!(right("a = 2020-01-01T10:15"), Ast::date_time("2020-01-01T10:15"));
        assert_eq!(
            right("a = 2020-01-01T10:15:30.250+02:00"),
            Ast::offset_date_time("2020-01-01T10:15:30.250+02:00")
        );
        assert_eq!(right("a = 2020-01-01T10:15Z"), Ast::offset_date_time("2020-01-01T10:15Z"));
        assert_eq!(right("a = $lang"), Ast::argument("lang"));
        assert_eq!(right("a = 'it\\'s\\u0021'"), Ast::text("it's!"));
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(
            parse("name() == 'x'"),
            Ast::eq(Ast::function("name", vec![]), Ast::text("x"))
        );
        assert_eq!(
            parse("[created] < date('2013-08-08', 'yyyy-MM-dd')"),
            Ast::comparison(
                ComparisonOperator::Less,
                Ast::property("created"),
                Ast::function(
                    "date",
                    vec![Ast::text("2013-08-08"), Ast::text("yyyy-MM-dd")]
                )
            )
        );
        assert_eq!(
            parse("f(1 'a' [b]) = 1"),
            Ast::eq(
                Ast::function("f", vec![Ast::number("1"), Ast::text("a"), Ast::property("b")]),
                Ast::number("1")
            )
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(FilterParser::parse("   "), Err(ParseError::Empty));
        assert_eq!(
            FilterParser::parse("a = 'open"),
            Err(ParseError::UnclosedString { column: 5 })
        );
        assert_eq!(
            FilterParser::parse("[a = 1"),
            Err(ParseError::UnclosedProperty { column: 1 })
        );
        assert_eq!(
            FilterParser::parse("a 1"),
            Err(ParseError::ExpectedOperator { column: 3 })
        );
        assert_eq!(
            FilterParser::parse("a = "),
            Err(ParseError::UnexpectedEnd { column: 5 })
        );
        assert_eq!(
            FilterParser::parse("a = 'x\\q'"),
            Err(ParseError::InvalidEscape { column: 7 })
        );
        assert_eq!(
            FilterParser::parse("a = 1 b"),
            Err(ParseError::UnexpectedToken {
                token: "b".to_string(),
                column: 7
            })
        );
        assert_eq!(
            FilterParser::parse("(a = 1"),
            Err(ParseError::UnexpectedEnd { column: 7 })
        );
        assert!(FilterParser::parse("'fish' in not [jcr:content/monkey]").is_err());
    }
}
