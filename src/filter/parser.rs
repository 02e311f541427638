use super::ast::{Comparator, FilterExpr, FilterValue, Group, LogicalOperator};
use crate::record::parse_instant;
use thiserror::Error;

pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

#[derive(Debug, Error, PartialEq)]
#[error("Parse error at position {pos}: {message}")]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn parse(mut self) -> Result<FilterExpr, ParseError> {
        let expr = self.parse_or()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error("Unexpected input after expression"));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<FilterExpr, ParseError> {
        let mut operands = vec![self.parse_and()?];
        loop {
            self.skip_whitespace();
            if !self.match_keyword("OR") {
                break;
            }
            operands.push(self.parse_and()?);
        }
        Ok(collapse(LogicalOperator::Or, operands))
    }

    fn parse_and(&mut self) -> Result<FilterExpr, ParseError> {
        let mut operands = vec![self.parse_primary()?];
        loop {
            self.skip_whitespace();
            if !self.match_keyword("AND") {
                break;
            }
            operands.push(self.parse_primary()?);
        }
        Ok(collapse(LogicalOperator::And, operands))
    }

    fn parse_primary(&mut self) -> Result<FilterExpr, ParseError> {
        self.skip_whitespace();

        if self.match_char('(') {
            let expr = self.parse_or()?;
            self.skip_whitespace();
            if !self.match_char(')') {
                return Err(self.error("Expected ')'"));
            }
            return Ok(expr);
        }

        let property = self.parse_identifier()?;
        self.skip_whitespace();

        let comparator = self.parse_comparator()?;
        if comparator.is_unary() {
            return Ok(FilterExpr::unary(property, comparator));
        }

        self.skip_whitespace();
        let value = self.parse_value()?;

        Ok(FilterExpr::condition(property, comparator, value))
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();

        if self.match_char('`') {
            let start = self.pos;
            while self.pos < self.input.len() && self.current_char() != '`' {
                self.pos += self.current_char().len_utf8();
            }
            let name = self.input[start..self.pos].to_string();
            if !self.match_char('`') {
                return Err(self.error("Unterminated property name"));
            }
            return Ok(name);
        }

        let start = self.pos;
        while self.pos < self.input.len() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '_' || c == '-' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(self.error("Expected property name"));
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_comparator(&mut self) -> Result<Comparator, ParseError> {
        self.skip_whitespace();

        if self.match_str(">=") {
            return Ok(Comparator::GreaterThanOrEqualTo);
        }
        if self.match_str("<=") {
            return Ok(Comparator::LessThanOrEqualTo);
        }
        if self.match_str("!=") {
            return Ok(Comparator::NotEquals);
        }
        if self.match_char('=') {
            return Ok(Comparator::Equals);
        }
        if self.match_char('>') {
            return Ok(Comparator::GreaterThan);
        }
        if self.match_char('<') {
            return Ok(Comparator::LessThan);
        }

        let start = self.pos;
        while self.pos < self.input.len() {
            let c = self.current_char();
            if c.is_ascii_alphabetic() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(
                self.error("Expected comparator (=, !=, >, <, >=, <= or a comparator name)")
            );
        }

        Ok(Comparator::parse(&self.input[start..self.pos]))
    }

    fn parse_value(&mut self) -> Result<FilterValue, ParseError> {
        self.skip_whitespace();

        if self.match_char('"') {
            return self.parse_string().map(FilterValue::Text);
        }

        if self.match_char('[') {
            return self.parse_list();
        }

        if self.match_keyword("true") {
            return Ok(FilterValue::Bool(true));
        }
        if self.match_keyword("false") {
            return Ok(FilterValue::Bool(false));
        }

        self.parse_number_or_date()
    }

    // Opening quote already consumed. A backslash takes the next character
    // literally, so `\"` and `\\` embed a quote and a backslash.
    fn parse_string(&mut self) -> Result<String, ParseError> {
        let mut s = String::new();
        while self.pos < self.input.len() {
            let c = self.current_char();
            self.pos += c.len_utf8();
            match c {
                '"' => return Ok(s),
                '\\' if self.pos < self.input.len() => {
                    let escaped = self.current_char();
                    self.pos += escaped.len_utf8();
                    s.push(escaped);
                }
                _ => s.push(c),
            }
        }
        Err(self.error("Unterminated string"))
    }

    fn parse_list(&mut self) -> Result<FilterValue, ParseError> {
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.match_char(']') {
            return Ok(FilterValue::List(items));
        }

        loop {
            self.skip_whitespace();
            if !self.match_char('"') {
                return Err(self.error("Expected string in list"));
            }
            items.push(self.parse_string()?);
            self.skip_whitespace();
            if self.match_char(']') {
                return Ok(FilterValue::List(items));
            }
            if !self.match_char(',') {
                return Err(self.error("Expected ',' or ']'"));
            }
        }
    }

    fn parse_number_or_date(&mut self) -> Result<FilterValue, ParseError> {
        let start = self.pos;

        while self.pos < self.input.len() {
            let c = self.current_char();
            if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | ':' | 'T' | 'Z') {
                self.pos += 1;
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(self.error("Expected value"));
        }

        let text = &self.input[start..self.pos];

        if let Ok(n) = text.parse::<f64>() {
            return Ok(FilterValue::Number(n));
        }

        parse_instant(text)
            .map(FilterValue::Date)
            .ok_or_else(|| self.error("Invalid number or date"))
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.current_char().is_whitespace() {
            self.pos += self.current_char().len_utf8();
        }
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.pos < self.input.len() && self.current_char() == c {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn match_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, kw: &str) -> bool {
        let remaining = &self.input[self.pos..];
        if remaining.len() < kw.len() || !remaining.is_char_boundary(kw.len()) {
            return false;
        }
        if !remaining[..kw.len()].eq_ignore_ascii_case(kw) {
            return false;
        }
        let after = remaining[kw.len()..].chars().next();
        if after.map_or(true, |c| !c.is_alphanumeric() && c != '_') {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            pos: self.pos,
        }
    }
}

// A single operand stays as is; nested groups of the same operator flatten.
fn collapse(operator: LogicalOperator, operands: Vec<FilterExpr>) -> FilterExpr {
    if operands.len() == 1 {
        return operands.into_iter().next().unwrap_or_default();
    }

    let mut filters = Vec::with_capacity(operands.len());
    for operand in operands {
        match operand {
            FilterExpr::Group(group) if group.operator == operator => filters.extend(group.filters),
            other => filters.push(other),
        }
    }
    FilterExpr::Group(Group { operator, filters })
}

pub fn parse(input: &str) -> Result<FilterExpr, ParseError> {
    Parser::new(input).parse()
}
