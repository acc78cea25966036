use crate::expr::ast::{Axis, NodeTest, Predicate, Program, Step};
use crate::expr::errors::ParseError;

/// Compile a path expression into a step program.
///
/// ```text
/// expr      := ( '/' | '//' ) step ( ( '/' | '//' ) step )*
/// step      := ( name '(' ')' | '*' | name ) predicate*
/// predicate := '[' '@' name '=' literal ']' | '[' name ']' | '[' integer ']'
/// ```
pub fn compile(expression: &str) -> Result<Program, ParseError> {
    let mut cursor = Cursor::new(expression);
    cursor.skip_whitespace();
    if cursor.at_end() {
        return Err(cursor.error("empty expression"));
    }

    let mut steps = Vec::new();
    loop {
        cursor.skip_whitespace();
        if cursor.at_end() {
            break;
        }

        let axis = match (cursor.peek(), cursor.peek_at(1)) {
            (Some('/'), Some('/')) => {
                cursor.advance(2);
                Axis::DescendantOrSelf
            }
            (Some('/'), _) => {
                cursor.advance(1);
                Axis::Child
            }
            (Some(']'), _) => return Err(cursor.error("unbalanced brackets: unexpected ']'")),
            (Some(')'), _) => {
                return Err(cursor.error("unbalanced parentheses: unexpected ')'"))
            }
            (Some(ch), _) if steps.is_empty() => {
                return Err(cursor.error(format!("expression must start with '/', found '{ch}'")))
            }
            (Some(ch), _) => return Err(cursor.error(format!("unexpected character '{ch}'"))),
            (None, _) => break,
        };

        if matches!(cursor.peek(), None | Some('/')) || cursor.peek().is_some_and(char::is_whitespace)
        {
            return Err(cursor.error("empty step"));
        }

        let test = parse_node_test(&mut cursor)?;
        let predicates = parse_predicates(&mut cursor)?;
        steps.push(Step {
            axis,
            test,
            predicates,
        });
    }

    Ok(Program::new(expression, steps))
}

fn parse_node_test(cursor: &mut Cursor<'_>) -> Result<NodeTest, ParseError> {
    if cursor.eat('*') {
        return Ok(NodeTest::Any);
    }

    let name = cursor.name().ok_or_else(|| match cursor.peek() {
        Some('[') => cursor.error("empty step: predicate without a node test"),
        Some(ch) => cursor.error(format!("expected a type, name or '*', found '{ch}'")),
        None => cursor.error("empty step"),
    })?;

    if cursor.eat('(') {
        if !cursor.eat(')') {
            return Err(cursor.error("unbalanced parentheses: expected ')'"));
        }
        return Ok(NodeTest::Type(name));
    }
    Ok(NodeTest::Name(name))
}

fn parse_predicates(cursor: &mut Cursor<'_>) -> Result<Vec<Predicate>, ParseError> {
    let mut predicates = Vec::new();

    while cursor.eat('[') {
        cursor.skip_whitespace();
        let predicate = match cursor.peek() {
            Some('@') => {
                cursor.advance(1);
                let name = cursor
                    .name()
                    .ok_or_else(|| cursor.error("expected attribute name after '@'"))?;
                cursor.skip_whitespace();
                if !cursor.eat('=') {
                    return Err(cursor.error("expected '=' in attribute test"));
                }
                cursor.skip_whitespace();
                let value = cursor.string_literal()?;
                Predicate::Attribute { name, value }
            }
            Some(ch) if ch.is_ascii_digit() => {
                let start = cursor.position();
                let position = cursor.integer();
                if position == Some(0) {
                    return Err(ParseError::new(
                        cursor.input,
                        start,
                        "positions are 1-based",
                    ));
                }
                let position = position.ok_or_else(|| cursor.error("position out of range"))?;
                Predicate::Position(position)
            }
            Some(_) => {
                let name = cursor
                    .name()
                    .ok_or_else(|| cursor.error("expected '@', a name or a position in predicate"))?;
                Predicate::HasChild(name)
            }
            None => return Err(cursor.error("unbalanced brackets: expected ']'")),
        };

        cursor.skip_whitespace();
        if !cursor.eat(']') {
            return Err(cursor.error("unbalanced brackets: expected ']'"));
        }
        predicates.push(predicate);
    }

    Ok(predicates)
}

struct Cursor<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn name(&mut self) -> Option<String> {
        let first = self.peek()?;
        if !(first.is_alphabetic() || first == '_') {
            return None;
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn integer(&mut self) -> Option<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .ok()
    }

    fn string_literal(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted string literal")),
        };
        self.pos += 1;

        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        self.input,
                        start,
                        "unterminated string literal",
                    ))
                }
                Some(ch) if ch == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(escaped) => {
                            value.push(escaped);
                            self.pos += 1;
                        }
                        None => {
                            return Err(ParseError::new(
                                self.input,
                                start,
                                "unterminated string literal",
                            ))
                        }
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.pos += 1;
                }
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.input, self.pos, message)
    }
}
