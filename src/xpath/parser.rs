//! Tokenizer and recursive descent parser for the supported XPath subset

use super::XPathError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Star,
    Eq,
    NotEq,
    Name(String),
    Literal(String),
    Number(f64),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Slash => "'/'".to_string(),
            Token::DoubleSlash => "'//'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::At => "'@'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::DotDot => "'..'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Eq => "'='".to_string(),
            Token::NotEq => "'!='".to_string(),
            Token::Name(n) => format!("name {:?}", n),
            Token::Literal(s) => format!("literal {:?}", s),
            Token::Number(n) => format!("number {}", n),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn tokenize(input: &str) -> Result<Vec<Token>, XPathError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '/' if next == Some('/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '.' if next == Some('.') => {
                tokens.push(Token::DotDot);
                i += 2;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '[' | ']' | '(' | ')' | '@' | ',' | '*' | '=' => {
                tokens.push(match c {
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '@' => Token::At,
                    ',' => Token::Comma,
                    '*' => Token::Star,
                    _ => Token::Eq,
                });
                i += 1;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|ch| *ch == c)
                    .ok_or(XPathError::UnterminatedLiteral(i))?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse()
                    .map_err(|_| XPathError::UnexpectedChar('.', i - 1))?;
                tokens.push(Token::Number(number));
            }
            c if is_name_start(c) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            c => return Err(XPathError::UnexpectedChar(c, i)),
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
}

impl CompareOp {
    pub(crate) fn holds<T: PartialEq + ?Sized>(self, a: &T, b: &T) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::NotEq => a != b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Contains,
    StartsWith,
    Last,
    Position,
    Not,
}

impl Function {
    fn lookup(name: &str) -> Option<(Self, usize)> {
        match name {
            "contains" => Some((Function::Contains, 2)),
            "starts-with" => Some((Function::StartsWith, 2)),
            "last" => Some((Function::Last, 0)),
            "position" => Some((Function::Position, 0)),
            "not" => Some((Function::Not, 1)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    DescendantOrSelf,
    SelfNode,
    Parent,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(String),
    /// `*`: any element, or any attribute on the attribute axis
    Any,
    Text,
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Path(LocationPath),
    Literal(String),
    Number(f64),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    Call(Function, Vec<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parses `input` into a location path. Expressions that do not select
/// nodes (a bare literal or comparison) are rejected.
pub(crate) fn parse(input: &str) -> Result<LocationPath, XPathError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    if parser.tokens.is_empty() {
        return Err(XPathError::Empty);
    }

    let path = parser.parse_path()?;
    match parser.peek() {
        None => Ok(path),
        Some(token) => Err(XPathError::UnexpectedToken(token.describe())),
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), XPathError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(XPathError::UnexpectedToken(token.describe())),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::Dot | Token::DotDot | Token::At)
        )
    }

    fn parse_path(&mut self) -> Result<LocationPath, XPathError> {
        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.advance();
                if !self.at_step_start() {
                    // A lone "/" selects the root
                    return Ok(LocationPath {
                        absolute: true,
                        steps,
                    });
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.advance();
                steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                true
            }
            _ => false,
        };

        steps.push(self.parse_step()?);
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.advance();
                }
                Some(Token::DoubleSlash) => {
                    self.advance();
                    steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                }
                _ => break,
            }
            steps.push(self.parse_step()?);
        }

        Ok(LocationPath { absolute, steps })
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        let mut step = match self.advance() {
            Some(Token::Dot) => return Ok(Step::new(Axis::SelfNode, NodeTest::Node)),
            Some(Token::DotDot) => return Ok(Step::new(Axis::Parent, NodeTest::Node)),
            Some(Token::At) => match self.advance() {
                Some(Token::Name(name)) => Step::new(Axis::Attribute, NodeTest::Name(name)),
                Some(Token::Star) => Step::new(Axis::Attribute, NodeTest::Any),
                Some(token) => return Err(XPathError::UnexpectedToken(token.describe())),
                None => return Err(XPathError::UnexpectedEnd),
            },
            Some(Token::Star) => Step::new(Axis::Child, NodeTest::Any),
            Some(Token::Name(name)) if self.peek() == Some(&Token::LParen) => {
                let test = match name.as_str() {
                    "text" => NodeTest::Text,
                    "node" => NodeTest::Node,
                    _ => return Err(XPathError::UnknownNodeTest(name)),
                };
                self.expect(Token::LParen)?;
                self.expect(Token::RParen)?;
                Step::new(Axis::Child, test)
            }
            Some(Token::Name(name)) => Step::new(Axis::Child, NodeTest::Name(name)),
            Some(token) => return Err(XPathError::UnexpectedToken(token.describe())),
            None => return Err(XPathError::UnexpectedEnd),
        };

        while self.peek() == Some(&Token::LBracket) {
            self.advance();
            step.predicates.push(self.parse_or()?);
            self.expect(Token::RBracket)?;
        }

        Ok(step)
    }

    fn parse_or(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Name(n)) if n == "or") {
            self.advance();
            left = Expr::Or(Box::new(left), Box::new(self.parse_and()?));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_comparison()?;
        while matches!(self.peek(), Some(Token::Name(n)) if n == "and") {
            self.advance();
            left = Expr::And(Box::new(left), Box::new(self.parse_comparison()?));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, XPathError> {
        let left = self.parse_primary()?;
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::NotEq,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_primary()?;
        Ok(Expr::Compare(Box::new(left), op, Box::new(right)))
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathError> {
        match self.peek() {
            Some(Token::Literal(_)) | Some(Token::Number(_)) => match self.advance() {
                Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
                Some(Token::Number(n)) => Ok(Expr::Number(n)),
                _ => Err(XPathError::UnexpectedEnd),
            },
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen) && name != "text" && name != "node" =>
            {
                let name = name.clone();
                self.parse_call(&name)
            }
            Some(Token::Slash | Token::DoubleSlash) => Ok(Expr::Path(self.parse_path()?)),
            _ if self.at_step_start() => Ok(Expr::Path(self.parse_path()?)),
            Some(token) => Err(XPathError::UnexpectedToken(token.describe())),
            None => Err(XPathError::UnexpectedEnd),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, XPathError> {
        let (function, arity) =
            Function::lookup(name).ok_or_else(|| XPathError::UnknownFunction(name.to_string()))?;
        self.advance();
        self.expect(Token::LParen)?;

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            args.push(self.parse_or()?);
            while self.peek() == Some(&Token::Comma) {
                self.advance();
                args.push(self.parse_or()?);
            }
        }
        self.expect(Token::RParen)?;

        if args.len() != arity {
            return Err(XPathError::ArgumentCount {
                function: name.to_string(),
                expected: arity,
                got: args.len(),
            });
        }
        Ok(Expr::Call(function, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn child(name: &str) -> Step {
        Step::new(Axis::Child, NodeTest::Name(name.to_string()))
    }

    #[test]
    fn tokenize_splits_operators_names_and_literals() {
        assert_eq!(
            tokenize(r#"//a[@href != "x"]/text()"#).unwrap(),
            vec![
                Token::DoubleSlash,
                Token::Name("a".to_string()),
                Token::LBracket,
                Token::At,
                Token::Name("href".to_string()),
                Token::NotEq,
                Token::Literal("x".to_string()),
                Token::RBracket,
                Token::Slash,
                Token::Name("text".to_string()),
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn parse_absolute_path() {
        assert_eq!(
            parse("/html/body/div").unwrap(),
            LocationPath {
                absolute: true,
                steps: vec![child("html"), child("body"), child("div")],
            }
        );
    }

    #[test]
    fn parse_expands_double_slash() {
        let path = parse("//span/..").unwrap();

        assert!(path.absolute);
        assert_eq!(
            path.steps,
            vec![
                Step::new(Axis::DescendantOrSelf, NodeTest::Node),
                child("span"),
                Step::new(Axis::Parent, NodeTest::Node),
            ]
        );
    }

    #[test]
    fn parse_predicates() {
        let path = parse("li[2][@class='x' and contains(., 'y')]").unwrap();

        assert!(!path.absolute);
        let predicates = &path.steps[0].predicates;
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[0], Expr::Number(2.0));
        assert!(matches!(predicates[1], Expr::And(_, _)));
    }

    #[test]
    fn parse_lone_slash_selects_root() {
        assert_eq!(
            parse("/").unwrap(),
            LocationPath {
                absolute: true,
                steps: Vec::new(),
            }
        );
    }

    #[rstest]
    #[case("", XPathError::Empty)]
    #[case("//a[", XPathError::UnexpectedEnd)]
    #[case("//a[@href='x]", XPathError::UnterminatedLiteral(10))]
    #[case("//a#b", XPathError::UnexpectedChar('#', 3))]
    #[case("//comment()", XPathError::UnknownNodeTest("comment".to_string()))]
    #[case("//a[count(b)]", XPathError::UnknownFunction("count".to_string()))]
    #[case("//a[last(1)]", XPathError::ArgumentCount { function: "last".to_string(), expected: 0, got: 1 })]
    #[case("'literal'", XPathError::UnexpectedToken("literal \"literal\"".to_string()))]
    #[case("//a]", XPathError::UnexpectedToken("']'".to_string()))]
    fn parse_rejects_invalid_expressions(#[case] input: &str, #[case] expected: XPathError) {
        assert_eq!(parse(input).unwrap_err(), expected);
    }
}
