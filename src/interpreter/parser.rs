use crate::ast::{BinaryOp, FunctionDef, Literal, MatchCase, Node, NodeKind, Param, Pattern, TypeExpr};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::token::{Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut msg = self.message.clone();
        if !self.expected.is_empty() {
            msg = format!("expected {}", self.expected.join(" or "));
            if let Some(found) = &self.found {
                msg.push_str(&format!(", found {}", found));
            }
        }

        let mut diag = Diagnostic::error(msg)
            .with_code("E0101")
            .with_label(Label::primary(self.span, ""));

        if self.expected.len() == 1 {
            diag = diag.with_help(format!("expected {} here", self.expected[0]));
        }

        diag
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expected.is_empty() {
            write!(f, "{} at {}", self.message, self.span)
        } else {
            write!(f, "expected {}", self.expected.join(" or "))?;
            if let Some(found) = &self.found {
                write!(f, ", found {}", found)?;
            }
            write!(f, " at {}", self.span)
        }
    }
}

impl std::error::Error for ParseError {}

pub struct ParseResult {
    pub statements: Vec<Node>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses a token stream into statements, failing on the first error.
pub fn parse(tokens: &[Token]) -> Result<Vec<Node>, ParseError> {
    TokenParser::new(tokens.to_vec()).parse()
}

pub struct TokenParser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

impl TokenParser {
    /// Layout tokens are dropped here; braces delimit blocks.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.kind.is_layout()).collect();
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + t.text.chars().count()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    fn current_token(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.current.min(last)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.current + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.current_token().span()
    }

    fn previous_span(&self) -> Span {
        if self.current > 0 {
            self.tokens[self.current - 1].span()
        } else {
            self.current_span()
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn unexpected(&self, expected: &[&str]) -> ParseError {
        let found = self.current_token().to_string();
        let message = if self.is_at_end() {
            "unexpected end of input"
        } else {
            "unexpected token"
        };
        ParseError::new(message, self.current_span())
            .with_expected(expected.iter().map(|e| e.to_string()).collect())
            .with_found(found)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[expected.describe()]))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        if self.check(TokenKind::Ident) {
            let token = self.advance();
            Ok((token.text.clone(), token.span()))
        } else {
            Err(self.unexpected(&[what]))
        }
    }

    fn add_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Skips to a plausible statement start: a statement keyword, a closing
    /// brace, or the first token on a later line.
    fn synchronize(&mut self) {
        let line = self.current_token().line;
        self.advance();
        while !self.is_at_end() {
            let token = self.current_token();
            match token.kind {
                TokenKind::Function
                | TokenKind::Print
                | TokenKind::Match
                | TokenKind::If
                | TokenKind::Return
                | TokenKind::RBrace => return,
                _ if token.line > line => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parses the whole stream. No partial result is returned on failure.
    pub fn parse(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Like `parse`, but keeps going after an error to report up to ten of them.
    pub fn parse_with_errors(&mut self) -> ParseResult {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.add_error(err);
                    self.synchronize();
                    if self.errors.len() >= 10 {
                        break;
                    }
                }
            }
        }
        ParseResult {
            statements,
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match self.peek_kind() {
            TokenKind::Function => self.parse_function(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Match => self.parse_match(),
            TokenKind::If => self.parse_if(),
            TokenKind::Return => self.parse_return(),
            TokenKind::For
            | TokenKind::While
            | TokenKind::Type
            | TokenKind::Mut
            | TokenKind::From
            | TokenKind::Where
            | TokenKind::Select => {
                let token = self.current_token();
                Err(ParseError::new(
                    format!("`{}` is reserved and cannot start a statement", token.text),
                    token.span(),
                ))
            }
            TokenKind::Ident
                if matches!(self.peek_kind_at(1), TokenKind::Assign | TokenKind::Colon) =>
            {
                self.parse_assignment()
            }
            _ => self.parse_expression(),
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Node>, ParseError> {
        if self.eat(TokenKind::LBrace).is_none() {
            return Ok(vec![self.parse_statement()?]);
        }
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    fn parse_function(&mut self) -> Result<Node, ParseError> {
        let start = self.expect(TokenKind::Function)?.span();
        let (name, _) = self.expect_ident("function name")?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            let (param_name, param_span) = self.expect_ident("parameter name")?;
            self.expect(TokenKind::Colon)?;
            let annotation = self.parse_type()?;
            params.push(Param {
                name: param_name,
                span: param_span.merge(annotation.span()),
                annotation: Some(annotation),
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let return_type = if self.eat(TokenKind::Arrow).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(self.previous_span());

        Ok(Node::new(
            NodeKind::FunctionDef(FunctionDef {
                name,
                params,
                return_type,
                body,
            }),
            span,
        ))
    }

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        let token = match self.peek_kind() {
            TokenKind::Ident | TokenKind::None => self.advance(),
            _ => return Err(self.unexpected(&["type name"])),
        };
        if self.eat(TokenKind::LBracket).is_some() {
            let arg = self.parse_type()?;
            let end = self.expect(TokenKind::RBracket)?.span();
            return Ok(TypeExpr::Generic {
                name: token.text.clone(),
                arg: Box::new(arg),
                span: token.span().merge(end),
            });
        }
        Ok(TypeExpr::Named {
            name: token.text.clone(),
            span: token.span(),
        })
    }

    /// `chapisha expr`. A parenthesised list of zero or several arguments is a
    /// call to the `chapisha` builtin instead.
    fn parse_print(&mut self) -> Result<Node, ParseError> {
        let keyword = self.expect(TokenKind::Print)?;
        let start = keyword.span();

        if self.check(TokenKind::LParen) {
            let paren_start = self.current_span();
            let mut args = self.parse_call_args()?;
            let span = start.merge(self.previous_span());
            if args.len() == 1 {
                if let Some(mut first) = args.pop() {
                    // `chapisha (a) * b` prints the whole expression.
                    first.span = paren_start.merge(self.previous_span());
                    let left = self.parse_binary_rest(first, 1)?;
                    let value = self.parse_pipe_rest(left)?;
                    let span = start.merge(value.span);
                    return Ok(Node::new(NodeKind::PrintStatement(Box::new(value)), span));
                }
            }
            let callee = Node::new(NodeKind::Variable(keyword.text), start);
            return Ok(Node::new(
                NodeKind::FunctionCall {
                    callee: Box::new(callee),
                    args,
                },
                span,
            ));
        }

        let value = self.parse_expression()?;
        let span = start.merge(value.span);
        Ok(Node::new(NodeKind::PrintStatement(Box::new(value)), span))
    }

    fn parse_match(&mut self) -> Result<Node, ParseError> {
        let start = self.expect(TokenKind::Match)?.span();
        let subject = self.parse_expression()?;
        self.expect(TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let pattern_start = self.current_span();
            let pattern = self.parse_pattern()?;
            let pattern_span = pattern_start.merge(self.previous_span());
            self.expect(TokenKind::FatArrow)?;
            let body = self.parse_block()?;
            cases.push(MatchCase {
                pattern,
                pattern_span,
                body,
            });
            self.eat(TokenKind::Comma);
        }

        let end = self.expect(TokenKind::RBrace)?.span();
        Ok(Node::new(
            NodeKind::PatternMatch {
                subject: Box::new(subject),
                cases,
            },
            start.merge(end),
        ))
    }

    fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        match self.peek_kind() {
            TokenKind::Integer | TokenKind::Float => {
                let token = self.advance();
                let value = Self::number_value(&token)?;
                Ok(Pattern::Literal(Literal::Number {
                    value,
                    is_float: token.kind == TokenKind::Float,
                }))
            }
            TokenKind::Str => {
                let token = self.advance();
                Ok(Pattern::Literal(Literal::Str(unescape(&token.text))))
            }
            TokenKind::Ident if self.current_token().text == "_" => {
                self.advance();
                Ok(Pattern::Wildcard)
            }
            TokenKind::Ident => {
                let (name, _) = self.expect_ident("pattern")?;
                if self.eat(TokenKind::Colon).is_some() {
                    let annotation = self.parse_type()?;
                    return Ok(Pattern::TypedBinding { name, annotation });
                }
                Ok(Pattern::Binding(name))
            }
            // Constants resolve in scope, so they compare by equality.
            TokenKind::True | TokenKind::False | TokenKind::None => {
                Ok(Pattern::Binding(self.advance().text))
            }
            _ => Err(self.unexpected(&["pattern"])),
        }
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        let start = self.expect(TokenKind::If)?.span();
        let condition = self.parse_expression()?;
        let then_body = self.parse_block()?;
        let else_body = if self.eat(TokenKind::Else).is_some() {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::IfBranch {
                condition: Box::new(condition),
                then_body,
                else_body,
            },
            start.merge(self.previous_span()),
        ))
    }

    /// `rudisha` takes no value before `}`, end of input, or a line break.
    fn parse_return(&mut self) -> Result<Node, ParseError> {
        let keyword = self.expect(TokenKind::Return)?;
        let ends_here = matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof)
            || self.current_token().line > keyword.line;
        if ends_here {
            return Ok(Node::new(NodeKind::Return(None), keyword.span()));
        }
        let value = self.parse_expression()?;
        let span = keyword.span().merge(value.span);
        Ok(Node::new(NodeKind::Return(Some(Box::new(value))), span))
    }

    fn parse_assignment(&mut self) -> Result<Node, ParseError> {
        let (name, start) = self.expect_ident("identifier")?;
        let annotation = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        let span = start.merge(value.span);
        Ok(Node::new(
            NodeKind::Assignment {
                name,
                annotation,
                value: Box::new(value),
            },
            span,
        ))
    }

    /// `binary ('|>' IDENT args?)*`; `a |> f(b)` becomes `f(a, b)`.
    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_binary_expr(1)?;
        self.parse_pipe_rest(left)
    }

    fn parse_pipe_rest(&mut self, mut left: Node) -> Result<Node, ParseError> {
        while self.eat(TokenKind::PipeArrow).is_some() {
            let callee = match self.peek_kind() {
                TokenKind::Ident | TokenKind::Print => self.advance(),
                _ => return Err(self.unexpected(&["function name"])),
            };
            let mut args = vec![left];
            if self.check(TokenKind::LParen) {
                args.extend(self.parse_call_args()?);
            }
            let span = args[0].span.merge(self.previous_span());
            let callee = Node::new(NodeKind::Variable(callee.text.clone()), callee.span());
            left = Node::new(
                NodeKind::FunctionCall {
                    callee: Box::new(callee),
                    args,
                },
                span,
            );
        }
        Ok(left)
    }

    fn binary_operator(kind: TokenKind) -> Option<(u8, BinaryOp)> {
        match kind {
            TokenKind::Eq => Some((1, BinaryOp::Eq)),
            TokenKind::NotEq => Some((1, BinaryOp::NotEq)),
            TokenKind::Less => Some((1, BinaryOp::Less)),
            TokenKind::Greater => Some((1, BinaryOp::Greater)),
            TokenKind::LessEq => Some((1, BinaryOp::LessEq)),
            TokenKind::GreaterEq => Some((1, BinaryOp::GreaterEq)),
            TokenKind::Plus => Some((2, BinaryOp::Add)),
            TokenKind::Minus => Some((2, BinaryOp::Sub)),
            TokenKind::Star => Some((3, BinaryOp::Mul)),
            TokenKind::Slash => Some((3, BinaryOp::Div)),
            _ => None,
        }
    }

    fn parse_binary_expr(&mut self, min_precedence: u8) -> Result<Node, ParseError> {
        let left = self.parse_primary()?;
        self.parse_binary_rest(left, min_precedence)
    }

    /// Continues a binary expression whose left operand is already parsed.
    fn parse_binary_rest(&mut self, mut left: Node, min_precedence: u8) -> Result<Node, ParseError> {
        while let Some((precedence, op)) = Self::binary_operator(self.peek_kind()) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary_expr(precedence + 1)?;
            let span = left.span.merge(right.span);
            left = Node::new(
                NodeKind::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Node>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn number_value(token: &Token) -> Result<f64, ParseError> {
        token
            .text
            .parse::<f64>()
            .map_err(|_| ParseError::new(format!("invalid number `{}`", token.text), token.span()))
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::Integer | TokenKind::Float => {
                let token = self.advance();
                let value = Self::number_value(&token)?;
                Ok(Node::new(
                    NodeKind::NumberLiteral {
                        value,
                        is_float: token.kind == TokenKind::Float,
                    },
                    span,
                ))
            }
            TokenKind::Str => {
                let token = self.advance();
                Ok(Node::new(NodeKind::StringLiteral(unescape(&token.text)), span))
            }
            TokenKind::True | TokenKind::False | TokenKind::None => {
                let token = self.advance();
                Ok(Node::new(NodeKind::Variable(token.text), span))
            }
            TokenKind::Ident | TokenKind::Print => {
                let token = self.advance();
                let variable = Node::new(NodeKind::Variable(token.text), span);
                if !self.check(TokenKind::LParen) {
                    return Ok(variable);
                }
                let args = self.parse_call_args()?;
                Ok(Node::new(
                    NodeKind::FunctionCall {
                        callee: Box::new(variable),
                        args,
                    },
                    span.merge(self.previous_span()),
                ))
            }
            TokenKind::Spawn => {
                self.advance();
                let body = self.parse_block()?;
                Ok(Node::new(NodeKind::SpawnBlock(body), span.merge(self.previous_span())))
            }
            TokenKind::LParen => {
                self.advance();
                let mut inner = self.parse_expression()?;
                let end = self.expect(TokenKind::RParen)?.span();
                inner.span = span.merge(end);
                Ok(inner)
            }
            _ => Err(self.unexpected(&["expression"])),
        }
    }
}

/// Strips the quotes from a string token and decodes its escapes.
fn unescape(raw: &str) -> String {
    let mut chars = raw.chars();
    chars.next();
    chars.next_back();

    let mut out = String::with_capacity(raw.len());
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
