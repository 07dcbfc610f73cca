//! Layout-aware tokenizer.
//!
//! Source is processed line by line. Leading indentation drives an
//! indentation stack that emits INDENT/DEDENT markers; the rest of each
//! line is scanned by a chumsky lexeme parser and then classified.

use crate::diagnostic::{Diagnostic, Label, Span};
use crate::token::{Token, TokenKind};
use chumsky::prelude::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("tabs are not allowed for indentation")]
    TabIndentation { line: usize, column: usize },
    #[error("unterminated string literal")]
    UnterminatedString { line: usize, column: usize },
    #[error("unrecognized character `{ch}`")]
    UnexpectedChar { ch: char, line: usize, column: usize },
    #[error("dedent does not match any outer indentation level")]
    InconsistentDedent { line: usize, column: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            Self::TabIndentation { line, .. }
            | Self::UnterminatedString { line, .. }
            | Self::UnexpectedChar { line, .. }
            | Self::InconsistentDedent { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            Self::TabIndentation { column, .. }
            | Self::UnterminatedString { column, .. }
            | Self::UnexpectedChar { column, .. }
            | Self::InconsistentDedent { column, .. } => *column,
        }
    }

    pub fn span(&self) -> Span {
        Span::point(self.line(), self.column())
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, label, help) = match self {
            Self::TabIndentation { .. } => ("E0001", "tab used here", Some("indent with spaces")),
            Self::UnterminatedString { .. } => ("E0002", "string starts here", Some("close the string on the same line")),
            Self::UnexpectedChar { .. } => ("E0003", "not valid here", None),
            Self::InconsistentDedent { .. } => ("E0004", "indentation does not line up", None),
        };
        let diag = Diagnostic::error(self.to_string())
            .with_code(code)
            .with_label(Label::primary(self.span(), label));
        match help {
            Some(help) => diag.with_help(help),
            None => diag,
        }
    }
}

/// Raw lexeme produced by the per-line scanner, before keyword classification.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Symbol(TokenKind),
    Word,
    Number { is_float: bool },
    Str { terminated: bool },
    Comment,
    Unknown(char),
}

fn quoted<'a>(quote: char, stop: &'static str) -> impl Parser<'a, &'a str, Lexeme, extra::Err<Simple<'a, char>>> {
    let escaped = just('\\').then(any()).ignored();
    let plain = none_of(stop).ignored();

    just(quote)
        .ignore_then(escaped.or(plain).repeated())
        .ignore_then(just(quote).or_not())
        .map(|close| Lexeme::Str {
            terminated: close.is_some(),
        })
}

fn line_scanner<'a>() -> impl Parser<'a, &'a str, Vec<(Lexeme, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    let comment = just('#').then(any().repeated()).to(Lexeme::Comment);

    let number = text::digits(10)
        .then(just('.').then(text::digits(10).or_not()).or_not())
        .to_slice()
        .map(|s: &str| Lexeme::Number {
            is_float: s.contains('.'),
        });

    // Longest operators first so `==` never lexes as two `=`.
    let multi = choice((
        just("==").to(TokenKind::Eq),
        just("!=").to(TokenKind::NotEq),
        just("<=").to(TokenKind::LessEq),
        just(">=").to(TokenKind::GreaterEq),
        just("=>").to(TokenKind::FatArrow),
        just("->").to(TokenKind::Arrow),
        just("|>").to(TokenKind::PipeArrow),
    ));

    let single = choice((
        just('+').to(TokenKind::Plus),
        just('-').to(TokenKind::Minus),
        just('*').to(TokenKind::Star),
        just('/').to(TokenKind::Slash),
        just('=').to(TokenKind::Assign),
        just('<').to(TokenKind::Less),
        just('>').to(TokenKind::Greater),
        just('!').to(TokenKind::Bang),
        just('|').to(TokenKind::Bar),
        just('(').to(TokenKind::LParen),
        just(')').to(TokenKind::RParen),
        just('{').to(TokenKind::LBrace),
        just('}').to(TokenKind::RBrace),
        just('[').to(TokenKind::LBracket),
        just(']').to(TokenKind::RBracket),
        just(':').to(TokenKind::Colon),
        just(',').to(TokenKind::Comma),
    ));

    let word = text::ident().map(|_: &str| Lexeme::Word);
    let unknown = any().map(Lexeme::Unknown);

    let lexeme = choice((
        comment,
        quoted('"', "\\\""),
        quoted('\'', "\\'"),
        number,
        multi.map(Lexeme::Symbol),
        single.map(Lexeme::Symbol),
        word,
        unknown,
    ));

    lexeme
        .map_with(|lexeme, e| (lexeme, e.span()))
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

/// Splits a line into its leading indentation width and the remaining content.
/// A tab anywhere in the indentation is rejected.
fn split_indent(line: &str, line_no: usize) -> Result<(usize, &str), LexError> {
    let indent_bytes = line.len() - line.trim_start_matches([' ', '\t']).len();
    let indent = &line[..indent_bytes];
    if let Some(pos) = indent.find('\t') {
        return Err(LexError::TabIndentation {
            line: line_no,
            column: pos + 1,
        });
    }
    Ok((indent_bytes, &line[indent_bytes..]))
}

/// Turns source text into tokens, ending with trailing DEDENTs and one EOF.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let scanner = line_scanner();
    let mut tokens = Vec::new();
    let mut indents: Vec<usize> = vec![0];
    let mut eof_line = 1;
    let mut eof_col = 1;

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        eof_line = line_no;
        eof_col = line.chars().count() + 1;

        let (width, content) = split_indent(line, line_no)?;
        let lexemes = scanner.parse(content).into_result().map_err(|_| LexError::UnexpectedChar {
            ch: content.chars().next().unwrap_or(' '),
            line: line_no,
            column: width + 1,
        })?;

        // Blank and comment-only lines do not take part in layout.
        if lexemes.iter().all(|(lexeme, _)| *lexeme == Lexeme::Comment) {
            continue;
        }

        let top = indents.last().copied().unwrap_or(0);
        if width > top {
            indents.push(width);
            tokens.push(Token::new(TokenKind::Indent, "", line_no, width + 1));
        } else if width < top {
            while indents.last().is_some_and(|&level| width < level) {
                indents.pop();
                tokens.push(Token::new(TokenKind::Dedent, "", line_no, width + 1));
            }
            if indents.last().copied().unwrap_or(0) != width {
                return Err(LexError::InconsistentDedent {
                    line: line_no,
                    column: width + 1,
                });
            }
        }

        for (lexeme, span) in lexemes {
            let column = width + content[..span.start].chars().count() + 1;
            let text = &content[span.start..span.end];
            let kind = match lexeme {
                Lexeme::Comment => continue,
                Lexeme::Unknown(ch) => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        line: line_no,
                        column,
                    })
                }
                Lexeme::Str { terminated: false } => {
                    return Err(LexError::UnterminatedString { line: line_no, column })
                }
                Lexeme::Str { terminated: true } => TokenKind::Str,
                Lexeme::Number { is_float: true } => TokenKind::Float,
                Lexeme::Number { is_float: false } => TokenKind::Integer,
                Lexeme::Word => TokenKind::keyword(text).unwrap_or(TokenKind::Ident),
                Lexeme::Symbol(kind) => kind,
            };
            tokens.push(Token::new(kind, text, line_no, column));
        }
    }

    while indents.len() > 1 {
        indents.pop();
        tokens.push(Token::new(TokenKind::Dedent, "", eof_line, eof_col));
    }
    tokens.push(Token::new(TokenKind::Eof, "", eof_line, eof_col));

    tracing::debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}
