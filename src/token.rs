use crate::diagnostic::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Keywords
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Print,
    Type,
    Match,
    Spawn,
    Mut,
    From,
    Where,
    Select,
    True,
    False,
    None,

    // Literals and identifiers
    Integer,
    Float,
    Str,
    Ident,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Less,
    Greater,
    Bang,
    Bar,
    Eq,
    NotEq,
    LessEq,
    GreaterEq,
    FatArrow,
    Arrow,
    PipeArrow,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,

    // Layout
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "kazi" => TokenKind::Function,
            "rudisha" => TokenKind::Return,
            "kama" => TokenKind::If,
            "vinginevyo" => TokenKind::Else,
            "kwa" => TokenKind::For,
            "wakati" => TokenKind::While,
            "chapisha" => TokenKind::Print,
            "aina" => TokenKind::Type,
            "lingana" => TokenKind::Match,
            "anzisha" => TokenKind::Spawn,
            "badili" => TokenKind::Mut,
            "kutoka" => TokenKind::From,
            "ambapo" => TokenKind::Where,
            "chagua" => TokenKind::Select,
            "kweli" => TokenKind::True,
            "sikweli" => TokenKind::False,
            "hakuna" => TokenKind::None,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Function
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Type
                | TokenKind::Match
                | TokenKind::Spawn
                | TokenKind::Mut
                | TokenKind::From
                | TokenKind::Where
                | TokenKind::Select
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
        )
    }

    pub fn is_layout(self) -> bool {
        matches!(self, TokenKind::Indent | TokenKind::Dedent)
    }

    /// Human readable description used in parse errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Function => "`kazi`",
            TokenKind::Return => "`rudisha`",
            TokenKind::If => "`kama`",
            TokenKind::Else => "`vinginevyo`",
            TokenKind::For => "`kwa`",
            TokenKind::While => "`wakati`",
            TokenKind::Print => "`chapisha`",
            TokenKind::Type => "`aina`",
            TokenKind::Match => "`lingana`",
            TokenKind::Spawn => "`anzisha`",
            TokenKind::Mut => "`badili`",
            TokenKind::From => "`kutoka`",
            TokenKind::Where => "`ambapo`",
            TokenKind::Select => "`chagua`",
            TokenKind::True => "`kweli`",
            TokenKind::False => "`sikweli`",
            TokenKind::None => "`hakuna`",
            TokenKind::Integer => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::Ident => "identifier",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Assign => "`=`",
            TokenKind::Less => "`<`",
            TokenKind::Greater => "`>`",
            TokenKind::Bang => "`!`",
            TokenKind::Bar => "`|`",
            TokenKind::Eq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::LessEq => "`<=`",
            TokenKind::GreaterEq => "`>=`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::Arrow => "`->`",
            TokenKind::PipeArrow => "`|>`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A classified lexeme. `text` is the exact source slice (string literals keep their quotes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    pub fn span(&self) -> Span {
        let width = self.text.chars().count().max(1);
        Span::new(self.line, self.column, self.line, self.column + width)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident | TokenKind::Integer | TokenKind::Float | TokenKind::Str => {
                write!(f, "{} `{}`", self.kind.describe(), self.text)
            }
            kind => f.write_str(kind.describe()),
        }
    }
}
