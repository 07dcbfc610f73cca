pub mod ast;
pub mod checker;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod token;
pub mod types;
pub mod value;

pub use ast::{Node, NodeKind};
pub use checker::{TypeChecker, TypeError};
pub use error::Error;
pub use interpreter::{parse_and_run, RunOptions};
pub use lexer::{tokenize, LexError};
pub use token::{Token, TokenKind};
pub use types::Type;
pub use value::Value;
