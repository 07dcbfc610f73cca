pub mod parser;
pub mod environment;
pub mod sandbox;
pub mod error;
pub mod control_flow;
pub mod output;
pub mod concurrency;
pub mod builtins;
pub mod evaluator;

pub use builtins::Builtins;
pub use concurrency::{TaskResult, WorkerPool};
pub use control_flow::ControlFlow;
pub use environment::Environment;
pub use error::RuntimeError;
pub use evaluator::{Interpreter, DEFAULT_MAX_DEPTH};
pub use output::Output;
pub use parser::{ParseError, ParseResult, TokenParser};
pub use sandbox::{DenyList, SandboxPolicy};

use crate::checker::TypeChecker;
use crate::diagnostic::Diagnostic;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Knobs for a single program run.
#[derive(Clone)]
pub struct RunOptions {
    /// Run the static pass first and refuse to execute on a type error.
    pub type_check: bool,
    pub policy: Option<Arc<dyn SandboxPolicy>>,
    pub output: Output,
    /// Spawned tasks run here when set; otherwise each gets its own thread.
    pub pool: Option<Arc<WorkerPool>>,
    pub max_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            type_check: false,
            policy: None,
            output: Output::Stdout,
            pool: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("type_check", &self.type_check)
            .field("sandboxed", &self.policy.is_some())
            .field("pool", &self.pool.as_ref().map(|p| p.size()))
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl RunOptions {
    fn interpreter(&self) -> Interpreter {
        let interpreter = Interpreter::with_output(self.output.clone()).with_max_depth(self.max_depth);
        match &self.pool {
            Some(pool) => interpreter.with_pool(Arc::clone(pool)),
            None => interpreter,
        }
    }
}

/// The global scope: every builtin bound, with `policy` guarding writes when given.
pub fn root_environment(builtins: &Builtins, policy: Option<Arc<dyn SandboxPolicy>>) -> Environment<Value> {
    let env = match policy {
        Some(policy) => Environment::with_policy(policy),
        None => Environment::new(),
    };
    builtins.install(&env);
    env
}

/// Tokenizes, parses, optionally type checks, then evaluates `source`.
pub fn parse_and_run(source: &str, options: &RunOptions) -> Result<Value, crate::Error> {
    let tokens = crate::lexer::tokenize(source)?;
    let statements = parser::parse(&tokens)?;

    let builtins = Builtins::standard();
    if options.type_check {
        let types = TypeChecker::with_builtins(&builtins).check(&statements)?;
        debug!(statements = types.len(), "type check passed");
    }

    let env = root_environment(&builtins, options.policy.clone());
    Ok(options.interpreter().interpret(&statements, &env)?)
}

/// Like [`parse_and_run`], but reports every recoverable parse error at once.
pub fn parse_and_run_with_diagnostics(source: &str, options: &RunOptions) -> Result<Value, Vec<Diagnostic>> {
    let tokens = crate::lexer::tokenize(source).map_err(|e| vec![e.to_diagnostic()])?;

    let mut parser = TokenParser::new(tokens);
    let parse_result = parser.parse_with_errors();
    if !parse_result.errors.is_empty() {
        return Err(parse_result.errors.iter().map(ParseError::to_diagnostic).collect());
    }

    let builtins = Builtins::standard();
    if options.type_check {
        TypeChecker::with_builtins(&builtins)
            .check(&parse_result.statements)
            .map_err(|e| vec![e.to_diagnostic()])?;
    }

    let env = root_environment(&builtins, options.policy.clone());
    options
        .interpreter()
        .interpret(&parse_result.statements, &env)
        .map_err(|e| vec![e.to_diagnostic()])
}
