use crate::ast::{Literal, MatchCase, Node, NodeKind, Pattern, TypeExpr};
use crate::diagnostic::Span;
use crate::types::Type;
use crate::value::{binary_op, Closure, Value};
use super::builtins::CallContext;
use super::concurrency::{self, WorkerPool};
use super::control_flow::ControlFlow;
use super::environment::Environment;
use super::error::RuntimeError;
use super::output::Output;
use std::cell::Cell;
use std::sync::Arc;
use tracing::trace;

/// Default limit on nested user-function calls.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Tree-walking evaluator. State lives in the environments passed in; the
/// interpreter itself only carries the output sink, the optional worker pool
/// and the call-depth counter.
#[derive(Debug)]
pub struct Interpreter {
    output: Output,
    pool: Option<Arc<WorkerPool>>,
    max_depth: usize,
    depth: Cell<usize>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Output::Stdout)
    }

    pub fn with_output(output: Output) -> Self {
        Self {
            output,
            pool: None,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: Cell::new(0),
        }
    }

    /// Spawned tasks go to `pool` instead of getting their own thread.
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// A fresh interpreter for a spawned task: same sink and pool, own call depth.
    fn fork(&self) -> Self {
        Self {
            output: self.output.clone(),
            pool: self.pool.clone(),
            max_depth: self.max_depth,
            depth: Cell::new(0),
        }
    }

    /// Runs top-level statements in `env` and returns the last value produced.
    /// A top-level `rudisha` ends the program with its value.
    pub fn interpret(&self, statements: &[Node], env: &Environment<Value>) -> Result<Value, RuntimeError> {
        tracing::debug!(statements = statements.len(), "interpreting program");
        self.execute_block(statements, env).map(ControlFlow::into_value)
    }

    pub fn execute_block(&self, statements: &[Node], env: &Environment<Value>) -> Result<ControlFlow, RuntimeError> {
        let mut last = Value::None;
        for statement in statements {
            match self.execute(statement, env)? {
                ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                ControlFlow::Value(value) => last = value,
            }
        }
        Ok(ControlFlow::Value(last))
    }

    pub fn evaluate(&self, node: &Node, env: &Environment<Value>) -> Result<Value, RuntimeError> {
        self.execute(node, env).map(ControlFlow::into_value)
    }

    fn execute(&self, node: &Node, env: &Environment<Value>) -> Result<ControlFlow, RuntimeError> {
        trace!(kind = node.kind.name(), at = %node.span, "evaluate");
        let value = match &node.kind {
            NodeKind::NumberLiteral { value, is_float } => Value::Number(*value, *is_float),
            NodeKind::StringLiteral(s) => Value::str(s),
            NodeKind::Variable(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::unknown_identifier_at(name, node.span))?,
            NodeKind::Assignment { name, annotation, value } => {
                let value = self.evaluate(value, env)?;
                self.bind(env, name, annotation.as_ref(), value.clone(), node.span)?;
                value
            }
            NodeKind::BinaryOp { op, left, right } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                binary_op(*op, &left, &right).map_err(|e| RuntimeError::operation_at(e.to_string(), node.span))?
            }
            NodeKind::FunctionDef(def) => {
                let closure = Value::Function(Arc::new(Closure {
                    def: def.clone(),
                    env: env.clone(),
                }));
                env.define(&def.name, closure.clone())
                    .map_err(|denied| RuntimeError::AccessViolation {
                        name: denied.name,
                        span: node.span,
                    })?;
                closure
            }
            NodeKind::FunctionCall { callee, args } => {
                let callee = self.evaluate(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call_value(&callee, args, node.span)?
            }
            NodeKind::IfBranch {
                condition,
                then_body,
                else_body,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    return self.execute_block(then_body, &env.child());
                }
                match else_body {
                    Some(body) => return self.execute_block(body, &env.child()),
                    None => Value::None,
                }
            }
            NodeKind::PatternMatch { subject, cases } => {
                let subject = self.evaluate(subject, env)?;
                return self.execute_match(&subject, cases, env, node.span);
            }
            NodeKind::SpawnBlock(body) => self.spawn(body, env),
            NodeKind::PrintStatement(value) => {
                let value = self.evaluate(value, env)?;
                self.output.write_line(&value.to_string());
                Value::None
            }
            NodeKind::Return(value) => {
                let value = match value {
                    Some(value) => self.evaluate(value, env)?,
                    None => Value::None,
                };
                return Ok(ControlFlow::Return(value));
            }
        };
        Ok(ControlFlow::Value(value))
    }

    /// Checked write: sandbox first, then the annotation, then the binding.
    fn bind(
        &self,
        env: &Environment<Value>,
        name: &str,
        annotation: Option<&TypeExpr>,
        value: Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        if env.is_restricted(name) {
            return Err(RuntimeError::AccessViolation {
                name: name.to_string(),
                span,
            });
        }
        if let Some(annotation) = annotation {
            let expected = resolve_annotation(annotation)?;
            let found = value.type_of();
            if !expected.compatible(&found) {
                return Err(RuntimeError::TypeMismatch {
                    name: name.to_string(),
                    expected,
                    found,
                    span,
                });
            }
        }
        env.define(name, value).map_err(|denied| RuntimeError::AccessViolation {
            name: denied.name,
            span,
        })
    }

    /// Calls a closure or builtin. Errors raised by the callee propagate unchanged.
    pub fn call_value(&self, callee: &Value, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(closure) => {
                let depth = self.depth.get();
                if depth >= self.max_depth {
                    return Err(RuntimeError::RecursionLimit {
                        limit: self.max_depth,
                        span,
                    });
                }
                self.depth.set(depth + 1);
                let result = self.call_closure(closure, args, span);
                self.depth.set(depth);
                result
            }
            Value::Builtin(builtin) => {
                trace!(builtin = builtin.name, args = args.len(), "calling builtin");
                (builtin.func)(&CallContext::new(self, span), &args)
            }
            other => Err(RuntimeError::NotCallable {
                found: other.type_name().to_string(),
                span,
            }),
        }
    }

    /// Parameters are bound in a child of the definition-time scope. Extra
    /// arguments are ignored; missing ones leave the parameter unbound.
    fn call_closure(&self, closure: &Closure, args: Vec<Value>, span: Span) -> Result<Value, RuntimeError> {
        let scope = closure.env.child();
        for (param, arg) in closure.def.params.iter().zip(args) {
            let at = if param.span.is_dummy() { span } else { param.span };
            self.bind(&scope, &param.name, param.annotation.as_ref(), arg, at)?;
        }
        self.execute_block(&closure.def.body, &scope)
            .map(ControlFlow::into_value)
    }

    fn execute_match(
        &self,
        subject: &Value,
        cases: &[MatchCase],
        env: &Environment<Value>,
        span: Span,
    ) -> Result<ControlFlow, RuntimeError> {
        for case in cases {
            let scope = env.child();
            if self.match_pattern(&case.pattern, subject, &scope, case.pattern_span)? {
                return self.execute_block(&case.body, &scope);
            }
        }
        Err(RuntimeError::NoMatchingPattern {
            value: subject.repr(),
            span,
        })
    }

    /// Tests one pattern, binding into `scope` when it introduces a name.
    fn match_pattern(
        &self,
        pattern: &Pattern,
        subject: &Value,
        scope: &Environment<Value>,
        span: Span,
    ) -> Result<bool, RuntimeError> {
        match pattern {
            Pattern::Wildcard => Ok(true),
            Pattern::Literal(literal) => Ok(literal_value(literal) == *subject),
            Pattern::Binding(name) => match scope.get(name) {
                Some(existing) => Ok(existing == *subject),
                None => {
                    self.bind(scope, name, None, subject.clone(), span)?;
                    Ok(true)
                }
            },
            Pattern::TypedBinding { name, annotation } => {
                let expected = resolve_annotation(annotation)?;
                if !expected.compatible(&subject.type_of()) {
                    return Ok(false);
                }
                self.bind(scope, name, None, subject.clone(), span)?;
                Ok(true)
            }
        }
    }

    /// Starts the body on the pool or a new thread, in a child of `env`.
    fn spawn(&self, body: &[Node], env: &Environment<Value>) -> Value {
        let body = body.to_vec();
        let scope = env.child();
        let interpreter = self.fork();
        let work = move || interpreter.execute_block(&body, &scope).map(ControlFlow::into_value);
        let task = match &self.pool {
            Some(pool) => concurrency::spawn_on(pool, work),
            None => concurrency::spawn(work),
        };
        Value::Task(task)
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number { value, is_float } => Value::Number(*value, *is_float),
        Literal::Str(s) => Value::str(s),
    }
}

fn resolve_annotation(annotation: &TypeExpr) -> Result<Type, RuntimeError> {
    Type::resolve(annotation).map_err(|unknown| RuntimeError::UnknownType {
        name: unknown.name,
        span: unknown.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{parse_and_run, RunOptions};
    use crate::interpreter::concurrency::TaskResult;

    fn run(source: &str) -> Result<Value, RuntimeError> {
        let options = RunOptions {
            output: Output::captured(),
            ..RunOptions::default()
        };
        match parse_and_run(source, &options) {
            Ok(value) => Ok(value),
            Err(crate::Error::Runtime(err)) => Err(err),
            Err(other) => panic!("unexpected front-end error: {}", other),
        }
    }

    // ===== BASICS =====

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("1 + 2 * 3").unwrap(), Value::int(7));
        assert_eq!(run("7 / 2").unwrap(), Value::int(3));
        assert_eq!(run("7.0 / 2").unwrap(), Value::float(3.5));
    }

    #[test]
    fn test_assignment_yields_value_and_binds() {
        assert_eq!(run("x = 4\nx * x").unwrap(), Value::int(16));
    }

    #[test]
    fn test_unknown_identifier() {
        let err = run("y + 1").unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownIdentifier { ref name, .. } if name == "y"));
        assert_eq!(err.span().start_line, 1);
    }

    #[test]
    fn test_operator_error_carries_location() {
        let err = run("x = 1\n\"a\" + x").unwrap_err();
        assert_eq!(err.to_string(), "cannot apply `+` to str and int");
        assert_eq!(err.span().start_line, 2);
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(run("1 / 0"), Err(RuntimeError::Operation { .. })));
    }

    // ===== FUNCTIONS =====

    #[test]
    fn test_closure_uses_definition_scope() {
        let source = "\
kazi tengeneza(n: int) -> any {
  kazi ongeza(x: int) -> int { x + n }
  ongeza
}
n = 100
f = tengeneza(5)
f(1)";
        assert_eq!(run(source).unwrap(), Value::int(6));
    }

    #[test]
    fn test_returned_closure_owns_its_call_scope() {
        let source = "\
kazi tengeneza(n: int) -> any {
  kazi ongeza(x: int) -> int { x + n }
  ongeza
}
tengeneza(5)";
        let Value::Function(closure) = run(source).unwrap() else {
            panic!("expected a closure");
        };
        // The call has returned; its scope lives on through the closure.
        assert_eq!(closure.env.get("n"), Some(Value::int(5)));
        assert!(matches!(closure.env.get("ongeza"), Some(Value::Function(_))));
    }

    #[test]
    fn test_extra_arguments_are_ignored() {
        let source = "kazi jumla(a: int, b: int) -> int { a + b }\njumla(1, 2, 3)";
        assert_eq!(run(source).unwrap(), Value::int(3));
    }

    #[test]
    fn test_missing_argument_surfaces_on_use() {
        let source = "kazi jumla(a: int, b: int) -> int { a + b }\njumla(1)";
        assert!(matches!(run(source), Err(RuntimeError::UnknownIdentifier { ref name, .. }) if name == "b"));
    }

    #[test]
    fn test_parameter_annotation_checked() {
        let source = "kazi mara(a: int) -> int { a * 2 }\nmara(\"x\")";
        assert!(matches!(run(source), Err(RuntimeError::TypeMismatch { ref name, .. }) if name == "a"));
    }

    #[test]
    fn test_recursion_and_return() {
        let source = "\
kazi fact(n: int) -> int {
  kama n < 2 { rudisha 1 }
  n * fact(n - 1)
}
fact(10)";
        assert_eq!(run(source).unwrap(), Value::int(3628800));
    }

    #[test]
    fn test_recursion_limit() {
        let tokens = crate::lexer::tokenize("kazi f(n: int) -> int { f(n + 1) }\nf(0)").unwrap();
        let nodes = crate::interpreter::parser::parse(&tokens).unwrap();
        let env = crate::interpreter::root_environment(&crate::interpreter::Builtins::standard(), None);
        let interpreter = Interpreter::with_output(Output::captured()).with_max_depth(16);
        let err = interpreter.interpret(&nodes, &env).unwrap_err();
        assert!(matches!(err, RuntimeError::RecursionLimit { limit: 16, .. }));
    }

    #[test]
    fn test_not_callable() {
        assert!(matches!(run("x = 1\nx(2)"), Err(RuntimeError::NotCallable { .. })));
    }

    #[test]
    fn test_top_level_return_ends_program() {
        assert_eq!(run("rudisha 5\n10").unwrap(), Value::int(5));
    }

    // ===== SCOPING =====

    #[test]
    fn test_if_branch_bindings_do_not_leak() {
        let err = run("kama 1 { ndani = 2 }\nndani").unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownIdentifier { ref name, .. } if name == "ndani"));
    }

    #[test]
    fn test_if_branch_value() {
        assert_eq!(run("kama 0 { 1 } vinginevyo { 2 }").unwrap(), Value::int(2));
        assert_eq!(run("kama 0 { 1 }").unwrap(), Value::None);
    }

    #[test]
    fn test_assignment_annotation() {
        assert_eq!(run("x: int = 3\nx").unwrap(), Value::int(3));
        let err = run("x: str = 3").unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: `x` expects str, found int");
        assert!(matches!(run("x: nambari_mbaya = 3"), Err(RuntimeError::UnknownType { .. })));
    }

    // ===== PATTERNS =====

    #[test]
    fn test_pattern_order() {
        let source = |n: i32| format!("lingana {} {{ 0 => \"sifuri\", _ => \"nyingine\" }}", n);
        assert_eq!(run(&source(0)).unwrap(), Value::str("sifuri"));
        assert_eq!(run(&source(5)).unwrap(), Value::str("nyingine"));
    }

    #[test]
    fn test_binding_patterns() {
        assert_eq!(run("lingana 4 { x => x * 2 }").unwrap(), Value::int(8));
        assert_eq!(run("y = 3\nlingana 4 { y => 1, _ => 2 }").unwrap(), Value::int(2));
        assert_eq!(
            run("lingana \"neno\" { n: int => 1, s: str => s }").unwrap(),
            Value::str("neno")
        );
        assert_eq!(run("lingana kweli { kweli => 1, _ => 0 }").unwrap(), Value::int(1));
    }

    #[test]
    fn test_case_bindings_do_not_leak() {
        let err = run("lingana 4 { x => x }\nx").unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownIdentifier { .. }));
    }

    #[test]
    fn test_no_matching_pattern() {
        let err = run("lingana 3 { 1 => 1, 2 => 2 }").unwrap_err();
        assert_eq!(err.to_string(), "no matching pattern for 3");
    }

    // ===== TASKS =====

    #[test]
    fn test_spawn_returns_task_and_captures_errors() {
        let value = run("t = anzisha { haipo }\nt").unwrap();
        let Value::Task(task) = value else {
            panic!("expected task");
        };
        let result = task.join(None).unwrap();
        assert!(matches!(result, TaskResult::Exception { error: RuntimeError::UnknownIdentifier { .. }, .. }));
    }

    #[test]
    fn test_spawned_bindings_stay_in_child_scope() {
        let source = "x = 1\nt = anzisha { x = 2\n x }\nsubiri(t) + x";
        assert_eq!(run(source).unwrap(), Value::int(3));
    }

    #[test]
    fn test_spawn_on_pool() {
        let pool = Arc::new(WorkerPool::new(2));
        let options = RunOptions {
            output: Output::captured(),
            pool: Some(Arc::clone(&pool)),
            ..RunOptions::default()
        };
        let value = parse_and_run("t = anzisha { 6 * 7 }\nsubiri(t)", &options).unwrap();
        assert_eq!(value, Value::int(42));
    }

    #[test]
    fn test_print_goes_to_captured_output() {
        let output = Output::captured();
        let options = RunOptions {
            output: output.clone(),
            ..RunOptions::default()
        };
        parse_and_run("chapisha 1.0\nchapisha orodha(1, \"a\")\nchapisha hakuna", &options).unwrap();
        assert_eq!(output.contents().unwrap(), "1.0\n[1, \"a\"]\nhakuna\n");
    }
}
