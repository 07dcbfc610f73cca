//! Static type pass over the AST.
//!
//! The checker walks the tree once with its own `Environment<Type>`; it never
//! touches runtime values. Node kinds without a rule are rejected rather than
//! passed through.

mod error;

pub use error::TypeError;

use crate::ast::{FunctionDef, Literal, MatchCase, Node, NodeKind, Pattern, TypeExpr};
use crate::diagnostic::Span;
use crate::interpreter::{Builtins, Environment};
use crate::types::Type;
use tracing::{debug, trace};

pub struct TypeChecker {
    env: Environment<Type>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    /// A checker that knows only the three constants.
    pub fn new() -> Self {
        let env = Environment::new();
        env.set("kweli", Type::int());
        env.set("sikweli", Type::int());
        env.set("hakuna", Type::none());
        Self { env }
    }

    /// A checker that also knows the signature of every builtin in `builtins`.
    pub fn with_builtins(builtins: &Builtins) -> Self {
        let checker = Self::new();
        builtins.install_types(&checker.env);
        checker
    }

    /// Checks each top-level statement in order, returning one type per statement.
    pub fn check(&mut self, ast: &[Node]) -> Result<Vec<Type>, TypeError> {
        debug!(statements = ast.len(), "type checking");
        ast.iter().map(|node| self.check_node(node, &self.env)).collect()
    }

    fn check_node(&self, node: &Node, env: &Environment<Type>) -> Result<Type, TypeError> {
        trace!(kind = node.kind.name(), "check");
        match &node.kind {
            NodeKind::NumberLiteral { is_float: true, .. } => Ok(Type::float()),
            NodeKind::NumberLiteral { is_float: false, .. } => Ok(Type::int()),
            NodeKind::StringLiteral(_) => Ok(Type::str()),
            NodeKind::Variable(name) => env.get(name).ok_or_else(|| TypeError::UndefinedIdentifier {
                name: name.clone(),
                span: node.span,
            }),
            NodeKind::Assignment { name, annotation, value } => {
                let found = self.check_node(value, env)?;
                let bound = match annotation {
                    Some(annotation) => {
                        let expected = resolve(annotation)?;
                        if !expected.compatible(&found) {
                            return Err(TypeError::AnnotationMismatch {
                                name: name.clone(),
                                expected,
                                found,
                                span: node.span,
                            });
                        }
                        expected
                    }
                    None => found,
                };
                env.set(name.as_str(), bound.clone());
                Ok(bound)
            }
            NodeKind::BinaryOp { op, left, right } => {
                let left = self.check_node(left, env)?;
                let right = self.check_node(right, env)?;
                let incompatible = || TypeError::IncompatibleOperands {
                    op: *op,
                    left: left.clone(),
                    right: right.clone(),
                    span: node.span,
                };
                if op.is_arithmetic() {
                    if !left.is_numeric() || !right.is_numeric() {
                        return Err(incompatible());
                    }
                    Ok(Type::promote(&left, &right))
                } else {
                    if !left.compatible(&right) {
                        return Err(incompatible());
                    }
                    Ok(Type::int())
                }
            }
            NodeKind::FunctionDef(def) => self.check_function(def, env, node.span),
            NodeKind::FunctionCall { callee, args } => {
                let callee_type = self.check_node(callee, env)?;
                match callee_type {
                    Type::Function { params, ret } => {
                        if params.len() != args.len() {
                            return Err(TypeError::ArityMismatch {
                                expected: params.len(),
                                found: args.len(),
                                span: node.span,
                            });
                        }
                        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
                            let found = self.check_node(arg, env)?;
                            if !param.compatible(&found) {
                                return Err(TypeError::ArgumentMismatch {
                                    index: index + 1,
                                    expected: param.clone(),
                                    found,
                                    span: arg.span,
                                });
                            }
                        }
                        Ok(*ret)
                    }
                    callee_type if callee_type.is_any() => {
                        for arg in args {
                            self.check_node(arg, env)?;
                        }
                        Ok(Type::any())
                    }
                    found => Err(TypeError::NotCallable { found, span: node.span }),
                }
            }
            NodeKind::PatternMatch { subject, cases } => {
                let subject = self.check_node(subject, env)?;
                self.check_match(&subject, cases, env)
            }
            NodeKind::SpawnBlock(body) => {
                self.check_body(body, &env.child())?;
                Ok(Type::task())
            }
            NodeKind::PrintStatement(value) => {
                self.check_node(value, env)?;
                Ok(Type::none())
            }
            NodeKind::Return(value) => match value {
                Some(value) => self.check_node(value, env),
                None => Ok(Type::none()),
            },
            NodeKind::IfBranch { .. } => Err(TypeError::NoRule {
                kind: node.kind.name(),
                span: node.span,
            }),
        }
    }

    /// The type of the last statement, or `none` for an empty body.
    fn check_body(&self, body: &[Node], env: &Environment<Type>) -> Result<Type, TypeError> {
        let mut last = Type::none();
        for statement in body {
            last = self.check_node(statement, env)?;
        }
        Ok(last)
    }

    fn check_function(&self, def: &FunctionDef, env: &Environment<Type>, span: Span) -> Result<Type, TypeError> {
        let params = def
            .params
            .iter()
            .map(|p| p.annotation.as_ref().map(resolve).unwrap_or_else(|| Ok(Type::any())))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = def
            .return_type
            .as_ref()
            .map(resolve)
            .unwrap_or_else(|| Ok(Type::any()))?;

        let scope = env.child();
        for (param, ty) in def.params.iter().zip(&params) {
            scope.set(param.name.as_str(), ty.clone());
        }
        // An empty function body is unconstrained.
        let body = if def.body.is_empty() {
            Type::any()
        } else {
            self.check_body(&def.body, &scope)?
        };
        if !ret.compatible(&body) {
            return Err(TypeError::ReturnMismatch {
                name: def.name.clone(),
                expected: ret,
                found: body,
                span,
            });
        }

        // Bound only now, so the body cannot refer to the function itself.
        let signature = Type::function(params, ret);
        env.set(def.name.as_str(), signature.clone());
        Ok(signature)
    }

    fn check_match(&self, subject: &Type, cases: &[MatchCase], env: &Environment<Type>) -> Result<Type, TypeError> {
        let mut result: Option<Type> = None;
        for case in cases {
            let scope = env.child();
            match &case.pattern {
                Pattern::Wildcard => {}
                Pattern::Literal(literal) => {
                    let found = match literal {
                        Literal::Number { is_float: true, .. } => Type::float(),
                        Literal::Number { is_float: false, .. } => Type::int(),
                        Literal::Str(_) => Type::str(),
                    };
                    if !found.compatible(subject) {
                        return Err(TypeError::PatternMismatch {
                            expected: subject.clone(),
                            found,
                            span: case.pattern_span,
                        });
                    }
                }
                Pattern::Binding(name) => {
                    if !scope.contains(name) {
                        scope.set(name.as_str(), subject.clone());
                    }
                }
                Pattern::TypedBinding { name, annotation } => {
                    let declared = resolve(annotation)?;
                    if !declared.compatible(subject) {
                        return Err(TypeError::PatternMismatch {
                            expected: subject.clone(),
                            found: declared,
                            span: case.pattern_span,
                        });
                    }
                    scope.set(name.as_str(), declared);
                }
            }
            let body = self.check_body(&case.body, &scope)?;
            result = Some(match result {
                Some(previous) => Type::unify(&previous, &body),
                None => body,
            });
        }
        Ok(result.unwrap_or_else(Type::none))
    }
}

fn resolve(annotation: &TypeExpr) -> Result<Type, TypeError> {
    Type::resolve(annotation).map_err(|unknown| TypeError::UnknownType {
        name: unknown.name,
        span: unknown.span,
    })
}

/// Checks a program against the standard builtin signatures.
pub fn check(ast: &[Node]) -> Result<Vec<Type>, TypeError> {
    TypeChecker::with_builtins(&Builtins::standard()).check(ast)
}
