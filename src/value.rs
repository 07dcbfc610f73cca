use crate::ast::{BinaryOp, FunctionDef};
use crate::interpreter::builtins::NativeFn;
use crate::interpreter::concurrency::Task;
use crate::interpreter::Environment;
use crate::types::Type;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    /// A number and whether it is a float; ints are stored as integral f64.
    Number(f64, bool),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    Function(Arc<Closure>),
    Builtin(Builtin),
    Task(Arc<Task>),
}

/// A user function bound to the environment it was defined in.
pub struct Closure {
    pub def: FunctionDef,
    pub env: Environment<Value>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.def.name)
            .field("arity", &self.def.params.len())
            .finish()
    }
}

impl Closure {
    /// Declared signature; unannotated positions are `any`.
    pub fn signature(&self) -> Type {
        let resolve = |annotation: Option<&crate::ast::TypeExpr>| {
            annotation
                .and_then(|a| Type::resolve(a).ok())
                .unwrap_or_else(Type::any)
        };
        let params = self
            .def
            .params
            .iter()
            .map(|p| resolve(p.annotation.as_ref()))
            .collect();
        Type::function(params, resolve(self.def.return_type.as_ref()))
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a, _), Value::Number(b, _)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Task(a), Value::Task(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A value-level operator failure, located by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("cannot apply `{op}` to {left} and {right}")]
    Incompatible {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Number(n as f64, false)
    }

    pub fn float(n: f64) -> Self {
        Value::Number(n, true)
    }

    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(n, _) = self {
            Some(*n)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        if let Value::List(items) = self {
            Some(items)
        } else {
            None
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Number(n, _) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Function(_) | Value::Builtin(_) | Value::Task(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Number(_, false) => "int",
            Value::Number(_, true) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "orodha",
            Value::Function(_) | Value::Builtin(_) => "kazi",
            Value::Task(_) => "Task",
        }
    }

    /// The value's place in the shared type model. Booleans report as `int`.
    pub fn type_of(&self) -> Type {
        match self {
            Value::None => Type::none(),
            Value::Bool(_) | Value::Number(_, false) => Type::int(),
            Value::Number(_, true) => Type::float(),
            Value::Str(_) => Type::str(),
            Value::List(items) => {
                let element = items
                    .iter()
                    .map(Value::type_of)
                    .reduce(|a, b| Type::unify(&a, &b))
                    .unwrap_or_else(Type::any);
                Type::list(element)
            }
            Value::Function(closure) => closure.signature(),
            Value::Builtin(_) => Type::any(),
            Value::Task(_) => Type::task(),
        }
    }

    /// Display form used inside lists: strings are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("{:?}", s.as_ref()),
            other => other.to_string(),
        }
    }
}

fn format_number(n: f64, is_float: bool) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if is_float {
        if n.fract() == 0.0 && n.abs() < 1e16 {
            format!("{:.1}", n)
        } else {
            n.to_string()
        }
    } else {
        format!("{:.0}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("hakuna"),
            Value::Bool(true) => f.write_str("kweli"),
            Value::Bool(false) => f.write_str("sikweli"),
            Value::Number(n, is_float) => f.write_str(&format_number(*n, *is_float)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Function(closure) => write!(f, "<kazi {}>", closure.def.name),
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Value::Task(task) => write!(f, "<task #{}>", task.id()),
        }
    }
}

/// Applies a binary operator to two evaluated operands.
pub fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ValueError> {
    let incompatible = || ValueError::Incompatible {
        op,
        left: left.type_name(),
        right: right.type_name(),
    };

    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEq | BinaryOp::GreaterEq => {
            let ordering = match (left, right) {
                (Value::Number(a, _), Value::Number(b, _)) => a.partial_cmp(b),
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => return Err(incompatible()),
            };
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::Greater => ordering.is_gt(),
                BinaryOp::LessEq => ordering.is_le(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let (Value::Number(a, a_float), Value::Number(b, b_float)) = (left, right) else {
                return Err(incompatible());
            };
            let is_float = *a_float || *b_float;
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => {
                    if *b == 0.0 {
                        return Err(ValueError::DivisionByZero);
                    }
                    if is_float {
                        a / b
                    } else {
                        (a / b).trunc()
                    }
                }
            };
            Ok(Value::Number(result, is_float))
        }
    }
}
