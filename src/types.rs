//! The type model shared by the static checker and the runtime annotation check.

use crate::ast::TypeExpr;
use crate::diagnostic::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    Str,
    None,
    Any,
    Task,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "str",
            Primitive::None => "none",
            Primitive::Any => "any",
            Primitive::Task => "Task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Concrete(Primitive),
    Function { params: Vec<Type>, ret: Box<Type> },
    List(Box<Type>),
}

/// An annotation naming a type that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType {
    pub name: String,
    pub span: Span,
}

impl Type {
    pub fn int() -> Self {
        Type::Concrete(Primitive::Int)
    }

    pub fn float() -> Self {
        Type::Concrete(Primitive::Float)
    }

    pub fn str() -> Self {
        Type::Concrete(Primitive::Str)
    }

    pub fn none() -> Self {
        Type::Concrete(Primitive::None)
    }

    pub fn any() -> Self {
        Type::Concrete(Primitive::Any)
    }

    pub fn task() -> Self {
        Type::Concrete(Primitive::Task)
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Concrete(Primitive::Any))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Concrete(Primitive::Int | Primitive::Float | Primitive::Any)
        )
    }

    /// Names are equal or either side is `any`; lists and functions compare structurally.
    pub fn compatible(&self, other: &Type) -> bool {
        if self.is_any() || other.is_any() {
            return true;
        }
        match (self, other) {
            (Type::Concrete(a), Type::Concrete(b)) => a == b,
            (Type::List(a), Type::List(b)) => a.compatible(b),
            (
                Type::Function { params: pa, ret: ra },
                Type::Function { params: pb, ret: rb },
            ) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(a, b)| a.compatible(b))
                    && ra.compatible(rb)
            }
            _ => false,
        }
    }

    /// Result type of an arithmetic operator over two numeric operands.
    pub fn promote(left: &Type, right: &Type) -> Type {
        if left.is_any() || right.is_any() {
            Type::any()
        } else if *left == Type::float() || *right == Type::float() {
            Type::float()
        } else {
            Type::int()
        }
    }

    /// Two types agree for widening purposes when they are equal; otherwise `any`.
    pub fn unify(left: &Type, right: &Type) -> Type {
        if left == right {
            left.clone()
        } else {
            Type::any()
        }
    }

    pub fn resolve(annotation: &TypeExpr) -> Result<Type, UnknownType> {
        match annotation {
            TypeExpr::Named { name, span } => match name.as_str() {
                "int" | "kamili" | "bool" => Ok(Type::int()),
                "float" | "desimali" | "nambari" => Ok(Type::float()),
                "str" | "neno" | "mshono" => Ok(Type::str()),
                "none" | "hakuna" => Ok(Type::none()),
                "any" => Ok(Type::any()),
                "Task" => Ok(Type::task()),
                "orodha" => Ok(Type::list(Type::any())),
                _ => Err(UnknownType {
                    name: name.clone(),
                    span: *span,
                }),
            },
            TypeExpr::Generic { name, arg, span } => match name.as_str() {
                "orodha" => Ok(Type::list(Type::resolve(arg)?)),
                _ => Err(UnknownType {
                    name: annotation.to_string(),
                    span: *span,
                }),
            },
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Concrete(p) => f.write_str(p.name()),
            Type::List(element) => write!(f, "orodha[{}]", element),
            Type::Function { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "kazi({}) -> {}", params.join(", "), ret)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> TypeExpr {
        TypeExpr::Named {
            name: name.to_string(),
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_any_is_compatible_with_everything() {
        assert!(Type::any().compatible(&Type::int()));
        assert!(Type::str().compatible(&Type::any()));
        assert!(Type::list(Type::int()).compatible(&Type::any()));
    }

    #[test]
    fn test_concrete_names_must_match() {
        assert!(Type::int().compatible(&Type::int()));
        assert!(!Type::int().compatible(&Type::float()));
        assert!(!Type::str().compatible(&Type::none()));
    }

    #[test]
    fn test_structural_compatibility() {
        assert!(Type::list(Type::int()).compatible(&Type::list(Type::any())));
        assert!(!Type::list(Type::int()).compatible(&Type::list(Type::str())));
        let f = Type::function(vec![Type::int()], Type::int());
        let g = Type::function(vec![Type::any()], Type::int());
        let h = Type::function(vec![Type::int(), Type::int()], Type::int());
        assert!(f.compatible(&g));
        assert!(!f.compatible(&h));
    }

    #[test]
    fn test_promotion() {
        assert_eq!(Type::promote(&Type::int(), &Type::float()), Type::float());
        assert_eq!(Type::promote(&Type::int(), &Type::int()), Type::int());
        assert_eq!(Type::promote(&Type::any(), &Type::int()), Type::any());
    }

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(Type::resolve(&named("nambari")), Ok(Type::float()));
        assert_eq!(Type::resolve(&named("neno")), Ok(Type::str()));
        assert_eq!(Type::resolve(&named("Task")), Ok(Type::task()));
        let list = TypeExpr::Generic {
            name: "orodha".to_string(),
            arg: Box::new(named("int")),
            span: Span::dummy(),
        };
        assert_eq!(Type::resolve(&list), Ok(Type::list(Type::int())));
    }

    #[test]
    fn test_resolve_unknown() {
        let err = Type::resolve(&named("kitu")).unwrap_err();
        assert_eq!(err.name, "kitu");
    }
}
