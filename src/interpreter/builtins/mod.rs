//! Built-in functions bound into the root environment.
//!
//! Functions are organized into categories:
//! - **IO**: printing and reading a line (chapisha, soma)
//! - **String**: splitting, joining and case conversion (gawa, unganisha, herufi_kubwa, herufi_ndogo)
//! - **Math**: sums, products, powers, roots, random numbers (jumlisha, kiasi, kipeo, mzizi, nasibu)
//! - **Array**: list construction, length and higher-order helpers (orodha, urefu, panga, chuja, punguza)
//! - **Type**: conversions and runtime type names (kamili, desimali, mshono, aina_ya)
//! - **Tasks**: sleeping, joining and cancelling spawned tasks (simamisha, subiri, sitisha)
//!
//! The table is built once and handed to the root environment; nothing here is global state.

mod array;
mod io;
mod math;
mod misc;
mod string;
mod types;

use super::error::RuntimeError;
use super::output::Output;
use super::{Environment, Interpreter};
use crate::diagnostic::Span;
use crate::types::Type;
use crate::value::{Builtin, Value};
use indexmap::IndexMap;

/// Signature of every native function.
pub type NativeFn = fn(&CallContext<'_>, &[Value]) -> Result<Value, RuntimeError>;

/// What a builtin can reach while it runs: the calling interpreter and the call site.
pub struct CallContext<'a> {
    pub interpreter: &'a Interpreter,
    pub span: Span,
}

impl<'a> CallContext<'a> {
    pub fn new(interpreter: &'a Interpreter, span: Span) -> Self {
        Self { interpreter, span }
    }

    /// Invokes a closure or builtin passed in as an argument.
    pub fn call(&self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        self.interpreter.call_value(callee, args, self.span)
    }

    pub fn output(&self) -> &Output {
        self.interpreter.output()
    }

    pub fn error(&self, name: &'static str, message: impl Into<String>) -> RuntimeError {
        RuntimeError::builtin_at(name, message, self.span)
    }
}

macro_rules! require_args {
    ($ctx:expr, $args:expr, $n:expr, $name:expr) => {
        if $args.len() < $n {
            return Err($ctx.error($name, format!("requires {} argument(s), got {}", $n, $args.len())));
        }
    };
}

macro_rules! with_list {
    ($ctx:expr, $args:expr, $idx:expr, $name:expr, $body:expr) => {
        match &$args[$idx] {
            Value::List(items) => $body(items.as_slice()),
            other => Err($ctx.error($name, format!("expected orodha, found {}", other.type_name()))),
        }
    };
}

macro_rules! with_string {
    ($ctx:expr, $args:expr, $idx:expr, $name:expr, $body:expr) => {
        match &$args[$idx] {
            Value::Str(s) => $body(s.as_ref()),
            other => Err($ctx.error($name, format!("expected str, found {}", other.type_name()))),
        }
    };
}

macro_rules! with_number {
    ($ctx:expr, $args:expr, $idx:expr, $name:expr, $body:expr) => {
        match &$args[$idx] {
            Value::Number(n, is_float) => $body(*n, *is_float),
            other => Err($ctx.error($name, format!("expected a number, found {}", other.type_name()))),
        }
    };
}

pub(crate) use require_args;
pub(crate) use with_list;
pub(crate) use with_number;
pub(crate) use with_string;

/// One table entry: the runtime value and the signature the checker sees.
#[derive(Debug, Clone)]
pub struct BuiltinEntry {
    pub value: Value,
    pub signature: Type,
}

/// The read-only builtin mapping.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    entries: IndexMap<&'static str, BuiltinEntry>,
}

impl Builtins {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every constant and function the language ships with.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        let any = Type::any;
        let list = || Type::list(Type::any());

        table.constant("kweli", Value::Bool(true), Type::int());
        table.constant("sikweli", Value::Bool(false), Type::int());
        table.constant("hakuna", Value::None, Type::none());

        // IO
        table.function("chapisha", io::builtin_print, any());
        table.function("soma", io::builtin_read_line, any());

        // Array
        table.function("orodha", array::builtin_list, any());
        table.function("urefu", array::builtin_length, Type::function(vec![any()], Type::int()));
        table.function("panga", array::builtin_map, Type::function(vec![any(), list()], list()));
        table.function("chuja", array::builtin_filter, Type::function(vec![any(), list()], list()));
        table.function("punguza", array::builtin_reduce, any());

        // Math
        table.function("jumlisha", math::builtin_sum, Type::function(vec![list()], any()));
        table.function("kiasi", math::builtin_product, Type::function(vec![list()], any()));
        table.function("kipeo", math::builtin_pow, Type::function(vec![any(), any()], any()));
        table.function("mzizi", math::builtin_root, any());
        table.function("nasibu", math::builtin_random, Type::function(vec![], Type::float()));

        // String
        table.function("gawa", string::builtin_split, any());
        table.function("unganisha", string::builtin_join, any());
        table.function(
            "herufi_kubwa",
            string::builtin_upper,
            Type::function(vec![Type::str()], Type::str()),
        );
        table.function(
            "herufi_ndogo",
            string::builtin_lower,
            Type::function(vec![Type::str()], Type::str()),
        );

        // Type
        table.function("kamili", types::builtin_to_int, Type::function(vec![any()], Type::int()));
        table.function("desimali", types::builtin_to_float, Type::function(vec![any()], Type::float()));
        table.function("mshono", types::builtin_to_string, Type::function(vec![any()], Type::str()));
        table.function("aina_ya", types::builtin_type_of, Type::function(vec![any()], Type::str()));

        // Tasks
        table.function("simamisha", misc::builtin_sleep, Type::function(vec![any()], Type::none()));
        table.function("subiri", misc::builtin_await, any());
        table.function("sitisha", misc::builtin_cancel, Type::function(vec![Type::task()], Type::none()));

        table
    }

    pub fn constant(&mut self, name: &'static str, value: Value, signature: Type) {
        self.entries.insert(name, BuiltinEntry { value, signature });
    }

    pub fn function(&mut self, name: &'static str, func: NativeFn, signature: Type) {
        let value = Value::Builtin(Builtin { name, func });
        self.entries.insert(name, BuiltinEntry { value, signature });
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinEntry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds every runtime value into `env`.
    pub fn install(&self, env: &Environment<Value>) {
        for (name, entry) in &self.entries {
            env.set(*name, entry.value.clone());
        }
    }

    /// Binds every signature into a type environment.
    pub fn install_types(&self, env: &Environment<Type>) {
        for (name, entry) in &self.entries {
            env.set(*name, entry.signature.clone());
        }
    }
}
