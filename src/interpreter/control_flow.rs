use crate::value::Value;

/// Outcome of executing one statement or block.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Value(Value),
    Return(Value),
}

impl ControlFlow {
    pub fn into_value(self) -> Value {
        match self {
            ControlFlow::Value(value) | ControlFlow::Return(value) => value,
        }
    }
}
