//! Input/output built-in functions.

use super::super::error::RuntimeError;
use super::CallContext;
use crate::value::Value;
use std::io::{self, BufRead};

pub fn builtin_print(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let output: Vec<String> = args.iter().map(Value::to_string).collect();
    ctx.output().write_line(&output.join(" "));
    Ok(Value::None)
}

/// Reads one line from stdin. End of input yields `hakuna`.
pub fn builtin_read_line(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    if let Some(prompt) = args.first() {
        ctx.output().write(&prompt.to_string());
    }
    let mut input = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut input)
        .map_err(|e| ctx.error("soma", format!("failed to read input: {}", e)))?;
    if read == 0 {
        return Ok(Value::None);
    }
    Ok(Value::str(input.trim_end_matches(['\n', '\r'])))
}
