//! Task built-in functions.

use super::super::error::RuntimeError;
use super::{require_args, with_number, CallContext};
use crate::value::Value;
use std::thread;
use std::time::Duration;

fn seconds(ctx: &CallContext<'_>, name: &'static str, value: &Value) -> Result<Duration, RuntimeError> {
    match value {
        Value::Number(n, _) => Duration::try_from_secs_f64(*n)
            .map_err(|e| ctx.error(name, format!("invalid duration {}: {}", value, e))),
        other => Err(ctx.error(name, format!("invalid duration {}", other))),
    }
}

/// `simamisha(seconds)`
pub fn builtin_sleep(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "simamisha");
    with_number!(ctx, args, 0, "simamisha", |_, _| {
        thread::sleep(seconds(ctx, "simamisha", &args[0])?);
        Ok(Value::None)
    })
}

/// `subiri(task, timeout?)`: the task's value, or its error re-raised here.
pub fn builtin_await(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "subiri");
    let Value::Task(task) = &args[0] else {
        return Err(ctx.error("subiri", format!("expected Task, found {}", args[0].type_name())));
    };
    let timeout = args.get(1).map(|t| seconds(ctx, "subiri", t)).transpose()?;
    match task.join(timeout) {
        Some(result) => result.into_result(),
        None => Err(RuntimeError::TaskUnfinished { id: task.id() }),
    }
}

/// `sitisha(task)`
pub fn builtin_cancel(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "sitisha");
    match &args[0] {
        Value::Task(task) => {
            task.cancel();
            Ok(Value::None)
        }
        other => Err(ctx.error("sitisha", format!("expected Task, found {}", other.type_name()))),
    }
}
