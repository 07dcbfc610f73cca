//! Spawned tasks, joining, cancellation and the worker pool

mod common;

use common::{output_of, run_with, value_of};
use spl::interpreter::concurrency::{self, TaskResult};
use spl::interpreter::{RunOptions, RuntimeError, WorkerPool};
use spl::{Error, Value};
use std::sync::Arc;
use std::time::Duration;

fn tasks_of(value: Value) -> Vec<Arc<concurrency::Task>> {
    let Value::List(items) = value else {
        panic!("expected a list of tasks, got {}", value);
    };
    items
        .iter()
        .map(|item| match item {
            Value::Task(task) => Arc::clone(task),
            other => panic!("expected a task, got {}", other),
        })
        .collect()
}

// =============================================================================
// SPAWN AND JOIN
// =============================================================================

#[test]
fn test_join_reports_each_outcome_in_spawn_order() {
    let source = "\
kazi polepole() -> int {
  simamisha(0.05)
  42
}
mbaya = anzisha { haipo + 1 }
nzuri = anzisha { polepole() }
orodha(nzuri, mbaya)";
    let tasks = tasks_of(value_of(source));
    let results = concurrency::join(&tasks, None, false);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0], TaskResult::Value(Value::int(42)));
    match &results[1] {
        TaskResult::Exception { error, trace } => {
            assert!(matches!(error, RuntimeError::UnknownIdentifier { name, .. } if name == "haipo"));
            assert!(trace.as_deref().is_some_and(|t| t.contains("unknown identifier")));
        }
        other => panic!("expected exception, got {:?}", other),
    }
}

#[test]
fn test_spawn_error_does_not_reach_spawner() {
    let source = "\
t = anzisha { 1 / 0 }
chapisha \"bado hai\"";
    assert_eq!(output_of(source), "bado hai\n");
}

#[test]
fn test_await_reraises_task_error() {
    let (result, _) = common::run("t = anzisha { 1 / 0 }\nsubiri(t)");
    assert!(matches!(result, Err(Error::Runtime(RuntimeError::Operation { .. }))));
}

#[test]
fn test_await_with_timeout() {
    let source = "t = anzisha { simamisha(2) }\nsubiri(t, 0.01)";
    let (result, _) = common::run(source);
    assert!(matches!(result, Err(Error::Runtime(RuntimeError::TaskUnfinished { .. }))));
}

#[test]
fn test_task_sees_captured_scope() {
    let source = "\
kiwango = 10
kazi zidisha(x: int) -> int { x * kiwango }
t = anzisha { zidisha(4) }
subiri(t)";
    assert_eq!(value_of(source), Value::int(40));
}

#[test]
fn test_task_bindings_stay_private() {
    let source = "\
x = 1
t = anzisha { x = 50 }
subiri(t)
chapisha x";
    assert_eq!(output_of(source), "1\n");
}

#[test]
fn test_task_return_ends_body() {
    assert_eq!(value_of("t = anzisha { rudisha 7\n 8 }\nsubiri(t)"), Value::int(7));
}

#[test]
fn test_task_output_shares_sink() {
    let source = "\
t = anzisha { chapisha \"kutoka kazi\" }
subiri(t)
chapisha \"mwisho\"";
    assert_eq!(output_of(source), "kutoka kazi\nmwisho\n");
}

#[test]
fn test_timed_join_without_cancel() {
    let tasks = tasks_of(value_of("orodha(anzisha { simamisha(0.3)\n 1 }, anzisha { 2 })"));
    let results = concurrency::join(&tasks, Some(Duration::from_millis(20)), false);
    assert!(matches!(results[0], TaskResult::Exception { error: RuntimeError::TaskUnfinished { .. }, .. }));
    assert!(!tasks[0].is_cancelled());

    // A later unbounded join still gets the real value.
    let results = concurrency::join(&tasks, None, false);
    assert_eq!(results[0], TaskResult::Value(Value::int(1)));
    assert_eq!(results[1], TaskResult::Value(Value::int(2)));
}

// =============================================================================
// WORKER POOL
// =============================================================================

fn pooled(workers: usize) -> (RunOptions, Arc<WorkerPool>) {
    let pool = Arc::new(WorkerPool::new(workers));
    let options = RunOptions {
        pool: Some(Arc::clone(&pool)),
        ..RunOptions::default()
    };
    (options, pool)
}

#[test]
fn test_pool_runs_spawned_bodies() {
    let (options, pool) = pooled(2);
    let source = "\
kazi mraba(n: int) -> int { n * n }
a = anzisha { mraba(3) }
b = anzisha { mraba(4) }
subiri(a) + subiri(b)";
    let (result, _) = run_with(source, options);
    assert_eq!(result.unwrap(), Value::int(25));
    pool.shutdown();
}

#[test]
fn test_cancel_queued_task_on_busy_pool() {
    let (options, pool) = pooled(1);
    let source = "\
zuia = anzisha { simamisha(0.2) }
baadaye = anzisha { chapisha \"haipaswi\" }
sitisha(baadaye)
orodha(zuia, baadaye)";
    let (result, printed) = run_with(source, options);
    let tasks = tasks_of(result.unwrap());
    let results = concurrency::join(&tasks, None, false);

    assert_eq!(results[0], TaskResult::Value(Value::None));
    assert!(matches!(results[1], TaskResult::Exception { error: RuntimeError::TaskCancelled { .. }, .. }));
    pool.shutdown();
    assert_eq!(printed, "");
}

#[test]
fn test_pool_shutdown_drains_queue() {
    let (options, pool) = pooled(2);
    let source = "\
kazi kazi_ndogo(n: int) -> int {
  simamisha(0.01)
  n
}
orodha(anzisha { kazi_ndogo(1) }, anzisha { kazi_ndogo(2) }, anzisha { kazi_ndogo(3) }, anzisha { kazi_ndogo(4) })";
    let (result, _) = run_with(source, options);
    let tasks = tasks_of(result.unwrap());
    pool.shutdown();
    assert!(tasks.iter().all(|t| t.is_finished()));
    let values: Vec<Value> = concurrency::join(&tasks, None, false)
        .into_iter()
        .filter_map(|r| r.value().cloned())
        .collect();
    assert_eq!(values, vec![Value::int(1), Value::int(2), Value::int(3), Value::int(4)]);
}

#[test]
fn test_spawn_after_shutdown_reports_not_started() {
    let (options, pool) = pooled(1);
    pool.shutdown();
    let (result, _) = run_with("t = anzisha { 1 }\nsubiri(t)", options);
    assert!(matches!(result, Err(Error::Runtime(RuntimeError::TaskNotStarted { .. }))));
}
