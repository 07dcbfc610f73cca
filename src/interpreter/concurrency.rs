//! Task spawning, joining and the bounded worker pool behind `anzisha`.

use super::error::RuntimeError;
use crate::value::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Stack size for task and worker threads; deep user recursion runs there.
pub const TASK_STACK_SIZE: usize = 16 * 1024 * 1024;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Cooperative stop signal shared between a task and whoever holds its handle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// What a task produced: exactly one of a value or an exception.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Value(Value),
    Exception {
        error: RuntimeError,
        trace: Option<String>,
    },
}

impl TaskResult {
    pub fn exception(error: RuntimeError) -> Self {
        TaskResult::Exception { error, trace: None }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            TaskResult::Value(value) => Some(value),
            TaskResult::Exception { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RuntimeError> {
        match self {
            TaskResult::Value(_) => None,
            TaskResult::Exception { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<Value, RuntimeError> {
        match self {
            TaskResult::Value(value) => Ok(value),
            TaskResult::Exception { error, .. } => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    Running,
    Finished(TaskResult),
}

impl TaskState {
    fn is_finished(&self) -> bool {
        matches!(self, TaskState::Finished(_))
    }
}

/// Handle to a unit of concurrently executed code.
#[derive(Debug)]
pub struct Task {
    id: u64,
    state: Mutex<TaskState>,
    finished: Condvar,
    cancel: CancelToken,
}

impl Task {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(TaskState::Pending),
            finished: Condvar::new(),
            cancel: CancelToken::new(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> TaskState {
        self.lock().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().is_finished()
    }

    /// Raises the stop signal. A task that has already started runs to completion.
    pub fn cancel(&self) {
        debug!(task = self.id, "cancel requested");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Blocks until the task finishes or `timeout` elapses. `None` means the task is still running.
    pub fn join(&self, timeout: Option<Duration>) -> Option<TaskResult> {
        let state = self.lock();
        let state = match timeout {
            None => self
                .finished
                .wait_while(state, |s| !s.is_finished())
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                self.finished
                    .wait_timeout_while(state, timeout, |s| !s.is_finished())
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };
        match &*state {
            TaskState::Finished(result) => Some(result.clone()),
            _ => None,
        }
    }

    fn finish(&self, result: TaskResult) {
        *self.lock() = TaskState::Finished(result);
        self.finished.notify_all();
    }

    /// Runs `work` on the current thread, honouring the stop signal once at entry.
    fn run<F>(&self, work: F)
    where
        F: FnOnce() -> Result<Value, RuntimeError>,
    {
        if self.cancel.is_cancelled() {
            warn!(task = self.id, "task cancelled before start");
            self.finish(TaskResult::exception(RuntimeError::TaskCancelled { id: self.id }));
            return;
        }
        *self.lock() = TaskState::Running;
        trace!(task = self.id, "task started");

        let result = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(value)) => TaskResult::Value(value),
            Ok(Err(error)) => {
                let span = error.span();
                let trace = if span.is_dummy() {
                    format!("task #{} failed: {}", self.id, error)
                } else {
                    format!("task #{} failed at {}: {}", self.id, span, error)
                };
                TaskResult::Exception {
                    error,
                    trace: Some(trace),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(task = self.id, %message, "task panicked");
                TaskResult::exception(RuntimeError::TaskPanicked { id: self.id, message })
            }
        };
        debug!(task = self.id, ok = result.value().is_some(), "task finished");
        self.finish(result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Starts `work` on a dedicated thread.
pub fn spawn<F>(work: F) -> Arc<Task>
where
    F: FnOnce() -> Result<Value, RuntimeError> + Send + 'static,
{
    let task = Task::new();
    let runner = Arc::clone(&task);
    let spawned = thread::Builder::new()
        .name(format!("spl-task-{}", task.id))
        .stack_size(TASK_STACK_SIZE)
        .spawn(move || runner.run(work));

    match spawned {
        Ok(_) => debug!(task = task.id, "task spawned"),
        Err(err) => task.finish(TaskResult::exception(RuntimeError::TaskNotStarted {
            id: task.id,
            message: err.to_string(),
        })),
    }
    task
}

/// Queues `work` on a worker pool instead of creating a thread for it.
pub fn spawn_on<F>(pool: &WorkerPool, work: F) -> Arc<Task>
where
    F: FnOnce() -> Result<Value, RuntimeError> + Send + 'static,
{
    let task = Task::new();
    let runner = Arc::clone(&task);
    if let Err(err) = pool.submit(move || runner.run(work)) {
        task.finish(TaskResult::exception(RuntimeError::TaskNotStarted {
            id: task.id,
            message: err.to_string(),
        }));
    } else {
        debug!(task = task.id, "task queued");
    }
    task
}

/// Waits for every task in order, up to `timeout` each.
///
/// The result sequence lines up with `tasks`. A task still running after its
/// timeout contributes a "task unfinished" exception and, when
/// `cancel_unfinished` is set, has its stop signal raised.
pub fn join(tasks: &[Arc<Task>], timeout: Option<Duration>, cancel_unfinished: bool) -> Vec<TaskResult> {
    tasks
        .iter()
        .map(|task| match task.join(timeout) {
            Some(result) => result,
            None => {
                warn!(task = task.id, "task unfinished after timeout");
                if cancel_unfinished {
                    task.cancel();
                }
                TaskResult::exception(RuntimeError::TaskUnfinished { id: task.id })
            }
        })
        .collect()
}

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool is shut down")]
    Closed,
}

/// A fixed number of worker threads pulling jobs from one shared queue.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Message>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    pending: Arc<(Mutex<usize>, Condvar)>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Message>();
        let receiver = Arc::new(Mutex::new(receiver));
        let pending = Arc::new((Mutex::new(0usize), Condvar::new()));

        let workers = (0..size)
            .filter_map(|index| {
                let receiver = Arc::clone(&receiver);
                let pending = Arc::clone(&pending);
                thread::Builder::new()
                    .name(format!("spl-worker-{}", index))
                    .stack_size(TASK_STACK_SIZE)
                    .spawn(move || worker_loop(index, receiver, pending))
                    .map_err(|err| warn!(worker = index, error = %err, "failed to start worker"))
                    .ok()
            })
            .collect::<Vec<_>>();

        debug!(workers = workers.len(), "worker pool started");
        Self {
            sender: Mutex::new(Some(sender)),
            size: workers.len(),
            workers: Mutex::new(workers),
            pending,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            return Err(PoolError::Closed);
        };
        if self.size == 0 {
            return Err(PoolError::Closed);
        }

        let (count, _) = &*self.pending;
        *count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        sender.send(Message::Run(Box::new(job))).map_err(|_| {
            self.complete_one();
            PoolError::Closed
        })
    }

    fn complete_one(&self) {
        let (count, idle) = &*self.pending;
        let mut count = count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        idle.notify_all();
    }

    /// Blocks until every submitted job has run.
    pub fn wait_idle(&self) {
        let (count, idle) = &*self.pending;
        let count = count.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = idle
            .wait_while(count, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Sends one sentinel per worker behind the queued jobs and joins the workers.
    pub fn shutdown(&self) {
        let Some(sender) = self.sender.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            return;
        };
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for _ in 0..workers.len() {
            let _ = sender.send(Message::Shutdown);
        }
        drop(sender);
        // The last handle can be dropped by a job running on a worker.
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() != current {
                let _ = worker.join();
            }
        }
        debug!(workers = self.size, "worker pool stopped");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("size", &self.size).finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(index: usize, receiver: Arc<Mutex<Receiver<Message>>>, pending: Arc<(Mutex<usize>, Condvar)>) {
    loop {
        let message = {
            let receiver = receiver.lock().unwrap_or_else(PoisonError::into_inner);
            receiver.recv()
        };
        match message {
            Ok(Message::Run(job)) => {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    warn!(worker = index, "job panicked");
                }
                let (count, idle) = &*pending;
                let mut count = count.lock().unwrap_or_else(PoisonError::into_inner);
                *count = count.saturating_sub(1);
                idle.notify_all();
            }
            Ok(Message::Shutdown) | Err(_) => break,
        }
    }
    trace!(worker = index, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Span;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn test_spawn_and_join_value() {
        let task = spawn(|| Ok(Value::int(7)));
        assert_eq!(task.join(None), Some(TaskResult::Value(Value::int(7))));
        assert!(task.is_finished());
    }

    #[test]
    fn test_error_is_captured_with_trace() {
        let task = spawn(|| Err(RuntimeError::operation_at("boom", Span::new(2, 3, 2, 7))));
        let result = task.join(None).unwrap();
        match result {
            TaskResult::Exception { error, trace } => {
                assert_eq!(error.to_string(), "boom");
                let trace = trace.unwrap();
                assert!(trace.contains(&format!("task #{}", task.id())));
                assert!(trace.contains("2:3"));
            }
            other => panic!("expected exception, got {:?}", other),
        }
    }

    #[test]
    fn test_panic_is_captured() {
        let task = spawn(|| panic!("kaboom"));
        let result = task.join(None).unwrap();
        assert!(matches!(
            result.error(),
            Some(RuntimeError::TaskPanicked { message, .. }) if message == "kaboom"
        ));
    }

    #[test]
    fn test_join_preserves_input_order() {
        let slow = spawn(|| {
            thread::sleep(Duration::from_millis(50));
            Err(RuntimeError::operation_at("slow failure", Span::dummy()))
        });
        let fast = spawn(|| Ok(Value::str("fast")));
        let results = join(&[slow, fast], None, false);
        assert_eq!(results.len(), 2);
        assert!(results[0].error().is_some());
        assert_eq!(results[1].value(), Some(&Value::str("fast")));
    }

    #[test]
    fn test_join_timeout_reports_unfinished() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let inner = Arc::clone(&gate);
        let task = spawn(move || {
            let (open, cv) = &*inner;
            let open = open.lock().unwrap();
            let _open = cv.wait_while(open, |o| !*o).unwrap();
            Ok(Value::None)
        });

        let started = Instant::now();
        let results = join(&[Arc::clone(&task)], Some(Duration::from_millis(20)), true);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(results[0].error(), Some(RuntimeError::TaskUnfinished { .. })));
        assert!(task.is_cancelled());

        let (open, cv) = &*gate;
        *open.lock().unwrap() = true;
        cv.notify_all();
        // Already running when cancelled, so it still completes.
        assert_eq!(task.join(None), Some(TaskResult::Value(Value::None)));
    }

    #[test]
    fn test_cancel_before_start() {
        let pool = WorkerPool::new(1);
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let inner = Arc::clone(&gate);
        pool.submit(move || {
            let (open, cv) = &*inner;
            let open = open.lock().unwrap();
            let _open = cv.wait_while(open, |o| !*o).unwrap();
        })
        .unwrap();

        let queued = spawn_on(&pool, || Ok(Value::int(1)));
        queued.cancel();
        let (open, cv) = &*gate;
        *open.lock().unwrap() = true;
        cv.notify_all();

        let result = queued.join(None).unwrap();
        assert!(matches!(result.error(), Some(RuntimeError::TaskCancelled { .. })));
    }

    #[test]
    fn test_pool_runs_every_job_before_shutdown() {
        let pool = WorkerPool::new(3);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 20);
        pool.shutdown();
        assert_eq!(pool.submit(|| {}), Err(PoolError::Closed));
    }

    #[test]
    fn test_pool_survives_panicking_job() {
        let pool = WorkerPool::new(1);
        pool.submit(|| panic!("job failure")).unwrap();
        let task = spawn_on(&pool, || Ok(Value::int(2)));
        assert_eq!(task.join(None), Some(TaskResult::Value(Value::int(2))));
    }

    #[test]
    fn test_spawn_on_closed_pool_fails_task() {
        let pool = WorkerPool::new(1);
        pool.shutdown();
        let task = spawn_on(&pool, || Ok(Value::None));
        assert!(matches!(
            task.join(Some(Duration::from_secs(1))).and_then(|r| r.error().cloned()),
            Some(RuntimeError::TaskNotStarted { .. })
        ));
    }
}
