//! Background work with explicit lifecycle states.
//!
//! A [`BackgroundTask`] body runs on the tokio runtime; its callbacks never do.
//! They are posted to the [`UiQueue`] and run wherever the front end drains
//! it, so only the interactive side touches dialogs and the library.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Canceled,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Canceled | Self::Succeeded | Self::Failed)
    }
}

/// A task body that panicked or was torn down with its runtime. Task error
/// types convert from it so `on_failure` hears about it too.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Task aborted: {0}")]
pub struct TaskAborted(pub String);

impl From<TaskAborted> for String {
    fn from(err: TaskAborted) -> Self {
        err.to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── UiQueue ──────────────────────────────────────────────────────────────────

pub type UiCallback = Box<dyn FnOnce() + Send>;

/// Posting end of the [`UiQueue`].
#[derive(Clone)]
pub struct UiSender {
    tx: mpsc::UnboundedSender<UiCallback>,
}

impl UiSender {
    pub fn post(&self, callback: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(callback)).is_err() {
            debug!("ui queue closed, dropping callback");
        }
    }
}

/// Callbacks waiting to run on the interactive thread.
pub struct UiQueue {
    tx: mpsc::UnboundedSender<UiCallback>,
    rx: mpsc::UnboundedReceiver<UiCallback>,
}

impl UiQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> UiSender {
        UiSender {
            tx: self.tx.clone(),
        }
    }

    /// Runs every callback already queued and returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(callback) = self.rx.try_recv() {
            callback();
            ran += 1;
        }
        ran
    }

    /// Waits for the next callback and runs it.
    pub async fn next(&mut self) {
        if let Some(callback) = self.rx.recv().await {
            callback();
        }
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Task records ─────────────────────────────────────────────────────────────

struct TaskRecord {
    id: TaskId,
    title: String,
    state: watch::Sender<TaskState>,
    message: Mutex<String>,
}

impl TaskRecord {
    fn set_state(&self, state: TaskState) {
        self.state.send_replace(state);
    }

    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            title: self.title.clone(),
            state: *self.state.borrow(),
            message: lock(&self.message).clone(),
        }
    }
}

/// Point-in-time view of a task shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub title: String,
    pub state: TaskState,
    pub message: String,
}

type RunningCallback = Box<dyn FnOnce(String) + Send>;
type SuccessCallback<T> = Box<dyn FnOnce(T) + Send>;
type FailureCallback<E> = Box<dyn FnOnce(E) + Send>;
type TaskFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;
type TaskBody<T, E> = Box<dyn FnOnce(TaskContext) -> TaskFuture<T, E> + Send>;

/// Handed to a task body: cancellation and progress reporting.
pub struct TaskContext {
    record: Arc<TaskRecord>,
    token: CancellationToken,
    ui: UiSender,
    on_running: Mutex<Option<RunningCallback>>,
}

impl TaskContext {
    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Replaces the progress message. The first update also posts the
    /// `on_running` callback with that message.
    pub fn update_message(&self, message: impl Into<String>) {
        let message = message.into();
        *lock(&self.record.message) = message.clone();

        let on_running = lock(&self.on_running).take();
        if let Some(on_running) = on_running {
            self.ui.post(move || on_running(message));
        }
    }
}

// ─── BackgroundTask ───────────────────────────────────────────────────────────

pub struct BackgroundTask<T, E> {
    title: String,
    show_to_user: bool,
    token: CancellationToken,
    body: TaskBody<T, E>,
    on_running: Option<RunningCallback>,
    on_success: Option<SuccessCallback<T>>,
    on_failure: Option<FailureCallback<E>>,
}

impl<T, E> BackgroundTask<T, E>
where
    T: Send + 'static,
    E: fmt::Display + From<TaskAborted> + Send + 'static,
{
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            title: String::new(),
            show_to_user: false,
            token: CancellationToken::new(),
            body: Box::new(move |ctx| Box::pin(body(ctx))),
            on_running: None,
            on_success: None,
            on_failure: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Lists the task in [`TaskExecutor::visible_tasks`].
    pub fn show_to_user(mut self, show: bool) -> Self {
        self.show_to_user = show;
        self
    }

    pub fn on_running(mut self, callback: impl FnOnce(String) + Send + 'static) -> Self {
        self.on_running = Some(Box::new(callback));
        self
    }

    pub fn on_success(mut self, callback: impl FnOnce(T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_failure(mut self, callback: impl FnOnce(E) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(callback));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Token observed by the body. Cancelling it before execution makes a
    /// well-behaved body return without doing any work.
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn execute_with(self, executor: &TaskExecutor) -> TaskHandle {
        executor.execute(self)
    }
}

// ─── TaskExecutor ─────────────────────────────────────────────────────────────

/// Runs task bodies on a tokio runtime and routes their callbacks to the
/// [`UiQueue`].
#[derive(Clone)]
pub struct TaskExecutor {
    runtime: Handle,
    ui: UiSender,
    visible: Arc<Mutex<Vec<Arc<TaskRecord>>>>,
}

impl TaskExecutor {
    pub fn new(runtime: Handle, ui: UiSender) -> Self {
        Self {
            runtime,
            ui,
            visible: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Executor on the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Outside a tokio runtime.
    pub fn current(ui: UiSender) -> Self {
        Self::new(Handle::current(), ui)
    }

    /// Tasks shown to the user. Finished ones stay listed until the next
    /// task starts.
    pub fn visible_tasks(&self) -> Vec<TaskSnapshot> {
        lock(&self.visible).iter().map(|r| r.snapshot()).collect()
    }

    pub fn execute<T, E>(&self, task: BackgroundTask<T, E>) -> TaskHandle
    where
        T: Send + 'static,
        E: fmt::Display + From<TaskAborted> + Send + 'static,
    {
        let BackgroundTask {
            title,
            show_to_user,
            token,
            body,
            on_running,
            on_success,
            on_failure,
        } = task;

        let (state_tx, state_rx) = watch::channel(TaskState::Pending);
        let record = Arc::new(TaskRecord {
            id: Uuid::now_v7(),
            title,
            state: state_tx,
            message: Mutex::new(String::new()),
        });
        {
            let mut visible = lock(&self.visible);
            visible.retain(|r| !r.state.borrow().is_terminal());
            if show_to_user {
                visible.push(Arc::clone(&record));
            }
        }

        let handle = TaskHandle {
            id: record.id,
            state: state_rx,
            token: token.clone(),
        };
        let ctx = TaskContext {
            record: Arc::clone(&record),
            token: token.clone(),
            ui: self.ui.clone(),
            on_running: Mutex::new(on_running),
        };
        let ui = self.ui.clone();
        let runtime = self.runtime.clone();

        self.runtime.spawn(async move {
            record.set_state(TaskState::Running);
            debug!(task = %record.title, id = %record.id, "task started");

            let state = match runtime.spawn(body(ctx)).await {
                Ok(Ok(value)) => {
                    if let Some(on_success) = on_success {
                        ui.post(move || on_success(value));
                    }
                    if token.is_cancelled() {
                        TaskState::Canceled
                    } else {
                        TaskState::Succeeded
                    }
                }
                Ok(Err(err)) => {
                    info!(task = %record.title, error = %err, "task failed");
                    if let Some(on_failure) = on_failure {
                        ui.post(move || on_failure(err));
                    }
                    TaskState::Failed
                }
                Err(join_err) => {
                    error!(task = %record.title, error = %join_err, "task aborted");
                    if let Some(on_failure) = on_failure {
                        let err = E::from(TaskAborted(join_err.to_string()));
                        ui.post(move || on_failure(err));
                    }
                    TaskState::Failed
                }
            };

            debug!(task = %record.title, id = %record.id, ?state, "task finished");
            record.set_state(state);
        });

        handle
    }
}

// ─── TaskHandle ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: watch::Receiver<TaskState>,
    token: CancellationToken,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits for a terminal state. Every callback the task posted is queued
    /// by the time this returns.
    pub async fn join(&mut self) -> TaskState {
        let result = self
            .state
            .wait_for(|state| state.is_terminal())
            .await
            .map(|state| *state);
        result.unwrap_or_else(|_| *self.state.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn push(log: &Log, line: impl Into<String>) {
        log.lock().unwrap().push(line.into());
    }

    fn lines(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn recorded(log: &Log, task: BackgroundTask<Option<u32>, String>) -> BackgroundTask<Option<u32>, String> {
        let (running, success, failure) = (log.clone(), log.clone(), log.clone());
        task.on_running(move |m| push(&running, format!("running:{m}")))
            .on_success(move |v| push(&success, format!("success:{v:?}")))
            .on_failure(move |e| push(&failure, format!("failure:{e}")))
    }

    #[tokio::test]
    async fn success_callbacks_wait_for_the_queue() {
        let mut queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());
        let log = log();

        let task = BackgroundTask::new(|ctx: TaskContext| async move {
            ctx.update_message("working");
            ctx.update_message("done");
            Ok(Some(7))
        })
        .with_title("Count")
        .show_to_user(true);
        let mut handle = recorded(&log, task).execute_with(&executor);

        assert_eq!(handle.join().await, TaskState::Succeeded);
        assert!(lines(&log).is_empty());

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(lines(&log), vec!["running:working", "success:Some(7)"]);

        let tasks = executor.visible_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Count");
        assert_eq!(tasks[0].state, TaskState::Succeeded);
        assert_eq!(tasks[0].message, "done");
    }

    #[tokio::test]
    async fn failure_fires_only_on_failure() {
        let mut queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());
        let log = log();

        let task = BackgroundTask::new(|_ctx: TaskContext| async move { Err("boom".to_string()) });
        let mut handle = recorded(&log, task).execute_with(&executor);

        assert_eq!(handle.join().await, TaskState::Failed);
        queue.run_pending();
        assert_eq!(lines(&log), vec!["failure:boom"]);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let mut queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());
        let log = log();

        let task = BackgroundTask::new(|ctx: TaskContext| async move {
            if ctx.is_canceled() {
                return Ok(None);
            }
            ctx.update_message("working");
            Ok(Some(1))
        });
        task.cancel_token().cancel();
        let mut handle = recorded(&log, task).execute_with(&executor);

        assert_eq!(handle.join().await, TaskState::Canceled);
        queue.run_pending();
        assert_eq!(lines(&log), vec!["success:None"]);
    }

    #[tokio::test]
    async fn cancelled_while_running() {
        let mut queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();

        let mut handle = BackgroundTask::<u32, String>::new(|ctx: TaskContext| async move {
            let _ = started_tx.send(());
            ctx.cancel_token().cancelled().await;
            Ok(0)
        })
        .execute_with(&executor);

        started_rx.await.unwrap();
        assert_eq!(handle.state(), TaskState::Running);
        handle.cancel();
        assert_eq!(handle.join().await, TaskState::Canceled);
        assert_eq!(queue.run_pending(), 0);
    }

    #[tokio::test]
    async fn panicking_body_reports_failure() {
        let mut queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());
        let log = log();

        let task = BackgroundTask::new(|_ctx: TaskContext| async move {
            if true {
                panic!("lookup blew up");
            }
            Ok(None)
        });
        let mut handle = recorded(&log, task).execute_with(&executor);

        assert_eq!(handle.join().await, TaskState::Failed);
        queue.run_pending();
        let lines = lines(&log);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("failure:Task aborted:"), "{}", lines[0]);
    }

    #[tokio::test]
    async fn finished_tasks_leave_the_visible_list() {
        let mut queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());

        for n in 0..20u32 {
            let mut handle = BackgroundTask::<u32, String>::new(move |_ctx: TaskContext| async move { Ok(n) })
                .with_title(format!("Task {n}"))
                .show_to_user(true)
                .execute_with(&executor);
            handle.join().await;
            queue.run_pending();
        }

        let tasks = executor.visible_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Task 19");
    }

    #[tokio::test]
    async fn running_tasks_stay_visible() {
        let queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();

        let slow = BackgroundTask::<(), String>::new(|ctx: TaskContext| async move {
            let _ = started_tx.send(());
            ctx.cancel_token().cancelled().await;
            Ok(())
        })
        .with_title("Slow")
        .show_to_user(true)
        .execute_with(&executor);
        started_rx.await.unwrap();

        let mut quick = BackgroundTask::<(), String>::new(|_ctx: TaskContext| async move { Ok(()) })
            .with_title("Quick")
            .show_to_user(true)
            .execute_with(&executor);
        quick.join().await;

        let titles: Vec<_> = executor.visible_tasks().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Slow", "Quick"]);
        slow.cancel();
    }

    #[tokio::test]
    async fn hidden_tasks_are_not_listed() {
        let queue = UiQueue::new();
        let executor = TaskExecutor::current(queue.sender());

        let mut handle =
            BackgroundTask::<(), String>::new(|_ctx: TaskContext| async move { Ok(()) })
                .execute_with(&executor);
        handle.join().await;
        assert!(executor.visible_tasks().is_empty());
    }
}
