//! Single-flight scheduler.
//!
//! One worker thread owns the [`Resolver`] and runs pipelines strictly one at
//! a time, in submission order. Completion callbacks run on a separate
//! delivery thread so callers never execute on the worker.
//!
//! A panic in a pipeline or in a completion is contained: the pipeline's
//! task ends `Failed`, and later tasks and completions are unaffected.

use std::any::Any;
use std::io;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, ThreadId};

use adaptive_fonts_registry::FontHandle;
use parking_lot::{Condvar, Mutex};

use crate::error::ResolveError;
use crate::pipeline::{FontRequest, Resolution, ResolutionPipeline, Resolver, TaskState};

/// Completion callback; receives the font, or `None` when none was produced.
pub type Completion = Box<dyn FnOnce(Option<FontHandle>) + Send + 'static>;

struct TaskShared {
    cancelled: AtomicBool,
    inner: Mutex<TaskInner>,
    done: Condvar,
}

struct TaskInner {
    state: TaskState,
    resolution: Option<Resolution>,
}

impl TaskShared {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            inner: Mutex::new(TaskInner {
                state: TaskState::Created,
                resolution: None,
            }),
            done: Condvar::new(),
        }
    }

    fn set_running(&self) {
        self.inner.lock().state = TaskState::Running;
    }

    fn finish(&self, resolution: Resolution) {
        let mut inner = self.inner.lock();
        inner.state = resolution.state();
        inner.resolution = Some(resolution);
        self.done.notify_all();
    }
}

/// Worker-side ownership of a task.
///
/// Dropping the guard before the task reached a terminal state (a dead
/// worker, a queue torn down mid-flight) finishes it as `Cancelled`, so
/// waiters never block on a job nobody will run.
struct TaskGuard(Arc<TaskShared>);

impl Deref for TaskGuard {
    type Target = TaskShared;

    fn deref(&self) -> &TaskShared {
        &self.0
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let mut inner = self.0.inner.lock();
        if inner.resolution.is_none() {
            inner.state = TaskState::Cancelled;
            inner.resolution = Some(Resolution::Cancelled);
            self.0.done.notify_all();
        }
    }
}

/// Handle to a submitted resolution.
#[derive(Clone)]
pub struct FontTask {
    shared: Arc<TaskShared>,
    worker: ThreadId,
}

impl std::fmt::Debug for FontTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontTask")
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl FontTask {
    /// Request cancellation.
    ///
    /// A task that has not started will never run. A running task stops at
    /// its next checkpoint. No completion callback fires after cancellation
    /// is observed.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    pub fn state(&self) -> TaskState {
        self.shared.inner.lock().state
    }

    /// The terminal outcome, if the task has finished.
    pub fn try_resolution(&self) -> Option<Resolution> {
        self.shared.inner.lock().resolution.clone()
    }

    /// Block until the task reaches a terminal state.
    ///
    /// Waiting on the worker thread itself would deadlock; such a wait is
    /// refused: the task is cancelled and `Cancelled` is returned.
    pub fn wait_resolution(&self) -> Resolution {
        if thread::current().id() == self.worker {
            log::error!("Blocking wait on the font worker thread refused; cancelling task");
            self.cancel();
            return self.try_resolution().unwrap_or(Resolution::Cancelled);
        }

        let mut inner = self.shared.inner.lock();
        loop {
            if let Some(resolution) = &inner.resolution {
                return resolution.clone();
            }
            self.shared.done.wait(&mut inner);
        }
    }

    /// Block until the task finishes and return the font, if one was produced.
    pub fn wait(&self) -> Option<FontHandle> {
        self.wait_resolution().into_font()
    }
}

struct Job {
    pipeline: ResolutionPipeline,
    task: TaskGuard,
    completion: Option<Completion>,
}

/// Serialized execution queue for resolution pipelines.
pub struct Scheduler {
    jobs: Sender<Job>,
    worker: ThreadId,
}

impl Scheduler {
    /// Start the worker and delivery threads.
    pub fn spawn(resolver: Resolver) -> io::Result<Self> {
        let (delivery_tx, delivery_rx) = mpsc::channel::<(Completion, Option<FontHandle>)>();
        thread::Builder::new()
            .name("adaptive-fonts-delivery".into())
            .spawn(move || {
                for (completion, font) in delivery_rx {
                    let delivered = panic::catch_unwind(AssertUnwindSafe(|| completion(font)));
                    if let Err(payload) = delivered {
                        log::error!("Font completion panicked: {}", panic_message(&*payload));
                    }
                }
            })?;

        let (jobs, job_rx) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name("adaptive-fonts-worker".into())
            .spawn(move || run_worker(resolver, job_rx, delivery_tx))?;

        Ok(Self {
            jobs,
            worker: worker.thread().id(),
        })
    }

    /// Queue a request. Requests run one at a time in submission order.
    pub fn submit(&self, request: FontRequest, completion: Option<Completion>) -> FontTask {
        let shared = Arc::new(TaskShared::new());
        let task = FontTask {
            shared: Arc::clone(&shared),
            worker: self.worker,
        };

        log::debug!("Queued {} at size {}", request.font, request.size);
        let job = Job {
            pipeline: ResolutionPipeline::new(request),
            task: TaskGuard(shared),
            completion,
        };
        if self.jobs.send(job).is_err() {
            // The returned job is dropped here, which cancels the task.
            log::error!("Font worker is gone; dropping request");
        }

        task
    }

    /// Whether the calling thread is the worker thread.
    pub fn on_worker_thread(&self) -> bool {
        thread::current().id() == self.worker
    }
}

fn run_worker(
    mut resolver: Resolver,
    jobs: Receiver<Job>,
    delivery: Sender<(Completion, Option<FontHandle>)>,
) {
    for job in jobs {
        let Job {
            pipeline,
            task,
            completion,
        } = job;

        if task.cancelled.load(Ordering::Acquire) {
            log::debug!("{}: cancelled while queued", pipeline.request().font);
            task.finish(Resolution::Cancelled);
            continue;
        }

        task.set_running();
        let font_name = pipeline.request().font.to_string();
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            pipeline.run(&mut resolver, &task.cancelled)
        }));
        let resolution = match run {
            Ok(resolution) => resolution,
            Err(payload) => {
                let message = panic_message(&*payload);
                log::error!("{}: resolution panicked: {}", font_name, message);
                Resolution::Failed(ResolveError::Aborted(message))
            }
        };
        if matches!(resolution, Resolution::Cancelled) {
            task.finish(resolution);
            continue;
        }
        let font = resolution.font().cloned();
        task.finish(resolution);

        if let Some(completion) = completion
            && delivery.send((completion, font)).is_err()
        {
            log::warn!("Delivery thread is gone; dropping completion");
        }
    }
    log::debug!("Font worker shutting down");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
