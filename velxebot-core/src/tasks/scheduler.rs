// velxebot-core/src/tasks/scheduler.rs

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;
use uuid::Uuid;

pub type ScheduledTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Fire-once timer seam. The task runs exactly once after `delay`; timers
/// are not cancellable and do not survive a process restart.
pub trait TaskScheduler: Send + Sync {
    fn schedule(&self, task_id: Uuid, delay: Duration, task: ScheduledTask);
}

/// Scheduler backed by `tokio::spawn` + `tokio::time::sleep`.
#[derive(Default)]
pub struct TokioScheduler;

impl TaskScheduler for TokioScheduler {
    fn schedule(&self, task_id: Uuid, delay: Duration, task: ScheduledTask) {
        debug!("Scheduling task {task_id} to fire in {delay:?}");
        tokio::spawn(async move {
            sleep(delay).await;
            debug!("Task {task_id} firing");
            task.await;
        });
    }
}
