use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

use tokio::{
    sync::mpsc,
    time::{
        sleep,
        Instant,
    },
};
use tracing::{
    debug,
    info,
};

use super::handle::{
    CancelToken,
    TaskHandle,
};

pub const REMINDER_ALARM: &str = "reminder";

struct Timer {
    generation: u64,
    due: Instant,
    handle: TaskHandle,
}

#[derive(Default)]
struct Timers {
    next_generation: u64,
    by_name: HashMap<String, Timer>,
}

/// Named one-shot timers. Scheduling a name again replaces the earlier timer,
/// so at most one timer per name is ever outstanding.
#[derive(Clone)]
pub struct Scheduler {
    timers: Arc<Mutex<Timers>>,
    fired: mpsc::UnboundedSender<String>,
}

impl Scheduler {
    /// Returns the scheduler and the receiver that yields alarm names as they fire.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (fired, receiver) = mpsc::unbounded_channel();
        (Self { timers: Arc::new(Mutex::new(Timers::default())), fired }, receiver)
    }

    pub fn schedule_minutes(&self, name: &str, minutes: u32) {
        self.schedule(name, Duration::from_secs(u64::from(minutes) * 60));
    }

    pub fn schedule(&self, name: &str, delay: Duration) {
        let Ok(mut timers) = self.timers.lock() else {
            return;
        };

        timers.next_generation += 1;
        let generation = timers.next_generation;

        let cancel_token = CancelToken::new();
        let task_token = cancel_token.clone();
        let task_timers = self.timers.clone();
        let fired = self.fired.clone();
        let task_name = name.to_string();

        let join_handle = tokio::spawn(async move {
            sleep(delay).await;
            if task_token.is_cancelled() {
                return;
            }
            if fired.send(task_name.clone()).is_err() {
                debug!("[Scheduler] Alarm '{}' fired with no listener", task_name);
            }
            // Dropping our own entry aborts this task, which has no awaits left.
            if let Ok(mut timers) = task_timers.lock() {
                if timers.by_name.get(&task_name).map(|t| t.generation) == Some(generation) {
                    timers.by_name.remove(&task_name);
                }
            }
        });

        let timer = Timer {
            generation,
            due: Instant::now() + delay,
            handle: TaskHandle::new(cancel_token, join_handle),
        };

        if let Some(previous) = timers.by_name.insert(name.to_string(), timer) {
            previous.handle.cancel();
            debug!("[Scheduler] Replaced pending alarm '{}'", name);
        }
        info!("[Scheduler] Alarm '{}' set for {:?} from now", name, delay);
    }

    pub fn cancel(&self, name: &str) -> bool {
        self.timers
            .lock()
            .map(|mut timers| timers.by_name.remove(name).is_some())
            .unwrap_or(false)
    }

    pub fn pending_count(&self) -> usize {
        self.timers.lock().map(|timers| timers.by_name.len()).unwrap_or(0)
    }

    /// Time remaining until `name` fires, if it is pending.
    pub fn remaining(&self, name: &str) -> Option<Duration> {
        let timers = self.timers.lock().ok()?;
        timers.by_name.get(name).map(|t| t.due.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_timer() {
        let (scheduler, mut fired) = Scheduler::new();

        scheduler.schedule_minutes(REMINDER_ALARM, 5);
        scheduler.schedule_minutes(REMINDER_ALARM, 2);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.remaining(REMINDER_ALARM), Some(Duration::from_secs(120)));

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(fired.recv().await.as_deref(), Some(REMINDER_ALARM));
        assert_eq!(scheduler.pending_count(), 0);

        // The replaced five minute timer never fires.
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(fired.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let (scheduler, mut fired) = Scheduler::new();

        scheduler.schedule_minutes(REMINDER_ALARM, 1);
        assert!(scheduler.cancel(REMINDER_ALARM));
        assert!(!scheduler.cancel(REMINDER_ALARM));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(fired.try_recv().is_err());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_names_are_independent() {
        let (scheduler, mut fired) = Scheduler::new();

        scheduler.schedule(REMINDER_ALARM, Duration::from_secs(30));
        scheduler.schedule("other", Duration::from_secs(10));
        assert_eq!(scheduler.pending_count(), 2);

        assert_eq!(fired.recv().await.as_deref(), Some("other"));
        assert_eq!(fired.recv().await.as_deref(), Some(REMINDER_ALARM));
    }
}
