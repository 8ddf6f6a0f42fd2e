//! Deferred reminder delivery. A poll loop picks up due reminders and hands
//! them to an injected delivery sink; a reminder is marked sent only after
//! the sink reported success, so delivery is at-least-once.

use crate::storage::Storage;
use chrono::{Local, NaiveDateTime};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Delivery seam. The messaging front-end plugs in here; the dispatcher
/// itself never knows the channel.
pub trait ReminderSink: Send + Sync + 'static {
    fn deliver(
        &self,
        user_id: i64,
        service_name: &str,
        date: &str,
        time: &str,
    ) -> BoxFuture<'static, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatcherState {
    Stopped,
    Running,
}

#[derive(Debug, Clone)]
pub struct ReminderDispatcher<S: Storage> {
    storage: S,
    poll_interval: Duration,
    state: Arc<Mutex<DispatcherState>>,
    wakeup: Arc<Notify>,
}

impl<S: Storage> ReminderDispatcher<S> {
    pub fn new(storage: S, poll_interval: Duration) -> Self {
        Self {
            storage,
            poll_interval,
            state: Arc::new(Mutex::new(DispatcherState::Stopped)),
            wakeup: Arc::new(Notify::new()),
        }
    }

    /// Stopped -> Running. Spawns the poll loop and returns its handle, or
    /// None when the dispatcher is already running.
    pub fn start<K: ReminderSink>(&self, sink: K) -> Option<JoinHandle<()>> {
        {
            let mut state = self.state.lock().unwrap();
            if *state == DispatcherState::Running {
                warn!("reminder dispatcher is already running");
                return None;
            }
            *state = DispatcherState::Running;
        }

        let dispatcher = self.clone();
        Some(tokio::spawn(async move {
            info!(interval_secs = dispatcher.poll_interval.as_secs(), "reminder dispatcher started");
            loop {
                dispatcher
                    .dispatch_due(&sink, Local::now().naive_local())
                    .await;
                if !dispatcher.is_running() {
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(dispatcher.poll_interval) => {}
                    _ = dispatcher.wakeup.notified() => {}
                }

                if !dispatcher.is_running() {
                    break;
                }
            }
            info!("reminder dispatcher stopped");
        }))
    }

    /// Running -> Stopped. Safe to call from any task; takes effect at the
    /// next cycle boundary, in-flight deliveries complete first.
    pub fn stop(&self) {
        *self.state.lock().unwrap() = DispatcherState::Stopped;
        // notify_one stores a permit, so a stop issued mid-batch still wakes
        // the sleeper that enters the select afterwards.
        self.wakeup.notify_one();
    }

    fn is_running(&self) -> bool {
        *self.state.lock().unwrap() == DispatcherState::Running
    }

    /// One dispatch cycle. Per-reminder failures are logged and retried next
    /// cycle; nothing here aborts the batch.
    pub async fn dispatch_due<K: ReminderSink>(&self, sink: &K, now: NaiveDateTime) {
        let due = match self.storage.due_reminders(now) {
            Ok(due) => due,
            Err(err) => {
                warn!(%err, "could not poll due reminders");
                return;
            }
        };

        for reminder in due {
            let appointment = match self.storage.appointment(reminder.appointment_id) {
                Ok(Some(appointment)) => appointment,
                Ok(None) => {
                    // Cancellation does not retract pending reminders.
                    warn!(reminder_id = %reminder.id, "appointment gone, skipping reminder");
                    continue;
                }
                Err(err) => {
                    warn!(reminder_id = %reminder.id, %err, "appointment lookup failed");
                    continue;
                }
            };

            let service_name = match self.storage.service(appointment.service_id) {
                Ok(Some(service)) => service.name,
                Ok(None) => {
                    warn!(reminder_id = %reminder.id, "service gone, skipping reminder");
                    continue;
                }
                Err(err) => {
                    warn!(reminder_id = %reminder.id, %err, "service lookup failed");
                    continue;
                }
            };

            let date = appointment.start.format("%d.%m.%Y").to_string();
            let time = appointment.start.format("%H:%M").to_string();
            match sink
                .deliver(appointment.user_id, &service_name, &date, &time)
                .await
            {
                Ok(()) => {
                    if let Err(err) = self.storage.mark_reminder_sent(reminder.id) {
                        // Will be re-delivered next cycle; downstream must
                        // tolerate the duplicate.
                        warn!(reminder_id = %reminder.id, %err, "delivered but could not mark sent");
                    }
                }
                Err(err) => {
                    warn!(reminder_id = %reminder.id, %err, "delivery failed, retrying next cycle");
                }
            }
        }
    }
}
