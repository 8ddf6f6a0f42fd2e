use chrono::{NaiveTime, Weekday};
use clap::Parser;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::booking::BookingManager;
use crate::configuration::AppConfig;
use crate::memory_storage::MemoryStorage;
use crate::reminders::{ReminderDispatcher, ReminderSink};
use crate::storage::Storage;
use crate::types::DayHours;

mod booking;
mod configuration;
mod error;
mod http;
mod memory_storage;
mod reminders;
mod slots;
mod storage;
#[cfg(test)]
mod testutils;
mod types;

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub booking: BookingManager<S>,
}

#[derive(Parser, Debug)]
#[command(about = "Appointment booking and reminder service")]
struct Args {
    /// HTTP port, overrides PORT
    #[arg(long)]
    port: Option<u16>,
    /// Reminder poll interval in seconds, overrides REMINDER_POLL_SECS
    #[arg(long)]
    poll_secs: Option<u64>,
}

/// Stand-in delivery channel: logs the notice. The real messaging front-end
/// replaces this sink.
struct LogSink;

impl ReminderSink for LogSink {
    fn deliver(
        &self,
        user_id: i64,
        service_name: &str,
        date: &str,
        time: &str,
    ) -> BoxFuture<'static, Result<(), String>> {
        info!(user_id, service_name, date, time, "reminder due");
        async { Ok(()) }.boxed()
    }
}

fn seed_defaults(storage: &MemoryStorage) {
    let open = |h| NaiveTime::from_hms_opt(h, 0, 0);
    let weekdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];
    for weekday in weekdays {
        if let (Some(start), Some(end)) = (open(9), open(18)) {
            if let Err(err) = storage.set_working_hours(weekday, Some(DayHours { start, end })) {
                error!(%err, ?weekday, "seeding working hours failed");
            }
        }
    }
    if let (Some(start), Some(end)) = (open(10), open(15)) {
        if let Err(err) = storage.set_working_hours(Weekday::Sat, Some(DayHours { start, end })) {
            error!(%err, "seeding saturday hours failed");
        }
    }
    // Sunday stays closed.

    for (name, duration_minutes, price) in
        [("Consultation", 30, 20.0), ("Haircut", 60, 35.0), ("Coloring", 90, 80.0)]
    {
        if let Err(err) = storage.insert_service(name, duration_minutes, price) {
            error!(%err, name, "seeding service failed");
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(poll_secs) = args.poll_secs {
        config.poll_interval_secs = poll_secs;
    }

    let storage = MemoryStorage::default();
    seed_defaults(&storage);

    let dispatcher = ReminderDispatcher::new(storage.clone(), config.poll_interval());
    let _dispatcher_task = dispatcher.start(LogSink);

    let state = AppState {
        booking: BookingManager::new(storage, config.clone()),
    };
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port))
        .await
        .unwrap();
    info!(port = config.port, "listening");
    http::start_server(state, listener).await;
}
