use crate::error::StorageError;
use crate::types::{Appointment, DayHours, NewAppointment, Reminder, Service};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use uuid::Uuid;

/// Durable record of services, appointments, working hours and reminders.
/// Implementations serialize individual operations; multi-step flows get no
/// coordination beyond that, except where a single operation is documented
/// as one critical section.
pub trait Storage: Clone + Send + Sync + 'static {
    fn services(&self) -> Result<Vec<Service>, StorageError>;
    fn service(&self, id: Uuid) -> Result<Option<Service>, StorageError>;
    /// Admin seeding path, not part of the booking flow.
    fn insert_service(
        &self,
        name: &str,
        duration_minutes: i64,
        price: f64,
    ) -> Result<Uuid, StorageError>;

    fn working_hours(&self, weekday: Weekday) -> Result<Option<DayHours>, StorageError>;
    fn set_working_hours(
        &self,
        weekday: Weekday,
        hours: Option<DayHours>,
    ) -> Result<(), StorageError>;

    /// Conditional insert: re-checks for an overlapping appointment on the
    /// same date and inserts in one critical section. The loser of a
    /// concurrent booking gets [`StorageError::Conflict`].
    fn insert_appointment(&self, new: NewAppointment) -> Result<Uuid, StorageError>;
    fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, StorageError>;
    /// Deletes the appointment and, in the same critical section, every
    /// reminder referencing it. Returns false when nothing matched.
    fn delete_appointment(&self, id: Uuid) -> Result<bool, StorageError>;
    /// All appointments of one user, chronological. The future-only filter
    /// is applied by the caller.
    fn appointments_for_user(&self, user_id: i64) -> Result<Vec<Appointment>, StorageError>;
    /// Appointments whose date component falls in `from..=to`, chronological.
    fn appointments_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, StorageError>;

    fn insert_reminder(
        &self,
        appointment_id: Uuid,
        fire_at: NaiveDateTime,
    ) -> Result<Uuid, StorageError>;
    /// Unsent reminders with `fire_at <= now`, ordered by fire time.
    fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Reminder>, StorageError>;
    /// Flips the sent flag. Returns false when the reminder no longer exists.
    fn mark_reminder_sent(&self, id: Uuid) -> Result<bool, StorageError>;
}
