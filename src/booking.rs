use crate::configuration::AppConfig;
use crate::error::{BookingError, StorageError};
use crate::slots;
use crate::storage::Storage;
use crate::types::{Appointment, NewAppointment, Service};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates slot lookup, booking confirmation, cancellation and reminder
/// scheduling on top of a [`Storage`] backend.
#[derive(Debug, Clone)]
pub struct BookingManager<S: Storage> {
    storage: S,
    config: AppConfig,
}

impl<S: Storage> BookingManager<S> {
    pub fn new(storage: S, config: AppConfig) -> Self {
        Self { storage, config }
    }

    pub fn services(&self) -> Result<Vec<Service>, BookingError> {
        self.storage.services().map_err(BookingError::storage)
    }

    /// Bookable slot starts for `date`, chronological. A day without working
    /// hours yields an empty list. Past dates are not rejected here; that
    /// check belongs to the caller.
    pub fn available_slots(
        &self,
        date: NaiveDate,
        duration_minutes: i64,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        let hours = self
            .storage
            .working_hours(date.weekday())
            .map_err(BookingError::storage)?;
        let existing = self
            .storage
            .appointments_in_range(date, date)
            .map_err(BookingError::storage)?;

        Ok(slots::available_slots(
            date,
            duration_minutes,
            hours,
            &existing,
            self.config.slot_granularity_minutes,
        ))
    }

    /// Persists the appointment and its reminder, returning the appointment
    /// id. The storage backend re-checks overlap at insert time, so a caller
    /// that lost a race for the slot gets [`BookingError::SlotConflict`].
    pub fn confirm_booking(
        &self,
        user_id: i64,
        user_name: &str,
        service_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i64,
    ) -> Result<Uuid, BookingError> {
        match self.storage.service(service_id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(BookingError::NotFound(service_id)),
            Err(err) => return Err(BookingError::storage(err)),
        }

        let start = date.and_time(time);
        let appointment_id = self
            .storage
            .insert_appointment(NewAppointment {
                user_id,
                user_name: user_name.into(),
                service_id,
                start,
                duration_minutes,
            })
            .map_err(|err| match err {
                StorageError::Conflict => BookingError::SlotConflict(start),
                other => BookingError::storage(other),
            })?;

        let fire_at = start - self.config.reminder_lead();
        if let Err(err) = self.storage.insert_reminder(appointment_id, fire_at) {
            // Roll the appointment back, otherwise the slot stays consumed
            // by a booking the caller was told failed.
            if let Err(cleanup_err) = self.storage.delete_appointment(appointment_id) {
                warn!(%appointment_id, %cleanup_err, "could not roll back appointment after reminder failure");
            }
            return Err(BookingError::storage(err));
        }

        info!(%appointment_id, user_id, start = %start, "booking confirmed");
        Ok(appointment_id)
    }

    /// Hard-deletes the appointment (reminders cascade). Only the owner may
    /// cancel.
    pub fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        requesting_user: i64,
    ) -> Result<(), BookingError> {
        let appointment = self
            .storage
            .appointment(appointment_id)
            .map_err(BookingError::storage)?
            .ok_or(BookingError::NotFound(appointment_id))?;

        if appointment.user_id != requesting_user {
            return Err(BookingError::NotOwner(appointment_id));
        }

        let deleted = self
            .storage
            .delete_appointment(appointment_id)
            .map_err(BookingError::storage)?;
        if !deleted {
            return Err(BookingError::NotFound(appointment_id));
        }

        info!(%appointment_id, user_id = requesting_user, "appointment cancelled");
        Ok(())
    }

    /// Upcoming appointments of one user, chronological. Past records are
    /// filtered out, not reported as an error.
    pub fn user_appointments(&self, user_id: i64) -> Result<Vec<Appointment>, BookingError> {
        let appointments = self
            .storage
            .appointments_for_user(user_id)
            .map_err(BookingError::storage)?;
        Ok(future_only(appointments, Local::now().naive_local()))
    }
}

fn future_only(appointments: Vec<Appointment>, now: NaiveDateTime) -> Vec<Appointment> {
    appointments
        .into_iter()
        .filter(|appointment| appointment.start > now)
        .collect()
}
