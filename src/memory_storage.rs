use crate::error::StorageError;
use crate::slots::overlaps;
use crate::storage::Storage;
use crate::types::{Appointment, DayHours, NewAppointment, Reminder, Service};
use chrono::{Local, NaiveDate, NaiveDateTime, Weekday};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use uuid::Uuid;

/// In-process storage backend. Every trait operation runs under one mutex,
/// which is what makes the conditional appointment insert a single critical
/// section.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    services: HashMap<Uuid, Service>,
    working_week: [Option<DayHours>; 7],
    appointments: HashMap<Uuid, Appointment>,
    reminders: HashMap<Uuid, Reminder>,
}

impl MemoryStorage {
    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Unavailable("storage mutex poisoned".into()))
    }
}

fn weekday_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

impl Storage for MemoryStorage {
    fn services(&self) -> Result<Vec<Service>, StorageError> {
        let inner = self.lock()?;
        let mut services: Vec<Service> = inner.services.values().cloned().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    fn service(&self, id: Uuid) -> Result<Option<Service>, StorageError> {
        Ok(self.lock()?.services.get(&id).cloned())
    }

    fn insert_service(
        &self,
        name: &str,
        duration_minutes: i64,
        price: f64,
    ) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        self.lock()?.services.insert(
            id,
            Service {
                id,
                name: name.into(),
                duration_minutes,
                price,
            },
        );
        Ok(id)
    }

    fn working_hours(&self, weekday: Weekday) -> Result<Option<DayHours>, StorageError> {
        Ok(self.lock()?.working_week[weekday_index(weekday)])
    }

    fn set_working_hours(
        &self,
        weekday: Weekday,
        hours: Option<DayHours>,
    ) -> Result<(), StorageError> {
        self.lock()?.working_week[weekday_index(weekday)] = hours;
        Ok(())
    }

    fn insert_appointment(&self, new: NewAppointment) -> Result<Uuid, StorageError> {
        let mut inner = self.lock()?;

        let end = new.start + chrono::Duration::minutes(new.duration_minutes);
        let taken = inner
            .appointments
            .values()
            .filter(|existing| existing.start.date() == new.start.date())
            .any(|existing| overlaps(new.start, end, existing.start, existing.end()));
        if taken {
            return Err(StorageError::Conflict);
        }

        let id = Uuid::new_v4();
        inner.appointments.insert(
            id,
            Appointment {
                id,
                user_id: new.user_id,
                user_name: new.user_name,
                service_id: new.service_id,
                start: new.start,
                duration_minutes: new.duration_minutes,
                created_at: Local::now().naive_local(),
            },
        );
        Ok(id)
    }

    fn appointment(&self, id: Uuid) -> Result<Option<Appointment>, StorageError> {
        Ok(self.lock()?.appointments.get(&id).cloned())
    }

    fn delete_appointment(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut inner = self.lock()?;
        inner
            .reminders
            .retain(|_, reminder| reminder.appointment_id != id);
        Ok(inner.appointments.remove(&id).is_some())
    }

    fn appointments_for_user(&self, user_id: i64) -> Result<Vec<Appointment>, StorageError> {
        let inner = self.lock()?;
        let mut appointments: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|appointment| appointment.user_id == user_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|appointment| appointment.start);
        Ok(appointments)
    }

    fn appointments_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, StorageError> {
        let inner = self.lock()?;
        let mut appointments: Vec<Appointment> = inner
            .appointments
            .values()
            .filter(|appointment| {
                let date = appointment.start.date();
                from <= date && date <= to
            })
            .cloned()
            .collect();
        appointments.sort_by_key(|appointment| appointment.start);
        Ok(appointments)
    }

    fn insert_reminder(
        &self,
        appointment_id: Uuid,
        fire_at: NaiveDateTime,
    ) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        self.lock()?.reminders.insert(
            id,
            Reminder {
                id,
                appointment_id,
                fire_at,
                sent: false,
            },
        );
        Ok(id)
    }

    fn due_reminders(&self, now: NaiveDateTime) -> Result<Vec<Reminder>, StorageError> {
        let inner = self.lock()?;
        let mut due: Vec<Reminder> = inner
            .reminders
            .values()
            .filter(|reminder| !reminder.sent && reminder.fire_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|reminder| reminder.fire_at);
        Ok(due)
    }

    fn mark_reminder_sent(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut inner = self.lock()?;
        match inner.reminders.get_mut(&id) {
            Some(reminder) => {
                reminder.sent = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
