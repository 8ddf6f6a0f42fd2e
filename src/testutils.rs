use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use chrono::{Local, NaiveDate, NaiveDateTime, Weekday};
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::Storage;
use crate::types::{Appointment, DayHours, NewAppointment, Reminder, Service};

pub struct MockStorageInner {
    pub success: AtomicBool,
    pub fail_insert_reminder: AtomicBool,
    pub calls_to_services: AtomicU64,
    pub calls_to_working_hours: AtomicU64,
    pub calls_to_insert_appointment: AtomicU64,
    pub calls_to_delete_appointment: AtomicU64,
    pub calls_to_appointments_for_user: AtomicU64,
    pub calls_to_appointments_in_range: AtomicU64,
    pub calls_to_insert_reminder: AtomicU64,
    pub calls_to_mark_reminder_sent: AtomicU64,
    pub services: Mutex<HashMap<Uuid, Service>>,
    pub working_week: Mutex<[Option<DayHours>; 7]>,
    pub appointments: Mutex<HashMap<Uuid, Appointment>>,
    pub reminders: Mutex<HashMap<Uuid, Reminder>>,
}

/// Hand-rolled Storage double; tests flip `success` to exercise the
/// unavailable-backend paths and read the call counters afterwards.
#[derive(Clone)]
pub struct MockStorage(pub Arc<MockStorageInner>);

impl MockStorage {
    pub fn new() -> Self {
        Self(Arc::new(MockStorageInner {
            success: AtomicBool::new(true),
            fail_insert_reminder: AtomicBool::new(false),
            calls_to_services: AtomicU64::default(),
            calls_to_working_hours: AtomicU64::default(),
            calls_to_insert_appointment: AtomicU64::default(),
            calls_to_delete_appointment: AtomicU64::default(),
            calls_to_appointments_for_user: AtomicU64::default(),
            calls_to_appointments_in_range: AtomicU64::default(),
            calls_to_insert_reminder: AtomicU64::default(),
            calls_to_mark_reminder_sent: AtomicU64::default(),
            services: Mutex::default(),
            working_week: Mutex::default(),
            appointments: Mutex::default(),
            reminders: Mutex::default(),
        }))
    }

    fn check(&self) -> Result<(), StorageError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(StorageError::Unavailable("Supposed to fail".into())),
        }
    }
}

impl Storage for MockStorage {
    fn services(&self) -> Result<Vec<Service>, StorageError> {
        self.0.calls_to_services.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.0.services.lock().unwrap().values().cloned().collect())
    }

    fn service(&self, id: Uuid) -> Result<Option<Service>, StorageError> {
        self.check()?;
        Ok(self.0.services.lock().unwrap().get(&id).cloned())
    }

    fn insert_service(
        &self,
        name: &str,
        duration_minutes: i64,
        price: f64,
    ) -> Result<Uuid, StorageError> {
        self.check()?;
        let id = Uuid::new_v4();
        self.0.services.lock().unwrap().insert(
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
        self.0.calls_to_working_hours.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.0.working_week.lock().unwrap()[weekday.num_days_from_monday() as usize])
    }

    fn set_working_hours(
        &self,
        weekday: Weekday,
        hours: Option<DayHours>,
    ) -> Result<(), StorageError> {
        self.check()?;
        self.0.working_week.lock().unwrap()[weekday.num_days_from_monday() as usize] = hours;
        Ok(())
    }

    fn insert_appointment(&self, new: NewAppointment) -> Result<Uuid, StorageError> {
        self.0
            .calls_to_insert_appointment
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let id = Uuid::new_v4();
        self.0.appointments.lock().unwrap().insert(
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
        self.check()?;
        Ok(self.0.appointments.lock().unwrap().get(&id).cloned())
    }

    fn delete_appointment(&self, id: Uuid) -> Result<bool, StorageError> {
        self.0
            .calls_to_delete_appointment
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.0
            .reminders
            .lock()
            .unwrap()
            .retain(|_, reminder| reminder.appointment_id != id);
        Ok(self.0.appointments.lock().unwrap().remove(&id).is_some())
    }

    fn appointments_for_user(&self, user_id: i64) -> Result<Vec<Appointment>, StorageError> {
        self.0
            .calls_to_appointments_for_user
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut appointments: Vec<Appointment> = self
            .0
            .appointments
            .lock()
            .unwrap()
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
        self.0
            .calls_to_appointments_in_range
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut appointments: Vec<Appointment> = self
            .0
            .appointments
            .lock()
            .unwrap()
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
        self.0
            .calls_to_insert_reminder
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.0.fail_insert_reminder.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("Supposed to fail".into()));
        }
        let id = Uuid::new_v4();
        self.0.reminders.lock().unwrap().insert(
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
        self.check()?;
        Ok(self
            .0
            .reminders
            .lock()
            .unwrap()
            .values()
            .filter(|reminder| !reminder.sent && reminder.fire_at <= now)
            .cloned()
            .collect())
    }

    fn mark_reminder_sent(&self, id: Uuid) -> Result<bool, StorageError> {
        self.0
            .calls_to_mark_reminder_sent
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        match self.0.reminders.lock().unwrap().get_mut(&id) {
            Some(reminder) => {
                reminder.sent = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
