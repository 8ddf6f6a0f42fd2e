use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable reference data, seeded by the admin path and never touched by
/// the booking flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
}

/// Open/close interval for one weekday. `start < end`; a closed day is
/// represented by the entry being absent, not by a degenerate interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: i64,
    pub user_name: String,
    pub service_id: Uuid,
    #[serde(with = "minute_format")]
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
    #[serde(with = "second_format")]
    pub created_at: NaiveDateTime,
}

/// Appointment fields supplied by the caller; id and created_at are assigned
/// at insert time.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: i64,
    pub user_name: String,
    pub service_id: Uuid,
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub appointment_id: Uuid,
    #[serde(with = "second_format")]
    pub fire_at: NaiveDateTime,
    pub sent: bool,
}

impl Appointment {
    pub fn end(&self) -> NaiveDateTime {
        self.start + chrono::Duration::minutes(self.duration_minutes)
    }
}

/// Appointment start timestamps are persisted with minute precision.
pub mod minute_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M";

    pub fn serialize<S>(datetime: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&datetime.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Reminder fire times carry seconds.
pub mod second_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(datetime: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&datetime.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
