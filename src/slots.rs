//! Slot generation and overlap exclusion. Pure interval arithmetic; fetching
//! working hours and same-day appointments is the caller's job.

use crate::types::{Appointment, DayHours};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Half-open interval intersection test. Touching endpoints do not overlap.
pub fn overlaps(
    start_a: NaiveDateTime,
    end_a: NaiveDateTime,
    start_b: NaiveDateTime,
    end_b: NaiveDateTime,
) -> bool {
    start_a < end_b && start_b < end_a
}

/// Candidate slot starts at `granularity` steps, from opening up to the last
/// start whose end still fits before closing. Empty when the duration exceeds
/// the whole working window.
fn candidate_starts(
    date: NaiveDate,
    hours: DayHours,
    granularity: Duration,
    duration: Duration,
) -> Vec<NaiveDateTime> {
    let close = date.and_time(hours.end);
    let mut candidates = Vec::new();
    let mut current = date.and_time(hours.start);
    while current + duration <= close {
        candidates.push(current);
        current += granularity;
    }
    candidates
}

/// Bookable slot starts for `date`, chronological, duplicates impossible by
/// construction. A closed day (no hours) yields an empty list; that is a
/// normal outcome, not an error.
pub fn available_slots(
    date: NaiveDate,
    duration_minutes: i64,
    hours: Option<DayHours>,
    existing: &[Appointment],
    granularity_minutes: i64,
) -> Vec<NaiveTime> {
    let Some(hours) = hours else {
        return Vec::new();
    };
    // Non-positive or unrepresentable durations can never fit a slot; a
    // degenerate granularity would stall candidate generation.
    let (Some(duration), Some(granularity)) = (
        Duration::try_minutes(duration_minutes),
        Duration::try_minutes(granularity_minutes),
    ) else {
        return Vec::new();
    };
    if duration <= Duration::zero() || granularity <= Duration::zero() {
        return Vec::new();
    }

    candidate_starts(date, hours, granularity, duration)
        .into_iter()
        .filter(|&slot_start| {
            let slot_end = slot_start + duration;
            !existing
                .iter()
                .any(|appointment| overlaps(slot_start, slot_end, appointment.start, appointment.end()))
        })
        .map(|slot_start| slot_start.time())
        .collect()
}
