//! Slot arithmetic: the pure core of the availability engine.
//!
//! Everything here is deterministic and I/O-free; the surrounding services
//! feed it availability windows and booked appointments fetched from the
//! store.

use chrono::{NaiveTime, Timelike};
use std::collections::HashSet;

use crate::models::{DaySchedule, Slot, SlotDecision, UnavailableReason};

/// Fixed appointment length. Not configurable per call.
pub const SLOT_DURATION_MINUTES: u32 = 30;

/// Restartable iterator over the candidate start times of one availability
/// window. A slot is emitted only when it fits entirely before closing time,
/// so a partial trailing remainder is silently dropped.
#[derive(Debug, Clone)]
pub struct SlotIter {
    next_sec: u32,
    end_sec: u32,
    step_sec: u32,
}

impl Iterator for SlotIter {
    type Item = NaiveTime;

    fn next(&mut self) -> Option<NaiveTime> {
        if self.next_sec + self.step_sec > self.end_sec {
            return None;
        }
        let slot = NaiveTime::from_num_seconds_from_midnight_opt(self.next_sec, 0)?;
        self.next_sec += self.step_sec;
        Some(slot)
    }
}

/// Candidate slots for a `[start, end)` window in ascending order.
/// `start == end` (and any window shorter than one slot) yields nothing.
pub fn slots_in_window(start: NaiveTime, end: NaiveTime) -> SlotIter {
    SlotIter {
        next_sec: start.num_seconds_from_midnight(),
        end_sec: end.num_seconds_from_midnight(),
        step_sec: SLOT_DURATION_MINUTES * 60,
    }
}

/// Canonical `HH:MM` form. Source data may carry a trailing seconds
/// component (`14:00:00`), which must compare equal to `14:00`.
pub fn normalize_time(value: &str) -> Option<String> {
    let time = NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()?;
    Some(time.format("%H:%M").to_string())
}

/// Day view for one open window: every candidate slot, marked against the
/// normalized times already held by active appointments.
pub fn build_day_schedule(start: NaiveTime, end: NaiveTime, taken_times: &[String]) -> DaySchedule {
    let taken: HashSet<String> = taken_times
        .iter()
        .filter_map(|t| normalize_time(t))
        .collect();

    let slots: Vec<Slot> = slots_in_window(start, end)
        .map(|t| {
            let time = t.format("%H:%M").to_string();
            let available = !taken.contains(&time);
            Slot { time, available }
        })
        .collect();

    let any_open = slots.iter().any(|s| s.available);
    // An empty window (start == end) is closed but carries no reason; only a
    // day whose every generated slot is held reports fully_booked.
    let reason = if !any_open && !slots.is_empty() {
        Some(UnavailableReason::FullyBooked)
    } else {
        None
    };

    DaySchedule {
        available: any_open,
        reason,
        slots,
    }
}

/// The closed-day schedule, returned without consulting appointments at all.
pub fn inactive_day_schedule() -> DaySchedule {
    DaySchedule {
        available: false,
        reason: Some(UnavailableReason::DayInactive),
        slots: vec![],
    }
}

/// Classify one requested time against a day's generated slots.
///
/// A time that matches no generated slot (outside hours, or off the
/// 30-minute grid) is out-of-bounds, never "fully booked" — the two cases
/// drive different alternative-offering flows downstream.
pub fn classify_request(schedule: &DaySchedule, requested: &str) -> SlotDecision {
    if schedule.reason == Some(UnavailableReason::DayInactive) {
        return SlotDecision::DayInactive;
    }

    let requested = match normalize_time(requested) {
        Some(t) => t,
        None => return SlotDecision::TimeOutOfBounds,
    };

    let Some(slot) = schedule.slots.iter().find(|s| s.time == requested) else {
        return SlotDecision::TimeOutOfBounds;
    };

    if slot.available {
        SlotDecision::Bookable
    } else {
        let alternatives = schedule
            .slots
            .iter()
            .filter(|s| s.available)
            .map(|s| s.time.clone())
            .collect();
        SlotDecision::FullyBooked { alternatives }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_count_is_floor_of_window_over_duration() {
        assert_eq!(slots_in_window(t(9, 0), t(10, 0)).count(), 2);
        assert_eq!(slots_in_window(t(9, 0), t(10, 15)).count(), 2);
        assert_eq!(slots_in_window(t(9, 0), t(9, 29)).count(), 0);
        assert_eq!(slots_in_window(t(9, 0), t(9, 0)).count(), 0);
        assert_eq!(slots_in_window(t(9, 0), t(17, 0)).count(), 16);
    }

    #[test]
    fn slots_fit_entirely_inside_the_window() {
        let end = t(11, 15);
        for slot in slots_in_window(t(9, 0), end) {
            assert!(slot >= t(9, 0));
            let slot_end =
                slot.num_seconds_from_midnight() + SLOT_DURATION_MINUTES * 60;
            assert!(slot_end <= end.num_seconds_from_midnight());
        }
    }

    #[test]
    fn iterator_is_restartable() {
        let iter = slots_in_window(t(9, 0), t(10, 0));
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![t(9, 0), t(9, 30)]);
    }

    #[test]
    fn normalize_strips_seconds() {
        assert_eq!(normalize_time("14:00:00").as_deref(), Some("14:00"));
        assert_eq!(normalize_time("14:00").as_deref(), Some("14:00"));
        assert_eq!(normalize_time("9:5").as_deref(), Some("09:05"));
        assert_eq!(normalize_time("not a time"), None);
    }

    #[test]
    fn booked_time_with_seconds_marks_slot_taken() {
        let schedule = build_day_schedule(t(9, 0), t(10, 0), &["09:30:00".to_string()]);
        assert_eq!(
            schedule.slots,
            vec![
                Slot { time: "09:00".to_string(), available: true },
                Slot { time: "09:30".to_string(), available: false },
            ]
        );
        assert!(schedule.available);
    }

    #[test]
    fn fully_booked_day_reports_reason() {
        let taken = vec!["09:00".to_string(), "09:30:00".to_string()];
        let schedule = build_day_schedule(t(9, 0), t(10, 0), &taken);
        assert!(!schedule.available);
        assert_eq!(schedule.reason, Some(UnavailableReason::FullyBooked));
    }

    #[test]
    fn classify_open_slot_is_bookable() {
        let schedule = build_day_schedule(t(9, 0), t(10, 0), &[]);
        assert_eq!(classify_request(&schedule, "09:30"), SlotDecision::Bookable);
    }

    #[test]
    fn classify_taken_slot_offers_remaining_alternatives() {
        let schedule = build_day_schedule(t(9, 0), t(10, 0), &["09:30:00".to_string()]);
        assert_eq!(
            classify_request(&schedule, "09:30"),
            SlotDecision::FullyBooked { alternatives: vec!["09:00".to_string()] }
        );
    }

    #[test]
    fn classify_off_grid_or_out_of_hours_is_out_of_bounds() {
        let schedule = build_day_schedule(t(9, 0), t(10, 0), &[]);
        assert_eq!(classify_request(&schedule, "11:00"), SlotDecision::TimeOutOfBounds);
        assert_eq!(classify_request(&schedule, "09:10"), SlotDecision::TimeOutOfBounds);
        assert_eq!(classify_request(&schedule, "garbage"), SlotDecision::TimeOutOfBounds);
    }

    #[test]
    fn classify_inactive_day_short_circuits() {
        let schedule = inactive_day_schedule();
        assert_eq!(classify_request(&schedule, "09:00"), SlotDecision::DayInactive);
    }
}
