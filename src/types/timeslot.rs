use super::SlotId;
use serde::{Deserialize, Serialize};

/// A fixed-duration slot in the daily grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: SlotId,
    /// Minutes since midnight
    pub start_minutes: u32,
    pub duration_minutes: u32,
}

impl TimeSlot {
    pub fn end_minutes(&self) -> u32 {
        self.start_minutes + self.duration_minutes
    }

    /// True when [self.start, self.end) intersects [start, end)
    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        self.start_minutes < end && start < self.end_minutes()
    }
}

/// Build the ordered daily slot grid.
///
/// Advances a cursor from `day_start`; a slot that would straddle the lunch
/// window is skipped by jumping the cursor to the end of lunch, so classes
/// resume exactly when lunch ends. Slot ids are dense and 1-based.
pub fn build_time_grid(
    day_start: u32,
    day_end: u32,
    slot_duration: u32,
    lunch: Option<(u32, u32)>,
) -> Vec<TimeSlot> {
    let mut slots = Vec::new();
    if slot_duration == 0 {
        return slots;
    }

    let mut cursor = day_start;
    let mut next_id = 1u32;

    while cursor + slot_duration <= day_end {
        if let Some((lunch_start, lunch_end)) = lunch {
            if cursor < lunch_end && lunch_start < cursor + slot_duration {
                cursor = lunch_end;
                continue;
            }
        }

        slots.push(TimeSlot {
            id: SlotId(next_id),
            start_minutes: cursor,
            duration_minutes: slot_duration,
        });
        next_id += 1;
        cursor += slot_duration;
    }

    slots
}

/// Parse "HH:MM" into minutes since midnight
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.trim().split_once(':')?;
    let hours: u32 = h.trim().parse().ok()?;
    let minutes: u32 = m.trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Render minutes since midnight as a 12-hour clock string ("7:00 AM")
pub fn format_12h(minutes: u32) -> String {
    let minutes = minutes % (24 * 60);
    let hours = minutes / 60;
    let mins = minutes % 60;
    let (display, meridiem) = match hours {
        0 => (12, "AM"),
        1..=11 => (hours, "AM"),
        12 => (12, "PM"),
        _ => (hours - 12, "PM"),
    };
    format!("{}:{:02} {}", display, mins, meridiem)
}
