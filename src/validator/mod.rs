mod hard_constraints;

pub use hard_constraints::*;

use crate::types::{AllocationRecord, Room, RoomId};
use std::collections::BTreeMap;

/// A broken schedule-level guarantee found in published output
#[derive(Debug, Clone)]
pub struct Violation {
    pub constraint: String,
    pub message: String,
}

/// Result of auditing a published schedule
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
}

/// Audit a published allocation list against the schedule-level guarantees:
/// no double-booking of rooms, teachers, or cohorts, capacity and
/// lab-containment rules, and day-spacing per subject group.
pub fn audit_allocations(
    allocations: &[AllocationRecord],
    rooms: &[Room],
    capacity_tolerance: f64,
) -> AuditReport {
    let room_map: BTreeMap<RoomId, &Room> = rooms.iter().map(|r| (r.id, r)).collect();

    let mut violations = Vec::new();
    violations.extend(check_room_conflicts(allocations));
    violations.extend(check_teacher_conflicts(allocations));
    violations.extend(check_cohort_conflicts(allocations));
    violations.extend(check_capacity(allocations, &room_map, capacity_tolerance));
    violations.extend(check_lab_containment(allocations, &room_map));
    violations.extend(check_day_spacing(allocations));

    AuditReport {
        is_valid: violations.is_empty(),
        violations,
    }
}

/// The conflict counter surfaced in optimizer stats: room, teacher, and
/// cohort double-bookings only
pub fn count_conflicts(allocations: &[AllocationRecord]) -> u32 {
    (check_room_conflicts(allocations).len()
        + check_teacher_conflicts(allocations).len()
        + check_cohort_conflicts(allocations).len()) as u32
}
