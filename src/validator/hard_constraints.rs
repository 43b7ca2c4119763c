use crate::types::{base_code_of, AllocationRecord, Day, Room, RoomId, SlotId, TeacherId};
use crate::validator::Violation;
use std::collections::BTreeMap;

fn slot_keys(record: &AllocationRecord) -> impl Iterator<Item = SlotId> + '_ {
    (record.start_slot_id.0..record.start_slot_id.0 + record.slot_count).map(SlotId)
}

/// Check for room double-booking
pub fn check_room_conflicts(allocations: &[AllocationRecord]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen: BTreeMap<(RoomId, String, SlotId), &AllocationRecord> = BTreeMap::new();

    for record in allocations {
        let Some(room_id) = record.room_id else {
            continue;
        };
        for slot in slot_keys(record) {
            if let Some(other) = seen.insert((room_id, record.day.clone(), slot), record) {
                violations.push(Violation {
                    constraint: "NoRoomConflict".to_string(),
                    message: format!(
                        "Room {} double-booked on {} slot {} ('{}' vs '{}')",
                        room_id, record.day, slot, record.section_code, other.section_code
                    ),
                });
            }
        }
    }

    violations
}

/// Check for teacher double-booking; TBD assignments do not count
pub fn check_teacher_conflicts(allocations: &[AllocationRecord]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen: BTreeMap<(TeacherId, String, SlotId), &AllocationRecord> = BTreeMap::new();

    for record in allocations {
        if record.teacher_id.is_tbd() {
            continue;
        }
        for slot in slot_keys(record) {
            if let Some(other) = seen.insert((record.teacher_id, record.day.clone(), slot), record)
            {
                violations.push(Violation {
                    constraint: "NoTeacherConflict".to_string(),
                    message: format!(
                        "Teacher {} double-booked on {} slot {} ('{}' vs '{}')",
                        record.teacher_id,
                        record.day,
                        slot,
                        record.section_code,
                        other.section_code
                    ),
                });
            }
        }
    }

    violations
}

/// Check for cohort double-booking through the base-cohort hierarchy. G1
/// and G2 halves of the same cohort may overlap when their teachers differ.
pub fn check_cohort_conflicts(allocations: &[AllocationRecord]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut by_cell: BTreeMap<(String, String, SlotId), Vec<&AllocationRecord>> = BTreeMap::new();

    for record in allocations {
        let base = base_code_of(&record.section_code);
        for slot in slot_keys(record) {
            by_cell
                .entry((base.clone(), record.day.clone(), slot))
                .or_default()
                .push(record);
        }
    }

    for ((base, day, slot), records) in &by_cell {
        if records.len() < 2 {
            continue;
        }
        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                let a = records[i];
                let b = records[j];
                if a.section_id == b.section_id {
                    continue;
                }
                if cohort_records_conflict(a, b) {
                    violations.push(Violation {
                        constraint: "NoCohortConflict".to_string(),
                        message: format!(
                            "Cohort '{}' double-booked on {} slot {} ('{}' vs '{}')",
                            base, day, slot, a.section_code, b.section_code
                        ),
                    });
                }
            }
        }
    }

    violations
}

fn split_group_of(code: &str) -> Option<u8> {
    if code.contains("_G1") {
        Some(1)
    } else if code.contains("_G2") {
        Some(2)
    } else {
        None
    }
}

fn cohort_records_conflict(a: &AllocationRecord, b: &AllocationRecord) -> bool {
    match (split_group_of(&a.section_code), split_group_of(&b.section_code)) {
        (Some(ga), Some(gb)) if ga != gb => {
            !a.teacher_id.is_tbd() && !b.teacher_id.is_tbd() && a.teacher_id == b.teacher_id
        }
        _ => true,
    }
}

/// Check the capacity guarantee against the room roster
pub fn check_capacity(
    allocations: &[AllocationRecord],
    rooms: &BTreeMap<RoomId, &Room>,
    tolerance: f64,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for record in allocations {
        let Some(room) = record.room_id.and_then(|id| rooms.get(&id)) else {
            continue;
        };
        if record.student_count as f64 > room.capacity as f64 * (1.0 + tolerance) {
            violations.push(Violation {
                constraint: "RoomCapacity".to_string(),
                message: format!(
                    "Section '{}' has {} students in room '{}' (capacity {})",
                    record.section_code, record.student_count, room.code, room.capacity
                ),
            });
        }
    }

    violations
}

/// Labs must sit in lab rooms and may never be online
pub fn check_lab_containment(
    allocations: &[AllocationRecord],
    rooms: &BTreeMap<RoomId, &Room>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for record in allocations {
        if !record.is_lab {
            continue;
        }
        if record.is_online {
            violations.push(Violation {
                constraint: "LabInPerson".to_string(),
                message: format!(
                    "Lab section '{}' scheduled online on {}",
                    record.section_code, record.day
                ),
            });
            continue;
        }
        let lab_room = record
            .room_id
            .and_then(|id| rooms.get(&id))
            .map(|r| r.is_lab_room())
            .unwrap_or(false);
        if !lab_room {
            violations.push(Violation {
                constraint: "LabRoomRequired".to_string(),
                message: format!(
                    "Lab section '{}' placed outside a lab room on {}",
                    record.section_code, record.day
                ),
            });
        }
    }

    violations
}

/// Subject groups meet at most twice a week, never on adjacent days
pub fn check_day_spacing(allocations: &[AllocationRecord]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut group_days: BTreeMap<String, Vec<u8>> = BTreeMap::new();

    for record in allocations {
        let Some(day) = Day::parse(&record.day) else {
            continue;
        };
        let key = format!("{}::{}", base_code_of(&record.section_code), record.subject_code);
        let days = group_days.entry(key).or_default();
        if !days.contains(&day.index()) {
            days.push(day.index());
        }
    }

    for (group, mut days) in group_days {
        days.sort_unstable();
        for pair in days.windows(2) {
            if pair[1] - pair[0] == 1 {
                violations.push(Violation {
                    constraint: "NonConsecutiveDays".to_string(),
                    message: format!("Subject group '{}' meets on adjacent days", group),
                });
            }
        }
        if days.len() > 2 {
            violations.push(Violation {
                constraint: "MaxSessionsPerWeek".to_string(),
                message: format!(
                    "Subject group '{}' meets on {} days (max 2)",
                    group,
                    days.len()
                ),
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, SectionId};

    fn record(
        section_id: i64,
        code: &str,
        day: &str,
        start: u32,
        count: u32,
        room: Option<i64>,
        teacher: i64,
    ) -> AllocationRecord {
        AllocationRecord {
            section_id: SectionId(section_id),
            section_code: code.to_string(),
            course_code: "BSCS".to_string(),
            subject_code: "CS101".to_string(),
            subject_name: "Intro".to_string(),
            room_id: room.map(RoomId),
            room_code: room.map(|r| format!("R-{}", r)),
            room_name: None,
            building: None,
            day: day.to_string(),
            start_time: "7:00 AM".to_string(),
            end_time: "8:30 AM".to_string(),
            start_slot_id: SlotId(start),
            slot_count: count,
            teacher_id: TeacherId(teacher),
            teacher_name: if teacher == 0 {
                "TBD".to_string()
            } else {
                format!("Teacher {}", teacher)
            },
            year_level: 1,
            student_count: 30,
            department: "CS".to_string(),
            college: None,
            is_lab: false,
            lec_hours: 3,
            lab_hours: 0,
            is_online: room.is_none(),
            section_type: "lecture".to_string(),
            component: Component::Lec,
            original_section_id: None,
            sibling_id: None,
        }
    }

    #[test]
    fn test_detects_room_conflict() {
        let allocations = vec![
            record(1, "BSCS-1A", "monday", 1, 2, Some(1), 1),
            record(2, "BSCS-1B", "monday", 2, 2, Some(1), 2),
        ];
        assert!(!check_room_conflicts(&allocations).is_empty());
    }

    #[test]
    fn test_detects_teacher_conflict_but_not_tbd() {
        let double = vec![
            record(1, "BSCS-1A", "monday", 1, 2, Some(1), 5),
            record(2, "BSCS-1B", "monday", 1, 2, Some(2), 5),
        ];
        assert_eq!(check_teacher_conflicts(&double).len(), 2);

        let tbd = vec![
            record(1, "BSCS-1A", "monday", 1, 2, Some(1), 0),
            record(2, "BSCS-1B", "monday", 1, 2, Some(2), 0),
        ];
        assert!(check_teacher_conflicts(&tbd).is_empty());
    }

    #[test]
    fn test_cohort_hierarchy_and_split_exemption() {
        // Anchor lecture vs G1 satellite: conflict
        let overlapping = vec![
            record(1, "BSCS-1A_LEC", "monday", 1, 2, Some(1), 1),
            record(2, "BSCS-1A_G1_LAB", "monday", 1, 2, Some(2), 2),
        ];
        assert!(!check_cohort_conflicts(&overlapping).is_empty());

        // G1 vs G2 with different teachers: allowed
        let split = vec![
            record(1, "BSCS-1A_G1_LAB", "monday", 1, 2, Some(1), 1),
            record(2, "BSCS-1A_G2_LAB", "monday", 1, 2, Some(2), 2),
        ];
        assert!(check_cohort_conflicts(&split).is_empty());

        // Same teacher on both halves: conflict
        let shared = vec![
            record(1, "BSCS-1A_G1_LAB", "monday", 1, 2, Some(1), 1),
            record(2, "BSCS-1A_G2_LAB", "monday", 1, 2, Some(2), 1),
        ];
        assert!(!check_cohort_conflicts(&shared).is_empty());
    }

    #[test]
    fn test_day_spacing_rules() {
        let adjacent = vec![
            record(1, "BSCS-1A", "monday", 1, 2, Some(1), 1),
            record(1, "BSCS-1A", "tuesday", 1, 2, Some(1), 1),
        ];
        assert!(!check_day_spacing(&adjacent).is_empty());

        let spaced = vec![
            record(1, "BSCS-1A", "monday", 1, 2, Some(1), 1),
            record(1, "BSCS-1A", "thursday", 1, 2, Some(1), 1),
        ];
        assert!(check_day_spacing(&spaced).is_empty());
    }
}
