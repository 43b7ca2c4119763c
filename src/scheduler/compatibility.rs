use crate::types::{EngineConfig, Room, RoomId, Section, SectionId};
use std::collections::BTreeMap;

/// Phase 3: precompute the rooms each section may use.
///
/// Four passes of decreasing strictness; the first pass yielding candidates
/// wins. Results are ordered tightest-capacity-fit first so the greedy
/// builder and the move generator both prefer snug rooms.
pub fn compute_compatible_rooms(
    sections: &BTreeMap<SectionId, Section>,
    rooms: &BTreeMap<RoomId, Room>,
    config: &EngineConfig,
) -> BTreeMap<SectionId, Vec<RoomId>> {
    let mut compatible = BTreeMap::new();

    for (id, section) in sections {
        let mut candidates = filter_rooms(section, rooms, config, Pass::Strict);

        if candidates.is_empty() && !section.needs_lab_room() {
            candidates = filter_rooms(section, rooms, config, Pass::LectureInLab);
        }
        if candidates.is_empty() && section.needs_lab_room() {
            candidates = filter_rooms(section, rooms, config, Pass::RelaxedLabCapacity);
        }
        if candidates.is_empty() && !section.needs_lab_room() {
            candidates = filter_rooms(section, rooms, config, Pass::DropFeatures);
        }

        candidates.sort_by_key(|room_id| {
            let room = &rooms[room_id];
            (
                (room.capacity as i64 - section.student_count as i64).abs(),
                *room_id,
            )
        });

        compatible.insert(*id, candidates);
    }

    compatible
}

#[derive(Clone, Copy, PartialEq)]
enum Pass {
    Strict,
    /// Lectures may borrow lab rooms
    LectureInLab,
    /// Labs accept rooms down to 70% of the cohort size
    RelaxedLabCapacity,
    /// Lectures drop the equipment requirement
    DropFeatures,
}

fn filter_rooms(
    section: &Section,
    rooms: &BTreeMap<RoomId, Room>,
    config: &EngineConfig,
    pass: Pass,
) -> Vec<RoomId> {
    let needs_lab = section.needs_lab_room();
    let n = section.student_count as f64;

    rooms
        .values()
        .filter(|room| {
            if !room.allows_college(section.college.as_deref()) {
                return false;
            }

            let cap = room.capacity as f64;
            let capacity_ok = match pass {
                Pass::RelaxedLabCapacity => cap >= 0.7 * n,
                _ if needs_lab => cap >= n,
                _ => cap >= n * (1.0 - config.capacity_tolerance),
            };
            if !capacity_ok {
                return false;
            }

            if pass != Pass::DropFeatures && !room.has_features(&section.required_features) {
                return false;
            }

            if needs_lab {
                // Labs never leave lab rooms, on any pass
                room.is_lab_room()
            } else {
                match pass {
                    Pass::Strict | Pass::DropFeatures => !room.is_lab_room(),
                    Pass::LectureInLab => true,
                    Pass::RelaxedLabCapacity => false,
                }
            }
        })
        .map(|room| room.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SectionType, TeacherId};

    fn section(id: i64, students: u32, lab_hours: u32, features: Vec<&str>) -> Section {
        Section {
            id: SectionId(id),
            section_code: format!("SEC-{}", id),
            course_code: "BSCS".to_string(),
            subject_code: "CS101".to_string(),
            subject_name: "Intro".to_string(),
            teacher_id: Some(TeacherId(1)),
            teacher_name: None,
            year_level: 1,
            student_count: students,
            required_room_type: String::new(),
            lec_hours: if lab_hours == 0 { 3 } else { 0 },
            lab_hours,
            required_features: features.into_iter().map(String::from).collect(),
            college: Some("CICT".to_string()),
            department: "CS".to_string(),
            section_type: if lab_hours > 0 {
                SectionType::Lab
            } else {
                SectionType::Lecture
            },
            split_group: None,
            original_id: None,
            sibling_id: None,
            linked_id: None,
            pinned_day: None,
            pinned_room: None,
            pinned_slot: None,
            pinned_slot_count: None,
        }
    }

    fn room(id: i64, room_type: &str, capacity: u32, college: Option<&str>) -> Room {
        Room {
            id: RoomId(id),
            code: format!("R-{}", id),
            name: format!("Room {}", id),
            building: "Main".to_string(),
            campus: String::new(),
            capacity,
            room_type: room_type.to_string(),
            floor: 1,
            is_accessible: false,
            features: vec![],
            college: college.map(String::from),
        }
    }

    fn table(
        sections: Vec<Section>,
        rooms: Vec<Room>,
    ) -> BTreeMap<SectionId, Vec<RoomId>> {
        let sections: BTreeMap<_, _> = sections.into_iter().map(|s| (s.id, s)).collect();
        let rooms: BTreeMap<_, _> = rooms.into_iter().map(|r| (r.id, r)).collect();
        compute_compatible_rooms(&sections, &rooms, &EngineConfig::default())
    }

    #[test]
    fn test_tight_fit_ordering() {
        let result = table(
            vec![section(1, 30, 0, vec![])],
            vec![
                room(1, "Lecture Room", 100, None),
                room(2, "Lecture Room", 35, None),
                room(3, "Lecture Room", 60, None),
            ],
        );
        assert_eq!(result[&SectionId(1)], vec![RoomId(2), RoomId(3), RoomId(1)]);
    }

    #[test]
    fn test_lab_sections_never_get_lecture_rooms() {
        let result = table(
            vec![section(1, 30, 3, vec![])],
            vec![
                room(1, "Lecture Room", 100, None),
                room(2, "Computer Lab", 10, None),
            ],
        );
        // Lecture room excluded; lab room too small even at the 70% pass
        assert!(result[&SectionId(1)].is_empty());
    }

    #[test]
    fn test_lab_capacity_relaxation() {
        let result = table(
            vec![section(1, 40, 3, vec![])],
            vec![room(1, "Computer Lab", 30, None)],
        );
        // 30 >= 0.7 * 40 on the relaxed pass
        assert_eq!(result[&SectionId(1)], vec![RoomId(1)]);
    }

    #[test]
    fn test_lecture_falls_back_to_lab_room() {
        let result = table(
            vec![section(1, 30, 0, vec![])],
            vec![room(1, "Computer Lab", 40, None)],
        );
        assert_eq!(result[&SectionId(1)], vec![RoomId(1)]);
    }

    #[test]
    fn test_college_gate_is_never_relaxed() {
        let result = table(
            vec![section(1, 30, 0, vec![])],
            vec![room(1, "Lecture Room", 40, Some("COE"))],
        );
        assert!(result[&SectionId(1)].is_empty());
    }

    #[test]
    fn test_feature_requirement_dropped_for_lectures_only() {
        let lecture = section(1, 30, 0, vec!["drafting_tables"]);
        let lab = section(2, 30, 3, vec!["drafting_tables"]);
        let result = table(
            vec![lecture, lab],
            vec![
                room(1, "Lecture Room", 40, None),
                room(2, "Computer Lab", 40, None),
            ],
        );
        // Lecture recovers via the drop-features pass; lab stays empty
        assert_eq!(result[&SectionId(1)], vec![RoomId(1)]);
        assert!(result[&SectionId(2)].is_empty());
    }
}
