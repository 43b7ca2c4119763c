//! Shared fixtures for engine tests.

use super::compatibility::compute_compatible_rooms;
use super::context::Context;
use super::initial::plan_sessions;
use crate::types::{
    build_time_grid, Day, EngineConfig, FacultyProfile, LunchMode, Room, RoomId, Section,
    SectionId, SectionType, SplitGroup, TeacherId,
};
use std::collections::BTreeMap;

pub(crate) struct ContextSpec {
    pub sections: Vec<Section>,
    pub rooms: Vec<Room>,
    pub active_days: Vec<Day>,
    pub online_days: Vec<Day>,
    pub faculty: Vec<FacultyProfile>,
    pub config: EngineConfig,
    next_extra_id: i64,
}

impl Default for ContextSpec {
    fn default() -> Self {
        let mut config = EngineConfig::default();
        config.slot_duration_minutes = 90;
        config.lunch_mode = LunchMode::None;
        config.start_time = "07:00".to_string();
        config.end_time = "20:00".to_string();

        Self {
            sections: vec![
                make_section(1, "BSCS-1A", "CS101", 3, 0, None, Some(1)),
                make_section(3, "BSCS-1B", "CS102", 3, 0, None, Some(2)),
                make_section(4, "BSCS-2A", "CS201", 3, 0, None, Some(1)),
            ],
            rooms: vec![
                make_room(1, "Lecture Room", 40, "Main"),
                make_room(2, "Lecture Room", 40, "Main"),
                make_room(3, "Computer Lab", 30, "Annex"),
            ],
            active_days: vec![
                Day::Monday,
                Day::Tuesday,
                Day::Wednesday,
                Day::Thursday,
                Day::Friday,
                Day::Saturday,
            ],
            online_days: vec![],
            faculty: vec![],
            config,
            next_extra_id: 101,
        }
    }
}

impl ContextSpec {
    /// Append a section with a sequential id starting at 101. Codes
    /// containing `_LAB` become lab sections.
    pub fn add_section(
        &mut self,
        code: &str,
        hours: u32,
        split: Option<SplitGroup>,
        teacher: Option<i64>,
    ) {
        let id = self.next_extra_id;
        self.next_extra_id += 1;
        let is_lab = code.contains("_LAB");
        let mut section = make_section(
            id,
            code,
            "CS101",
            if is_lab { 0 } else { hours },
            if is_lab { hours } else { 0 },
            split,
            teacher,
        );
        if is_lab {
            section.section_type = SectionType::Lab;
        }
        self.sections.push(section);
    }
}

pub(crate) fn small_context(spec: ContextSpec) -> Context {
    let sections: BTreeMap<SectionId, Section> =
        spec.sections.into_iter().map(|s| (s.id, s)).collect();
    let rooms: BTreeMap<RoomId, Room> = spec.rooms.into_iter().map(|r| (r.id, r)).collect();

    let grid = build_time_grid(
        spec.config.day_open_minutes(),
        spec.config.closing_minutes(),
        spec.config.slot_duration_minutes,
        None,
    );
    let slots = grid.into_iter().map(|s| (s.id, s)).collect();

    let compatible = compute_compatible_rooms(&sections, &rooms, &spec.config);
    let needed_slots = sections
        .iter()
        .map(|(id, section)| {
            let total: u32 = plan_sessions(section, &spec.config)
                .iter()
                .map(|b| b.slot_count)
                .sum();
            (*id, total)
        })
        .collect();

    Context {
        sections,
        rooms,
        slots,
        active_days: spec.active_days,
        online_days: spec.online_days.into_iter().collect(),
        faculty: spec.faculty.into_iter().map(|p| (p.teacher_id, p)).collect(),
        compatible,
        needed_slots,
        config: spec.config,
    }
}

fn make_section(
    id: i64,
    code: &str,
    subject: &str,
    lec: u32,
    lab: u32,
    split: Option<SplitGroup>,
    teacher: Option<i64>,
) -> Section {
    Section {
        id: SectionId(id),
        section_code: code.to_string(),
        course_code: "BSCS".to_string(),
        subject_code: subject.to_string(),
        subject_name: format!("Subject {}", subject),
        teacher_id: teacher.map(TeacherId),
        teacher_name: teacher.map(|t| format!("Teacher {}", t)),
        year_level: 1,
        student_count: 30,
        required_room_type: String::new(),
        lec_hours: lec,
        lab_hours: lab,
        required_features: vec![],
        college: None,
        department: "CS".to_string(),
        section_type: if lab > 0 {
            SectionType::Lab
        } else {
            SectionType::Lecture
        },
        split_group: split,
        original_id: None,
        sibling_id: None,
        linked_id: None,
        pinned_day: None,
        pinned_room: None,
        pinned_slot: None,
        pinned_slot_count: None,
    }
}

fn make_room(id: i64, room_type: &str, capacity: u32, building: &str) -> Room {
    Room {
        id: RoomId(id),
        code: format!("R-{}", id),
        name: format!("Room {}", id),
        building: building.to_string(),
        campus: "Main".to_string(),
        capacity,
        room_type: room_type.to_string(),
        floor: 1,
        is_accessible: false,
        features: vec![],
        college: None,
    }
}
