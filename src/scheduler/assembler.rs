use super::context::Context;
use super::state::ScheduleState;
use crate::types::{format_12h, AllocationRecord, Component, SectionType, TeacherId};
use itertools::Itertools;

/// Sessions longer than this slot envelope indicate a data problem
const MAX_SLOT_COUNT: u32 = 8;

/// Phase 7: flatten the committed state into published allocation records.
///
/// End-times come from the actual taught minutes, not the slot envelope, so
/// a 60-minute residual block inside a 90-minute slot reports its true end.
pub fn assemble(
    state: &ScheduleState,
    ctx: &Context,
    warnings: &mut Vec<String>,
) -> Vec<AllocationRecord> {
    state
        .assignments()
        .sorted_by_key(|a| {
            (
                a.section_id,
                a.day.index(),
                a.start_slot,
                a.room_id.map(|r| r.0).unwrap_or(-1),
            )
        })
        .map(|a| {
            let section = &ctx.sections[&a.section_id];
            let room = a.room_id.map(|id| &ctx.rooms[&id]);

            let mut slot_count = a.slot_count;
            if slot_count > MAX_SLOT_COUNT {
                warnings.push(format!(
                    "Section '{}' had a {}-slot session; capped to {}",
                    section.section_code, slot_count, MAX_SLOT_COUNT
                ));
                slot_count = MAX_SLOT_COUNT;
            }

            let start_minutes = ctx.slot(a.start_slot).start_minutes;
            let end_minutes = start_minutes + a.duration_minutes;

            let (teacher_id, teacher_name) = match a.teacher_id {
                Some(id) if !id.is_tbd() => (
                    id,
                    section.teacher_name.clone().unwrap_or_default(),
                ),
                _ => (TeacherId::TBD, "TBD".to_string()),
            };

            AllocationRecord {
                section_id: a.section_id,
                section_code: section.section_code.clone(),
                course_code: section.course_code.clone(),
                subject_code: section.subject_code.clone(),
                subject_name: section.subject_name.clone(),
                room_id: a.room_id,
                room_code: room.map(|r| r.code.clone()),
                room_name: room.map(|r| r.name.clone()),
                building: room.map(|r| r.building.clone()),
                day: a.day.as_str().to_string(),
                start_time: format_12h(start_minutes),
                end_time: format_12h(end_minutes),
                start_slot_id: a.start_slot,
                slot_count,
                teacher_id,
                teacher_name,
                year_level: section.year_level,
                student_count: section.student_count,
                department: section.department.clone(),
                college: section.college.clone(),
                is_lab: a.is_lab,
                lec_hours: section.lec_hours,
                lab_hours: section.lab_hours,
                is_online: a.is_online,
                section_type: match section.section_type {
                    SectionType::Lecture => "lecture",
                    SectionType::Lab => "lab",
                    SectionType::Combined => "combined",
                }
                .to_string(),
                component: if a.is_lab { Component::Lab } else { Component::Lec },
                original_section_id: section.original_id,
                sibling_id: section.sibling_id,
            }
        })
        .collect()
}
