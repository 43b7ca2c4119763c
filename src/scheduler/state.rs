use super::context::Context;
use crate::types::{Day, RoomId, SectionId, SlotId, TeacherId};
use std::collections::BTreeMap;

/// One scheduled session block. A section may hold several, one per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub section_id: SectionId,
    pub room_id: Option<RoomId>,
    pub day: Day,
    pub start_slot: SlotId,
    pub slot_count: u32,
    /// Exact taught minutes; the final session of a plan may be shorter
    /// than its slot envelope
    pub duration_minutes: u32,
    pub is_online: bool,
    pub is_lab: bool,
    pub teacher_id: Option<TeacherId>,
}

impl Assignment {
    pub fn slot_range(&self) -> std::ops::Range<u32> {
        self.start_slot.0..self.start_slot.0 + self.slot_count
    }

    pub fn overlaps_slots(&self, day: Day, start: SlotId, count: u32) -> bool {
        self.day == day
            && self.start_slot.0 < start.0 + count
            && start.0 < self.start_slot.0 + self.slot_count
    }

    /// Canonical ordering key; assignment vectors are kept sorted so that
    /// apply-then-revert reproduces the exact prior state
    fn sort_key(&self) -> (u8, u32, i64, i64) {
        (
            self.day.index(),
            self.start_slot.0,
            self.room_id.map(|r| r.0).unwrap_or(-1),
            self.section_id.0,
        )
    }
}

/// The authoritative mutable assignment store, owned by a single optimizer
/// instance for the duration of one run.
///
/// Forward index: `(room, day, slot) -> section` for physical occupancy.
/// Reverse indices: per section, per teacher-day, per cohort-day, plus the
/// subject-group day counts driving the non-consecutive-day rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleState {
    occupancy: BTreeMap<(RoomId, Day, SlotId), SectionId>,
    by_section: BTreeMap<SectionId, Vec<Assignment>>,
    teacher_day: BTreeMap<(TeacherId, Day), Vec<(SlotId, u32, SectionId)>>,
    cohort_day: BTreeMap<(String, Day), Vec<(SlotId, u32, SectionId)>>,
    subject_days: BTreeMap<String, BTreeMap<Day, u32>>,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to place a session block. Fails without mutating anything
    /// when the placement breaks a structural rule; on success every index
    /// is updated together.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        &mut self,
        ctx: &Context,
        section_id: SectionId,
        room_id: Option<RoomId>,
        day: Day,
        start: SlotId,
        slot_count: u32,
        is_online: bool,
        duration_minutes: u32,
    ) -> bool {
        if !ctx.range_fits(start, slot_count) {
            return false;
        }
        if ctx.is_lunch_strict() && ctx.range_overlaps_lunch(start, slot_count) {
            return false;
        }

        let section = &ctx.sections[&section_id];

        if !is_online {
            if let Some(room) = room_id {
                for offset in 0..slot_count {
                    let key = (room, day, SlotId(start.0 + offset));
                    if self.occupancy.contains_key(&key) {
                        return false;
                    }
                }
            }
        }

        if let Some(teacher) = section.teacher_id.filter(|t| !t.is_tbd()) {
            if self.teacher_conflict(teacher, day, start, slot_count, Some(section_id)) {
                return false;
            }
        }

        if self.section_conflict(section_id, day, start, slot_count) {
            return false;
        }

        if self.cohort_conflict(ctx, section, day, start, slot_count) {
            return false;
        }

        self.insert_unchecked(
            ctx,
            Assignment {
                section_id,
                room_id: if is_online { None } else { room_id },
                day,
                start_slot: start,
                slot_count,
                duration_minutes,
                is_online,
                is_lab: section.needs_lab_room(),
                teacher_id: section.teacher_id,
            },
        );
        true
    }

    /// Remove the assignment identified by (section, room, day, start).
    /// Returns it so callers can restore on revert.
    pub fn deallocate(
        &mut self,
        ctx: &Context,
        section_id: SectionId,
        room_id: Option<RoomId>,
        day: Day,
        start: SlotId,
    ) -> Option<Assignment> {
        let list = self.by_section.get_mut(&section_id)?;
        let pos = list.iter().position(|a| {
            a.room_id == room_id && a.day == day && a.start_slot == start
        })?;
        let assignment = list.remove(pos);
        if list.is_empty() {
            self.by_section.remove(&section_id);
        }

        if let Some(room) = assignment.room_id {
            for slot in assignment.slot_range() {
                self.occupancy.remove(&(room, day, SlotId(slot)));
            }
        }

        if let Some(teacher) = assignment.teacher_id.filter(|t| !t.is_tbd()) {
            remove_span(
                &mut self.teacher_day,
                (teacher, day),
                (assignment.start_slot, assignment.slot_count, section_id),
            );
        }

        let section = &ctx.sections[&section_id];
        remove_span(
            &mut self.cohort_day,
            (section.base_code(), day),
            (assignment.start_slot, assignment.slot_count, section_id),
        );

        let group_key = section.subject_group_key();
        if let Some(days) = self.subject_days.get_mut(&group_key) {
            if let Some(count) = days.get_mut(&day) {
                *count -= 1;
                if *count == 0 {
                    days.remove(&day);
                }
            }
            if days.is_empty() {
                self.subject_days.remove(&group_key);
            }
        }

        Some(assignment)
    }

    /// Insert without feasibility checks. Used for manual pins and for
    /// restoring a previously-removed assignment during a move revert.
    pub fn insert_unchecked(&mut self, ctx: &Context, assignment: Assignment) {
        if let Some(room) = assignment.room_id {
            for slot in assignment.slot_range() {
                self.occupancy
                    .insert((room, assignment.day, SlotId(slot)), assignment.section_id);
            }
        }

        if let Some(teacher) = assignment.teacher_id.filter(|t| !t.is_tbd()) {
            insert_span(
                &mut self.teacher_day,
                (teacher, assignment.day),
                (
                    assignment.start_slot,
                    assignment.slot_count,
                    assignment.section_id,
                ),
            );
        }

        let section = &ctx.sections[&assignment.section_id];
        insert_span(
            &mut self.cohort_day,
            (section.base_code(), assignment.day),
            (
                assignment.start_slot,
                assignment.slot_count,
                assignment.section_id,
            ),
        );

        *self
            .subject_days
            .entry(section.subject_group_key())
            .or_default()
            .entry(assignment.day)
            .or_insert(0) += 1;

        let list = self.by_section.entry(assignment.section_id).or_default();
        let key = assignment.sort_key();
        let pos = list
            .binary_search_by_key(&key, |a| a.sort_key())
            .unwrap_or_else(|p| p);
        list.insert(pos, assignment);
    }

    /// True when every slot of the range is free in the room
    pub fn room_free(&self, room: RoomId, day: Day, start: SlotId, count: u32) -> bool {
        (0..count).all(|offset| {
            !self
                .occupancy
                .contains_key(&(room, day, SlotId(start.0 + offset)))
        })
    }

    /// O(k) scan of the teacher-day index for a span overlap
    pub fn teacher_conflict(
        &self,
        teacher: TeacherId,
        day: Day,
        start: SlotId,
        count: u32,
        exclude_section: Option<SectionId>,
    ) -> bool {
        self.teacher_day
            .get(&(teacher, day))
            .map(|spans| {
                spans.iter().any(|(s, c, sec)| {
                    Some(*sec) != exclude_section && spans_overlap(*s, *c, start, count)
                })
            })
            .unwrap_or(false)
    }

    /// Does this section already occupy any slot in the range on that day?
    pub fn section_conflict(
        &self,
        section_id: SectionId,
        day: Day,
        start: SlotId,
        count: u32,
    ) -> bool {
        self.by_section
            .get(&section_id)
            .map(|list| list.iter().any(|a| a.overlaps_slots(day, start, count)))
            .unwrap_or(false)
    }

    /// Cohort-hierarchy overlap against every sibling/satellite sharing the
    /// base section code
    pub fn cohort_conflict(
        &self,
        ctx: &Context,
        section: &crate::types::Section,
        day: Day,
        start: SlotId,
        count: u32,
    ) -> bool {
        self.cohort_day
            .get(&(section.base_code(), day))
            .map(|spans| {
                spans.iter().any(|(s, c, other_id)| {
                    if *other_id == section.id || !spans_overlap(*s, *c, start, count) {
                        return false;
                    }
                    section.cohort_conflicts_with(&ctx.sections[other_id])
                })
            })
            .unwrap_or(false)
    }

    /// Rewrite one assignment's teacher to the TBD sentinel, dropping it
    /// from the teacher-day index
    pub fn demote_teacher(
        &mut self,
        section_id: SectionId,
        room_id: Option<RoomId>,
        day: Day,
        start: SlotId,
    ) {
        let Some(list) = self.by_section.get_mut(&section_id) else {
            return;
        };
        let Some(assignment) = list
            .iter_mut()
            .find(|a| a.room_id == room_id && a.day == day && a.start_slot == start)
        else {
            return;
        };

        if let Some(teacher) = assignment.teacher_id.filter(|t| !t.is_tbd()) {
            let span = (assignment.start_slot, assignment.slot_count, section_id);
            assignment.teacher_id = Some(TeacherId::TBD);
            remove_span(&mut self.teacher_day, (teacher, day), span);
        }
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.by_section.values().flatten()
    }

    pub fn section_assignments(&self, section_id: SectionId) -> &[Assignment] {
        self.by_section
            .get(&section_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn assigned_slot_count(&self, section_id: SectionId) -> u32 {
        self.section_assignments(section_id)
            .iter()
            .map(|a| a.slot_count)
            .sum()
    }

    /// Days on which the subject group currently meets
    pub fn subject_day_set(&self, group_key: &str) -> Vec<Day> {
        self.subject_days
            .get(group_key)
            .map(|days| days.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Scheduled minutes for a teacher on one day
    pub fn teacher_day_minutes(&self, ctx: &Context, teacher: TeacherId, day: Day) -> u32 {
        self.teacher_day
            .get(&(teacher, day))
            .map(|spans| {
                spans
                    .iter()
                    .map(|(_, count, _)| count * ctx.config.slot_duration_minutes)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.by_section.is_empty()
    }

    pub fn total_assignments(&self) -> usize {
        self.by_section.values().map(|v| v.len()).sum()
    }
}

fn spans_overlap(a_start: SlotId, a_count: u32, b_start: SlotId, b_count: u32) -> bool {
    a_start.0 < b_start.0 + b_count && b_start.0 < a_start.0 + a_count
}

fn insert_span<K: Ord>(
    index: &mut BTreeMap<K, Vec<(SlotId, u32, SectionId)>>,
    key: K,
    span: (SlotId, u32, SectionId),
) {
    let list = index.entry(key).or_default();
    let pos = list.binary_search(&span).unwrap_or_else(|p| p);
    list.insert(pos, span);
}

fn remove_span<K: Ord>(
    index: &mut BTreeMap<K, Vec<(SlotId, u32, SectionId)>>,
    key: K,
    span: (SlotId, u32, SectionId),
) {
    if let Some(list) = index.get_mut(&key) {
        if let Some(pos) = list.iter().position(|s| *s == span) {
            list.remove(pos);
        }
        if list.is_empty() {
            index.remove(&key);
        }
    }
}
