use super::context::Context;
use super::state::ScheduleState;
use crate::types::{Day, LunchMode, RoomId, SectionId, Shift, SlotId, TeacherId};
use std::collections::{BTreeMap, BTreeSet};

/// Any single hard violation dominates all accumulated soft cost
pub const HARD_PENALTY: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyReport {
    pub total: f64,
    pub hard_violations: u32,
}

/// Compute the total cost of a schedule state.
///
/// Rebuilds its occupancy indices on every call, so the cost of a state is a
/// pure function of its assignment set: rebuilding the same assignments in
/// any order yields the same energy.
pub fn evaluate(state: &ScheduleState, ctx: &Context) -> EnergyReport {
    let w = &ctx.config.weights;
    let config = &ctx.config;
    let slot_minutes = config.slot_duration_minutes.max(1);
    let day_open = config.day_open_minutes();
    let closing = config.closing_minutes();
    let night_start = config.night_start_minutes();
    let lunch = config.lunch_window();

    let mut hard: u32 = 0;
    let mut soft: f64 = 0.0;

    // Transient indices, rebuilt per call
    let mut room_usage: BTreeMap<(RoomId, Day, SlotId), u32> = BTreeMap::new();
    let mut teacher_usage: BTreeMap<(TeacherId, Day, SlotId), u32> = BTreeMap::new();
    let mut section_usage: BTreeMap<(SectionId, Day, SlotId), u32> = BTreeMap::new();
    let mut cohort_usage: BTreeMap<(String, Day, SlotId), Vec<SectionId>> = BTreeMap::new();

    let mut teacher_day_slots: BTreeMap<(TeacherId, Day), BTreeSet<SlotId>> = BTreeMap::new();
    let mut teacher_buildings: BTreeMap<(TeacherId, Day, SlotId), String> = BTreeMap::new();
    let mut cohort_day_slots: BTreeMap<(String, Day), BTreeSet<SlotId>> = BTreeMap::new();
    let mut cohort_day_ranges: BTreeMap<(String, Day), Vec<(u32, u32)>> = BTreeMap::new();
    let mut teacher_week_minutes: BTreeMap<TeacherId, u32> = BTreeMap::new();
    let mut teacher_courses: BTreeMap<TeacherId, BTreeSet<String>> = BTreeMap::new();
    let mut teacher_sections: BTreeMap<TeacherId, BTreeSet<SectionId>> = BTreeMap::new();
    let mut group_days: BTreeMap<String, BTreeSet<Day>> = BTreeMap::new();
    let mut day_counts: BTreeMap<Day, u32> = ctx.active_days.iter().map(|d| (*d, 0)).collect();

    for a in state.assignments() {
        let section = &ctx.sections[&a.section_id];

        if !ctx.range_fits(a.start_slot, a.slot_count) {
            hard += 1;
            continue;
        }
        let (begin, end) = ctx.range_minutes(a.start_slot, a.slot_count);
        let online_day = ctx.is_online_day(a.day);

        // Online-day room assignment / ghost physical lab
        if online_day && a.room_id.is_some() {
            hard += 1;
        }
        if online_day && a.is_lab {
            hard += 1;
        }

        // Time boundary
        if begin < day_open || begin >= closing || end > closing {
            hard += 1;
        }

        if let Some(room_id) = a.room_id {
            let room = &ctx.rooms[&room_id];
            let cap = room.capacity as f64;
            let n = section.student_count as f64;

            if n > cap * (1.0 + config.capacity_tolerance) {
                hard += 1;
            }
            if a.is_lab && !room.is_lab_room() {
                if config.strict_lab_room_matching {
                    hard += 1;
                } else {
                    soft += w.room_type_mismatch;
                }
            }
            if !a.is_lab && room.is_lab_room() {
                if config.strict_lecture_room_matching {
                    hard += 1;
                } else {
                    soft += w.specialized_lab_misuse;
                }
            }
            if !room.has_features(&section.required_features) {
                hard += 1;
            }

            if !section.required_room_type.is_empty()
                && !room
                    .room_type
                    .eq_ignore_ascii_case(&section.required_room_type)
            {
                soft += w.room_type_mismatch;
            }

            if n > 0.0 {
                let ratio = cap / n;
                if ratio > 2.0 {
                    soft += w.capacity_waste * (ratio - 2.0);
                }
            }

            if config.prioritize_accessibility && room.is_accessible {
                soft -= w.accessibility_bonus;
            }
        }

        // Lunch handling
        if let Some((lunch_start, lunch_end)) = lunch {
            let overlaps = begin < lunch_end && lunch_start < end;
            if overlaps {
                match config.lunch_mode {
                    LunchMode::Strict => hard += 1,
                    LunchMode::Flexible => soft += w.lunch_overlap_flexible,
                    _ => {}
                }
            }
        }

        // Morning preference
        soft += w.morning_preference * (begin.saturating_sub(day_open) as f64 / 60.0);

        let teacher = a.teacher_id.filter(|t| !t.is_tbd());
        if let Some(t) = teacher {
            if let Some(profile) = ctx.profile(t) {
                if !profile.allows_day(a.day) {
                    hard += 1;
                }
                if begin >= night_start && profile.preferred_shift != Some(Shift::Evening) {
                    soft += w.night_class;
                }
                if let Some(preferred) = profile.preferred_shift {
                    if Shift::of_start(begin) != preferred {
                        if profile.shift_is_hard {
                            hard += 1;
                        } else {
                            soft += w.shift_mismatch;
                        }
                    }
                }
            }

            *teacher_week_minutes.entry(t).or_insert(0) += a.slot_count * slot_minutes;
            teacher_courses
                .entry(t)
                .or_default()
                .insert(section.subject_code.clone());
            teacher_sections.entry(t).or_default().insert(a.section_id);
        }

        let base = section.base_code();
        for slot in a.slot_range() {
            let slot = SlotId(slot);
            if let Some(room_id) = a.room_id {
                *room_usage.entry((room_id, a.day, slot)).or_insert(0) += 1;
            }
            if let Some(t) = teacher {
                *teacher_usage.entry((t, a.day, slot)).or_insert(0) += 1;
                teacher_day_slots.entry((t, a.day)).or_default().insert(slot);
                if let Some(room_id) = a.room_id {
                    teacher_buildings
                        .insert((t, a.day, slot), ctx.rooms[&room_id].building.clone());
                }
            }
            *section_usage.entry((a.section_id, a.day, slot)).or_insert(0) += 1;
            cohort_usage
                .entry((base.clone(), a.day, slot))
                .or_default()
                .push(a.section_id);
            cohort_day_slots
                .entry((base.clone(), a.day))
                .or_default()
                .insert(slot);
        }
        cohort_day_ranges
            .entry((base, a.day))
            .or_default()
            .push((begin, end));

        group_days
            .entry(section.subject_group_key())
            .or_default()
            .insert(a.day);
        *day_counts.entry(a.day).or_insert(0) += 1;
    }

    // Room / teacher / self double-booking: set-size overages
    for count in room_usage.values() {
        hard += count.saturating_sub(1);
    }
    for count in teacher_usage.values() {
        hard += count.saturating_sub(1);
    }
    for count in section_usage.values() {
        hard += count.saturating_sub(1);
    }

    // Cohort double-booking through the base-cohort hierarchy
    for occupants in cohort_usage.values() {
        if occupants.len() < 2 {
            continue;
        }
        for i in 0..occupants.len() {
            for j in (i + 1)..occupants.len() {
                if occupants[i] == occupants[j] {
                    continue;
                }
                let a = &ctx.sections[&occupants[i]];
                let b = &ctx.sections[&occupants[j]];
                if a.cohort_conflicts_with(b) {
                    hard += 1;
                }
            }
        }
    }

    // Teacher teleportation between buildings in consecutive slots
    for ((teacher, day), slots) in &teacher_day_slots {
        for slot in slots {
            let next = SlotId(slot.0 + 1);
            if !slots.contains(&next) {
                continue;
            }
            if let (Some(here), Some(there)) = (
                teacher_buildings.get(&(*teacher, *day, *slot)),
                teacher_buildings.get(&(*teacher, *day, next)),
            ) {
                if here != there {
                    hard += 1;
                }
            }
        }
    }

    let max_consecutive_minutes = config.max_consecutive_hours * 60;
    let soft_daily_cap = config.soft_teacher_hours_per_day * 60;

    // Per teacher-day: hard cap, soft overload, consecutive runs, span, lunch break
    for ((teacher, _day), slots) in &teacher_day_slots {
        let minutes = slots.len() as u32 * slot_minutes;
        if minutes > ctx.hard_daily_cap_minutes(*teacher) {
            hard += 1;
        }
        if minutes > soft_daily_cap {
            let excess_slots = (minutes - soft_daily_cap).div_ceil(slot_minutes);
            soft += w.teacher_daily_overload * excess_slots as f64;
        }

        let run = longest_consecutive_run(slots) * slot_minutes;
        if run > max_consecutive_minutes {
            let excess_slots = (run - max_consecutive_minutes) / slot_minutes;
            soft += w.consecutive_overload * excess_slots as f64;
            if config.lunch_mode == LunchMode::Auto {
                hard += 1;
            }
        }

        let (Some(first), Some(last)) = (slots.first(), slots.last()) else {
            continue;
        };
        let span = ctx.slot(*last).end_minutes() - ctx.slot(*first).start_minutes;
        if span > 600 {
            soft += w.daily_span * ((span - 600) as f64 / 30.0);
        }

        if let Some((lunch_start, lunch_end)) = lunch {
            let morning = slots
                .iter()
                .any(|s| ctx.slot(*s).start_minutes < lunch_start);
            let afternoon = slots
                .iter()
                .any(|s| ctx.slot(*s).start_minutes >= lunch_end);
            let through_lunch = slots
                .iter()
                .any(|s| ctx.slot(*s).overlaps(lunch_start, lunch_end));
            if morning && afternoon && through_lunch {
                soft += w.teacher_no_lunch_break;
            }
        }
    }

    // Cohort recovery blocks and swiss-cheese gaps
    for slots in cohort_day_slots.values() {
        let run = longest_consecutive_run(slots) * slot_minutes;
        if run > max_consecutive_minutes && config.lunch_mode == LunchMode::Auto {
            hard += 1;
        }
    }
    for ranges in cohort_day_ranges.values_mut() {
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            if pair[1].0 > pair[0].1 && pair[1].0 - pair[0].1 >= 180 {
                soft += w.cohort_gap;
            }
        }
    }

    // Non-consecutive-day rule and weekly session cap per subject group
    for days in group_days.values() {
        let indices: Vec<u8> = days.iter().map(|d| d.index()).collect();
        for pair in indices.windows(2) {
            if pair[1] - pair[0] == 1 {
                hard += 1;
            }
        }
        if indices.len() > 2 {
            hard += indices.len() as u32 - 2;
        }
    }

    // Faculty weekly / per-course / per-section caps
    for (teacher, minutes) in &teacher_week_minutes {
        if let Some(profile) = ctx.profile(*teacher) {
            if *minutes > profile.max_weekly_hours * 60 {
                hard += 1;
            }
            if let Some(max_courses) = profile.max_courses {
                if teacher_courses
                    .get(teacher)
                    .map(|c| c.len() as u32 > max_courses)
                    .unwrap_or(false)
                {
                    hard += 1;
                }
            }
            if let Some(max_sections) = profile.max_sections {
                if teacher_sections
                    .get(teacher)
                    .map(|s| s.len() as u32 > max_sections)
                    .unwrap_or(false)
                {
                    hard += 1;
                }
            }
        }
    }

    // Sibling lecture and lab sharing a day
    for (id, section) in &ctx.sections {
        let Some(sibling_id) = section.sibling_id else {
            continue;
        };
        if sibling_id <= *id {
            continue;
        }
        let own_days: BTreeSet<Day> = state
            .section_assignments(*id)
            .iter()
            .map(|a| a.day)
            .collect();
        let shared = state
            .section_assignments(sibling_id)
            .iter()
            .filter(|a| own_days.contains(&a.day))
            .count();
        soft += w.sibling_same_day * shared as f64;
    }

    // Day-distribution imbalance over active days
    if let (Some(max), Some(min)) = (day_counts.values().max(), day_counts.values().min()) {
        soft += w.day_imbalance * (max - min) as f64;
    }

    // Missing session slots keep dropped assignments from looking free
    for (section_id, needed) in &ctx.needed_slots {
        let assigned = state.assigned_slot_count(*section_id);
        if assigned < *needed {
            soft += w.unplaced_slot * (*needed - assigned) as f64;
        }
    }

    EnergyReport {
        total: hard as f64 * HARD_PENALTY + soft,
        hard_violations: hard,
    }
}

/// Length (in slots) of the longest consecutive slot-id run
fn longest_consecutive_run(slots: &BTreeSet<SlotId>) -> u32 {
    let mut best = 0u32;
    let mut run = 0u32;
    let mut prev: Option<u32> = None;
    for slot in slots {
        run = match prev {
            Some(p) if slot.0 == p + 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(slot.0);
    }
    best
}
