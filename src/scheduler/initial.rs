use super::context::Context;
use super::state::ScheduleState;
use crate::types::{Day, EngineConfig, LunchMode, RoomId, Section, SectionType, SlotId};
use std::cmp::Reverse;

/// Longest single lecture block, to avoid cognitive overload
const MAX_LECTURE_BLOCK_MINUTES: u32 = 180;
/// Labs tolerate longer contiguous blocks
const MAX_LAB_BLOCK_MINUTES: u32 = 360;

/// One contiguous session to place: a slot envelope plus the exact taught
/// minutes (the final block of a plan carries the residual)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionBlock {
    pub slot_count: u32,
    pub minutes: u32,
}

/// Split a section's weekly minutes into session blocks.
///
/// Blocks are capped at 180 minutes for lectures and 360 for labs when split
/// sessions are allowed, otherwise at the daily teaching cap. The last block
/// carries the exact residual so reported end-times do not round up to the
/// slot boundary.
pub fn plan_sessions(section: &Section, config: &EngineConfig) -> Vec<SessionBlock> {
    let slot_minutes = config.slot_duration_minutes.max(1);
    let max_block = if config.allow_split_sessions {
        if section.needs_lab_room() {
            MAX_LAB_BLOCK_MINUTES
        } else {
            MAX_LECTURE_BLOCK_MINUTES
        }
    } else {
        config.max_teacher_hours_per_day * 60
    }
    .max(slot_minutes);

    let mut blocks = Vec::new();
    let mut remaining = section.weekly_minutes();
    while remaining > 0 {
        let minutes = remaining.min(max_block);
        blocks.push(SessionBlock {
            slot_count: minutes.div_ceil(slot_minutes),
            minutes,
        });
        remaining -= minutes;
    }
    blocks
}

/// Phase 4: greedy hardest-first construction.
///
/// Pinned sections are placed beforehand by the pipeline; everything else is
/// ordered (lectures first, fewest compatible rooms, largest cohort, most
/// hours) and each session block is tried at four relaxation levels.
pub fn build_initial(state: &mut ScheduleState, ctx: &Context) {
    let mut order: Vec<&Section> = ctx
        .sections
        .values()
        .filter(|s| !s.is_pinned())
        .collect();
    order.sort_by_key(|s| {
        (
            type_rank(s),
            ctx.compatible.get(&s.id).map(|c| c.len()).unwrap_or(0),
            Reverse(s.student_count),
            Reverse(s.lec_hours + s.lab_hours),
            s.id,
        )
    });

    for section in order {
        if !is_placeable(ctx, section) {
            continue;
        }
        for block in plan_sessions(section, &ctx.config) {
            for pass in 0..4 {
                if place_session(state, ctx, section, block, pass) {
                    break;
                }
            }
        }
    }

    // Anything still missing gets one no-preferences attempt before the
    // optimizer takes over
    aggressive_reschedule(state, ctx);
}

/// Last-chance placement of any remaining blocks, honoring every hard rule
/// but none of the preferences. Runs after the greedy phase and again after
/// annealing.
pub fn aggressive_reschedule(state: &mut ScheduleState, ctx: &Context) {
    for section in ctx.sections.values() {
        if section.is_pinned() || !is_placeable(ctx, section) {
            continue;
        }
        let needed = ctx.needed_slots.get(&section.id).copied().unwrap_or(0);
        if state.assigned_slot_count(section.id) >= needed {
            continue;
        }

        let mut covered = state.assigned_slot_count(section.id);
        for block in plan_sessions(section, &ctx.config) {
            if covered >= block.slot_count {
                covered -= block.slot_count;
                continue;
            }
            place_session(state, ctx, section, block, 3);
        }
    }
}

/// A section with no compatible rooms can only be placed if it may go online
pub fn is_placeable(ctx: &Context, section: &Section) -> bool {
    let has_rooms = ctx
        .compatible
        .get(&section.id)
        .map(|c| !c.is_empty())
        .unwrap_or(false);
    has_rooms || (!section.needs_lab_room() && !ctx.online_days.is_empty())
}

fn type_rank(section: &Section) -> u8 {
    match section.section_type {
        SectionType::Lecture => 0,
        SectionType::Combined => 1,
        SectionType::Lab => 2,
    }
}

/// Try to place one session block at the given relaxation level. Selects
/// the feasible (day, room, start) with the lowest local cost: tight
/// capacity fit plus morning preference.
pub fn place_session(
    state: &mut ScheduleState,
    ctx: &Context,
    section: &Section,
    block: SessionBlock,
    pass: u8,
) -> bool {
    let group = section.subject_group_key();
    let group_days = state.subject_day_set(&group);
    let teacher = section.teacher_id.filter(|t| !t.is_tbd());

    let mut best: Option<(f64, Day, Option<RoomId>, SlotId)> = None;

    for &day in &ctx.active_days {
        if !day_allowed(ctx, section, &group_days, day, pass) {
            continue;
        }
        if let Some(t) = teacher {
            let cap = ctx.hard_daily_cap_minutes(t);
            if state.teacher_day_minutes(ctx, t, day) + block.minutes > cap {
                continue;
            }
        }

        let online = ctx.is_online_day(day);
        let room_choices: Vec<Option<RoomId>> = if online {
            vec![None]
        } else {
            ctx.compatible
                .get(&section.id)
                .map(|rooms| rooms.iter().map(|r| Some(*r)).collect())
                .unwrap_or_default()
        };

        for room in &room_choices {
            for start in 1..=ctx.last_slot() {
                let start = SlotId(start);
                if !start_allowed(ctx, start, block.slot_count, pass) {
                    continue;
                }
                if let Some(room_id) = room {
                    if !state.room_free(*room_id, day, start, block.slot_count) {
                        continue;
                    }
                }
                if let Some(t) = teacher {
                    if state.teacher_conflict(t, day, start, block.slot_count, Some(section.id)) {
                        continue;
                    }
                }
                if state.section_conflict(section.id, day, start, block.slot_count) {
                    continue;
                }
                if state.cohort_conflict(ctx, section, day, start, block.slot_count) {
                    continue;
                }

                let score = candidate_score(ctx, section, *room, start);
                if best.map(|(s, _, _, _)| score < s).unwrap_or(true) {
                    best = Some((score, day, *room, start));
                }
            }
        }
    }

    match best {
        Some((_, day, room, start)) => state.allocate(
            ctx,
            section.id,
            room,
            day,
            start,
            block.slot_count,
            room.is_none() && ctx.is_online_day(day),
            block.minutes,
        ),
        None => false,
    }
}

fn day_allowed(
    ctx: &Context,
    section: &Section,
    group_days: &[Day],
    day: Day,
    pass: u8,
) -> bool {
    if section.needs_lab_room() && ctx.is_online_day(day) {
        return false;
    }
    if !ctx.teacher_allows_day(section.teacher_id, day) {
        return false;
    }

    if group_days.contains(&day) {
        // Same-day second session is a late-pass fallback only
        return pass >= 2;
    }
    // At most two distinct meeting days per subject group
    if group_days.len() >= 2 {
        return false;
    }
    // Never adjacent to an existing meeting day
    !group_days.iter().any(|d| d.is_adjacent(day))
}

fn start_allowed(ctx: &Context, start: SlotId, count: u32, pass: u8) -> bool {
    if !ctx.range_fits(start, count) {
        return false;
    }
    let (begin, end) = ctx.range_minutes(start, count);
    if begin < ctx.config.day_open_minutes() || end > ctx.config.closing_minutes() {
        return false;
    }
    // First pass keeps sessions out of the night block
    if pass == 0 && end > ctx.config.night_start_minutes() {
        return false;
    }

    if let Some((lunch_start, lunch_end)) = ctx.config.lunch_window() {
        let overlaps = begin < lunch_end && lunch_start < end;
        if overlaps {
            return match ctx.config.lunch_mode {
                LunchMode::Strict => false,
                // Relaxed passes may pay the flexible-lunch cost
                _ => pass >= 3,
            };
        }
    }
    true
}

fn candidate_score(ctx: &Context, section: &Section, room: Option<RoomId>, start: SlotId) -> f64 {
    let capacity_fit = match room {
        Some(room_id) => {
            (ctx.rooms[&room_id].capacity as i64 - section.student_count as i64).abs() as f64
        }
        None => 0.0,
    };
    let begin = ctx.slot(start).start_minutes;
    let morning = begin.saturating_sub(ctx.config.day_open_minutes()) as f64 / 60.0;
    capacity_fit + morning * ctx.config.weights.morning_preference
}
