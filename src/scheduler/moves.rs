use super::context::Context;
use super::energy;
use super::state::{Assignment, ScheduleState};
use crate::types::{Day, RoomId, SlotId};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

/// The closed move set. Local moves nudge one assignment; tunneling moves
/// make large-radius jumps to escape local minima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    ChangeRoom,
    ChangeDay,
    ChangeTime,
    BlockSwap,
    Relocate,
    OnlineShift,
}

/// Everything needed to undo an applied move in full
#[derive(Debug)]
pub struct MoveUndo {
    pub removed: Vec<Assignment>,
    pub added: Vec<Assignment>,
}

#[derive(Debug)]
pub struct AppliedMove {
    pub kind: MoveKind,
    pub undo: MoveUndo,
}

/// Undo a move: drop what it added, restore what it removed (with the prior
/// durations)
pub fn revert(state: &mut ScheduleState, ctx: &Context, undo: MoveUndo) {
    for a in &undo.added {
        state.deallocate(ctx, a.section_id, a.room_id, a.day, a.start_slot);
    }
    for a in undo.removed {
        state.insert_unchecked(ctx, a);
    }
}

/// Propose and apply one local move on a random non-pinned assignment.
/// Returns None when no applicable move was found; the state is unchanged
/// in that case.
pub fn propose_local_move(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
) -> Option<AppliedMove> {
    let target = pick_assignment(state, ctx, rng, |_| true)?;

    match rng.random_range(0..3u8) {
        0 => change_room(state, ctx, rng, target),
        1 => change_day(state, ctx, rng, target),
        _ => change_time(state, ctx, rng, target),
    }
}

/// Propose a tunneling move, gated on temperature: hotter states tunnel
/// more readily.
pub fn propose_tunnel_move(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
    temperature: f64,
) -> Option<AppliedMove> {
    let gate = (-1.0 / temperature.max(0.1)).exp();
    if rng.random::<f64>() >= gate {
        return None;
    }

    match rng.random_range(0..3u8) {
        0 => block_swap(state, ctx, rng),
        1 => relocate(state, ctx, rng),
        _ => online_shift(state, ctx, rng),
    }
}

fn pick_assignment(
    state: &ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
    filter: impl Fn(&Assignment) -> bool,
) -> Option<Assignment> {
    let candidates: Vec<Assignment> = state
        .assignments()
        .filter(|a| !ctx.sections[&a.section_id].is_pinned() && filter(a))
        .cloned()
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let index = rng.random_range(0..candidates.len());
    Some(candidates[index].clone())
}

fn fetch_added(
    state: &ScheduleState,
    target: &Assignment,
    room: Option<RoomId>,
    day: Day,
    start: SlotId,
) -> Assignment {
    state
        .section_assignments(target.section_id)
        .iter()
        .find(|a| a.room_id == room && a.day == day && a.start_slot == start)
        .expect("just allocated")
        .clone()
}

fn change_room(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
    target: Assignment,
) -> Option<AppliedMove> {
    if target.is_online {
        return None;
    }
    let others: Vec<RoomId> = ctx
        .compatible
        .get(&target.section_id)
        .map(|rooms| {
            rooms
                .iter()
                .copied()
                .filter(|r| Some(*r) != target.room_id)
                .collect()
        })
        .unwrap_or_default();
    if others.is_empty() {
        return None;
    }
    let new_room = others[rng.random_range(0..others.len())];
    if !state.room_free(new_room, target.day, target.start_slot, target.slot_count) {
        return None;
    }

    let removed = state.deallocate(
        ctx,
        target.section_id,
        target.room_id,
        target.day,
        target.start_slot,
    )?;
    let ok = state.allocate(
        ctx,
        target.section_id,
        Some(new_room),
        target.day,
        target.start_slot,
        target.slot_count,
        false,
        removed.duration_minutes,
    );
    if !ok {
        state.insert_unchecked(ctx, removed);
        return None;
    }

    let added = fetch_added(state, &target, Some(new_room), target.day, target.start_slot);
    Some(AppliedMove {
        kind: MoveKind::ChangeRoom,
        undo: MoveUndo {
            removed: vec![removed],
            added: vec![added],
        },
    })
}

fn change_day(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
    target: Assignment,
) -> Option<AppliedMove> {
    let section = &ctx.sections[&target.section_id];
    let removed = state.deallocate(
        ctx,
        target.section_id,
        target.room_id,
        target.day,
        target.start_slot,
    )?;

    // With the target out of the state, the remaining group days define
    // which destinations keep the day-spacing rule intact
    let group_days = state.subject_day_set(&section.subject_group_key());
    let candidates: Vec<Day> = ctx
        .active_days
        .iter()
        .copied()
        .filter(|day| {
            *day != target.day
                && ctx.teacher_allows_day(section.teacher_id, *day)
                && !(section.needs_lab_room() && ctx.is_online_day(*day))
                && !group_days.iter().any(|d| d.is_adjacent(*day))
                && (group_days.contains(day) || group_days.len() < 2)
        })
        .collect();

    if candidates.is_empty() {
        state.insert_unchecked(ctx, removed);
        return None;
    }
    let new_day = candidates[rng.random_range(0..candidates.len())];
    let online = ctx.is_online_day(new_day) && !section.needs_lab_room();

    let room = if online {
        None
    } else if removed.room_id.is_some() {
        removed.room_id
    } else {
        // Coming back from an online day needs a physical room
        first_free_room(state, ctx, &target, new_day, target.start_slot)
    };
    if !online && room.is_none() {
        state.insert_unchecked(ctx, removed);
        return None;
    }

    let ok = state.allocate(
        ctx,
        target.section_id,
        room,
        new_day,
        target.start_slot,
        target.slot_count,
        online,
        removed.duration_minutes,
    );
    if !ok {
        state.insert_unchecked(ctx, removed);
        return None;
    }

    let added = fetch_added(
        state,
        &target,
        if online { None } else { room },
        new_day,
        target.start_slot,
    );
    Some(AppliedMove {
        kind: MoveKind::ChangeDay,
        undo: MoveUndo {
            removed: vec![removed],
            added: vec![added],
        },
    })
}

fn change_time(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
    target: Assignment,
) -> Option<AppliedMove> {
    let removed = state.deallocate(
        ctx,
        target.section_id,
        target.room_id,
        target.day,
        target.start_slot,
    )?;
    let teacher = removed.teacher_id.filter(|t| !t.is_tbd());

    let candidates: Vec<SlotId> = (1..=ctx.last_slot())
        .map(SlotId)
        .filter(|start| {
            *start != target.start_slot
                && ctx.range_fits(*start, target.slot_count)
                && !(ctx.is_lunch_strict()
                    && ctx.range_overlaps_lunch(*start, target.slot_count))
                && removed
                    .room_id
                    .map(|room| state.room_free(room, target.day, *start, target.slot_count))
                    .unwrap_or(true)
                && teacher
                    .map(|t| {
                        !state.teacher_conflict(
                            t,
                            target.day,
                            *start,
                            target.slot_count,
                            Some(target.section_id),
                        )
                    })
                    .unwrap_or(true)
        })
        .collect();

    if candidates.is_empty() {
        state.insert_unchecked(ctx, removed);
        return None;
    }
    let new_start = candidates[rng.random_range(0..candidates.len())];

    let ok = state.allocate(
        ctx,
        target.section_id,
        removed.room_id,
        target.day,
        new_start,
        target.slot_count,
        removed.is_online,
        removed.duration_minutes,
    );
    if !ok {
        state.insert_unchecked(ctx, removed);
        return None;
    }

    let added = fetch_added(state, &target, removed.room_id, target.day, new_start);
    Some(AppliedMove {
        kind: MoveKind::ChangeTime,
        undo: MoveUndo {
            removed: vec![removed],
            added: vec![added],
        },
    })
}

/// Swap every assignment of one department between two days. Atomic: if any
/// re-insertion fails the whole swap is rolled back.
fn block_swap(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
) -> Option<AppliedMove> {
    let departments: Vec<String> = ctx
        .sections
        .values()
        .filter(|s| !s.department.is_empty())
        .map(|s| s.department.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if departments.is_empty() || ctx.active_days.len() < 2 {
        return None;
    }
    let department = &departments[rng.random_range(0..departments.len())];

    let day_a = ctx.active_days[rng.random_range(0..ctx.active_days.len())];
    let day_b = ctx.active_days[rng.random_range(0..ctx.active_days.len())];
    if day_a == day_b {
        return None;
    }

    let moving: Vec<Assignment> = state
        .assignments()
        .filter(|a| {
            let section = &ctx.sections[&a.section_id];
            (a.day == day_a || a.day == day_b)
                && section.department == *department
                && !section.is_pinned()
        })
        .cloned()
        .collect();
    if moving.is_empty() {
        return None;
    }

    let mut removed = Vec::with_capacity(moving.len());
    for a in &moving {
        if let Some(prior) = state.deallocate(ctx, a.section_id, a.room_id, a.day, a.start_slot) {
            removed.push(prior);
        }
    }

    let mut added = Vec::with_capacity(removed.len());
    let mut failed = false;
    for prior in &removed {
        let new_day = if prior.day == day_a { day_b } else { day_a };
        let online = ctx.is_online_day(new_day) && !prior.is_lab;
        if ctx.is_online_day(new_day) && prior.is_lab {
            failed = true;
            break;
        }
        let room = if online {
            None
        } else if prior.room_id.is_some() {
            prior.room_id
        } else {
            first_free_room(state, ctx, prior, new_day, prior.start_slot)
        };
        if !online && room.is_none() {
            failed = true;
            break;
        }

        if !state.allocate(
            ctx,
            prior.section_id,
            room,
            new_day,
            prior.start_slot,
            prior.slot_count,
            online,
            prior.duration_minutes,
        ) {
            failed = true;
            break;
        }
        added.push(fetch_added(
            state,
            prior,
            if online { None } else { room },
            new_day,
            prior.start_slot,
        ));
    }

    if failed {
        for a in &added {
            state.deallocate(ctx, a.section_id, a.room_id, a.day, a.start_slot);
        }
        for prior in removed {
            state.insert_unchecked(ctx, prior);
        }
        return None;
    }

    Some(AppliedMove {
        kind: MoveKind::BlockSwap,
        undo: MoveUndo { removed, added },
    })
}

/// Deallocate one assignment and reinsert it at the energetically best of
/// up to 50 random candidate placements.
fn relocate(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
) -> Option<AppliedMove> {
    let target = pick_assignment(state, ctx, rng, |_| true)?;
    let section = &ctx.sections[&target.section_id];
    let removed = state.deallocate(
        ctx,
        target.section_id,
        target.room_id,
        target.day,
        target.start_slot,
    )?;

    let compat = ctx
        .compatible
        .get(&target.section_id)
        .cloned()
        .unwrap_or_default();

    let mut best: Option<(f64, Option<RoomId>, Day, SlotId, bool)> = None;
    for _ in 0..50 {
        let day = ctx.active_days[rng.random_range(0..ctx.active_days.len())];
        let online = ctx.is_online_day(day);
        if online && section.needs_lab_room() {
            continue;
        }
        let room = if online {
            None
        } else if compat.is_empty() {
            continue;
        } else {
            Some(compat[rng.random_range(0..compat.len())])
        };
        let max_start = ctx.last_slot().saturating_sub(target.slot_count - 1);
        if max_start == 0 {
            continue;
        }
        let start = SlotId(rng.random_range(0..max_start) + 1);

        if !state.allocate(
            ctx,
            target.section_id,
            room,
            day,
            start,
            target.slot_count,
            online,
            removed.duration_minutes,
        ) {
            continue;
        }
        let cost = energy::evaluate(state, ctx).total;
        state.deallocate(ctx, target.section_id, room, day, start);

        if best.map(|(c, _, _, _, _)| cost < c).unwrap_or(true) {
            best = Some((cost, room, day, start, online));
        }
    }

    let Some((_, room, day, start, online)) = best else {
        state.insert_unchecked(ctx, removed);
        return None;
    };
    if !state.allocate(
        ctx,
        target.section_id,
        room,
        day,
        start,
        target.slot_count,
        online,
        removed.duration_minutes,
    ) {
        state.insert_unchecked(ctx, removed);
        return None;
    }

    let added = fetch_added(state, &target, room, day, start);
    Some(AppliedMove {
        kind: MoveKind::Relocate,
        undo: MoveUndo {
            removed: vec![removed],
            added: vec![added],
        },
    })
}

/// Move one face-to-face, non-lab assignment onto an online day
fn online_shift(
    state: &mut ScheduleState,
    ctx: &Context,
    rng: &mut ChaCha8Rng,
) -> Option<AppliedMove> {
    if ctx.online_days.is_empty() {
        return None;
    }
    let target = pick_assignment(state, ctx, rng, |a| !a.is_online && !a.is_lab)?;
    let section = &ctx.sections[&target.section_id];
    let removed = state.deallocate(
        ctx,
        target.section_id,
        target.room_id,
        target.day,
        target.start_slot,
    )?;

    let group_days = state.subject_day_set(&section.subject_group_key());
    let candidates: Vec<Day> = ctx
        .online_days
        .iter()
        .copied()
        .filter(|day| {
            *day != target.day
                && ctx.teacher_allows_day(section.teacher_id, *day)
                && !group_days.iter().any(|d| d.is_adjacent(*day))
                && (group_days.contains(day) || group_days.len() < 2)
        })
        .collect();
    if candidates.is_empty() {
        state.insert_unchecked(ctx, removed);
        return None;
    }
    let day = candidates[rng.random_range(0..candidates.len())];

    let ok = state.allocate(
        ctx,
        target.section_id,
        None,
        day,
        target.start_slot,
        target.slot_count,
        true,
        removed.duration_minutes,
    );
    if !ok {
        state.insert_unchecked(ctx, removed);
        return None;
    }

    let added = fetch_added(state, &target, None, day, target.start_slot);
    Some(AppliedMove {
        kind: MoveKind::OnlineShift,
        undo: MoveUndo {
            removed: vec![removed],
            added: vec![added],
        },
    })
}

fn first_free_room(
    state: &ScheduleState,
    ctx: &Context,
    assignment: &Assignment,
    day: Day,
    start: SlotId,
) -> Option<RoomId> {
    ctx.compatible
        .get(&assignment.section_id)?
        .iter()
        .copied()
        .find(|room| state.room_free(*room, day, start, assignment.slot_count))
}
