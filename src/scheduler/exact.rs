use super::context::Context;
use crate::error::Result;
use crate::types::{Day, RoomId, SectionId, SlotId, TeacherId};
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel};
use std::collections::BTreeMap;

/// Comparator-grade exact solver over the binary model x[section, room,
/// day, slot]: every section placed exactly once, rooms and teachers used
/// at most once per (day, slot), objective on room preference and capacity
/// waste.
///
/// Single-session per section; the annealing engine remains the production
/// path for multi-session plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
}

#[derive(Debug, Clone)]
pub struct ExactPlacement {
    pub section_id: SectionId,
    pub room_id: RoomId,
    pub day: Day,
    pub slot: SlotId,
}

#[derive(Debug, Clone)]
pub struct ExactSolution {
    pub status: SolveStatus,
    pub objective: f64,
    pub placements: Vec<ExactPlacement>,
}

pub fn solve_exact(ctx: &Context) -> Result<ExactSolution> {
    // Physical days only; the comparator has no online-day rule
    let days: Vec<Day> = ctx
        .active_days
        .iter()
        .copied()
        .filter(|d| !ctx.is_online_day(*d))
        .collect();
    let slot_ids: Vec<SlotId> = ctx.slots.keys().copied().collect();

    let mut vars = variables!();

    // x[(section, room, day, slot)] = 1 if the section meets there.
    // BTreeMap keeps iteration deterministic across runs.
    let mut x: BTreeMap<(SectionId, RoomId, Day, SlotId), _> = BTreeMap::new();

    for (section_id, section) in &ctx.sections {
        let Some(rooms) = ctx.compatible.get(section_id) else {
            continue;
        };
        for room_id in rooms {
            // Capacity prefilter keeps the model small
            if ctx.rooms[room_id].capacity < section.student_count {
                continue;
            }
            for day in &days {
                for slot in &slot_ids {
                    x.insert(
                        (*section_id, *room_id, *day, *slot),
                        vars.add(variable().binary()),
                    );
                }
            }
        }
    }

    // Objective: prefer matching room types and snug capacity
    let weights = &ctx.config.weights;
    let mut objective = Expression::default();
    for ((section_id, room_id, _, _), &var) in &x {
        let section = &ctx.sections[section_id];
        let room = &ctx.rooms[room_id];
        let mut cost = 0.0;

        if !section.required_room_type.is_empty()
            && !room
                .room_type
                .eq_ignore_ascii_case(&section.required_room_type)
        {
            cost += weights.room_type_mismatch;
        }
        if section.student_count > 0 {
            let ratio = room.capacity as f64 / section.student_count as f64;
            if ratio > 2.0 {
                cost += weights.capacity_waste * (ratio - 2.0);
            }
        }

        if cost > 0.0 {
            objective += cost * var;
        }
    }

    let mut problem = vars.minimise(objective).using(good_lp::solvers::highs::highs);

    // Each section scheduled exactly once
    for section_id in ctx.sections.keys() {
        let section_vars: Vec<_> = x
            .iter()
            .filter(|((s, _, _, _), _)| s == section_id)
            .map(|(_, &v)| v)
            .collect();
        if section_vars.is_empty() {
            return Ok(ExactSolution {
                status: SolveStatus::Infeasible,
                objective: 0.0,
                placements: Vec::new(),
            });
        }
        let sum: Expression = section_vars.into_iter().map(Expression::from).sum();
        problem = problem.with(constraint!(sum == 1));
    }

    // No room double-booking
    for room_id in ctx.rooms.keys() {
        for day in &days {
            for slot in &slot_ids {
                let cell_vars: Vec<_> = x
                    .iter()
                    .filter(|((_, r, d, t), _)| r == room_id && d == day && t == slot)
                    .map(|(_, &v)| v)
                    .collect();
                if cell_vars.len() > 1 {
                    let sum: Expression = cell_vars.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }
        }
    }

    // No teacher double-booking
    let teachers: Vec<TeacherId> = {
        let mut set: Vec<TeacherId> = ctx
            .sections
            .values()
            .filter_map(|s| s.teacher_id.filter(|t| !t.is_tbd()))
            .collect();
        set.sort_unstable();
        set.dedup();
        set
    };
    for teacher in &teachers {
        for day in &days {
            for slot in &slot_ids {
                let cell_vars: Vec<_> = x
                    .iter()
                    .filter(|((s, _, d, t), _)| {
                        d == day
                            && t == slot
                            && ctx.sections[s].teacher_id == Some(*teacher)
                    })
                    .map(|(_, &v)| v)
                    .collect();
                if cell_vars.len() > 1 {
                    let sum: Expression = cell_vars.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }
        }
    }

    let solution = match problem.solve() {
        Ok(solution) => solution,
        Err(good_lp::ResolutionError::Infeasible) => {
            return Ok(ExactSolution {
                status: SolveStatus::Infeasible,
                objective: 0.0,
                placements: Vec::new(),
            });
        }
        Err(e) => {
            return Err(crate::error::SchedulerError::SolverFailed(format!("{:?}", e)).into())
        }
    };

    let mut placements = Vec::new();
    let mut objective_value = 0.0;
    for ((section_id, room_id, day, slot), &var) in &x {
        if solution.value(var) > 0.5 {
            placements.push(ExactPlacement {
                section_id: *section_id,
                room_id: *room_id,
                day: *day,
                slot: *slot,
            });
            let section = &ctx.sections[section_id];
            let room = &ctx.rooms[room_id];
            if !section.required_room_type.is_empty()
                && !room
                    .room_type
                    .eq_ignore_ascii_case(&section.required_room_type)
            {
                objective_value += weights.room_type_mismatch;
            }
            if section.student_count > 0 {
                let ratio = room.capacity as f64 / section.student_count as f64;
                if ratio > 2.0 {
                    objective_value += weights.capacity_waste * (ratio - 2.0);
                }
            }
        }
    }

    Ok(ExactSolution {
        status: SolveStatus::Optimal,
        objective: objective_value,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::test_support::{small_context, ContextSpec};
    use std::collections::BTreeSet;

    #[test]
    fn test_places_every_section_exactly_once() {
        let ctx = small_context(ContextSpec::default());
        let solution = solve_exact(&ctx).unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        let placed: BTreeSet<SectionId> =
            solution.placements.iter().map(|p| p.section_id).collect();
        assert_eq!(placed.len(), ctx.sections.len());
        assert_eq!(solution.placements.len(), ctx.sections.len());
    }

    #[test]
    fn test_no_room_collisions_in_solution() {
        let ctx = small_context(ContextSpec::default());
        let solution = solve_exact(&ctx).unwrap();

        let mut seen = BTreeSet::new();
        for p in &solution.placements {
            assert!(
                seen.insert((p.room_id, p.day, p.slot)),
                "room double-booked at {:?}",
                (p.room_id, p.day, p.slot)
            );
        }
    }

    #[test]
    fn test_section_without_rooms_is_infeasible() {
        let mut spec = ContextSpec::default();
        spec.add_section("BSARCH-5A_LAB", 3, None, Some(30));
        // The only lab room holds 30; make the cohort impossible to fit
        spec.sections.last_mut().unwrap().student_count = 500;
        let ctx = small_context(spec);

        let solution = solve_exact(&ctx).unwrap();
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }
}
