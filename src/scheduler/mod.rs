mod annealer;
mod assembler;
mod compatibility;
mod context;
mod decomposer;
mod energy;
mod exact;
mod initial;
mod moves;
mod postprocess;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use annealer::*;
pub use assembler::*;
pub use compatibility::*;
pub use context::*;
pub use decomposer::*;
pub use energy::*;
pub use exact::*;
pub use initial::*;
pub use moves::*;
pub use postprocess::*;
pub use state::*;

use crate::parser::{has_errors, validate_request};
use crate::types::{
    build_time_grid, parse_hhmm, Day, HybridSplitStats, LunchMode, OptimizationStats, RoomId,
    ScheduleRequest, ScheduleResult, Section, SectionId, SlotId, TimeSlot, UnscheduledSection,
    ValidationIssue,
};
use crate::validator;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Fixed inputs for one run: the shared context, the pinned assignments,
/// and any issues found while decoding the request
pub struct PreparedRun {
    pub ctx: Context,
    pub pins: Vec<Assignment>,
    pub issues: Vec<ValidationIssue>,
    pub split_stats: HybridSplitStats,
}

/// Main entry point for schedule generation. Never fails across the API
/// boundary: structural problems come back as `success = false` with the
/// full validation list.
pub fn run_scheduler(mut request: ScheduleRequest, quiet: bool) -> ScheduleResult {
    request.config.resolve_weights();

    let issues = validate_request(&request);
    if has_errors(&issues) {
        return ScheduleResult::validation_failure(issues);
    }

    let start_time = Instant::now();
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    progress.set_message("Preparing run...");
    progress.set_position(10);
    let mut prepared = prepare_run(&request);
    let mut validation_errors = issues;
    validation_errors.append(&mut prepared.issues);

    let ctx = prepared.ctx;
    let mut state = ScheduleState::new();
    for pin in prepared.pins {
        state.insert_unchecked(&ctx, pin);
    }

    // Greedy construction
    progress.set_message("Building initial solution...");
    progress.set_position(30);
    build_initial(&mut state, &ctx);

    // Annealing
    progress.set_message("Annealing...");
    progress.set_position(50);
    let seed = ctx.config.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let anneal = optimize(&mut state, &ctx, &mut rng);

    // Post-processing
    progress.set_message("Resolving residual conflicts...");
    progress.set_position(85);
    let demoted = postprocess(&mut state, &ctx);

    // Assembly
    progress.set_message("Assembling result...");
    progress.set_position(95);
    let mut warnings = Vec::new();
    if demoted > 0 {
        warnings.push(format!(
            "{} assignment(s) demoted to TBD to resolve teacher double-booking",
            demoted
        ));
    }
    let allocations = assemble(&state, &ctx, &mut warnings);

    let conflict_count = validator::count_conflicts(&allocations);
    let unscheduled_list = collect_unscheduled(&state, &ctx);

    let total_sections = ctx.sections.len();
    let scheduled_sections = total_sections - unscheduled_list.len();
    let online_allocations = allocations.iter().filter(|a| a.is_online).count();
    let physical_allocations = allocations.len() - online_allocations;

    progress.finish_with_message("Schedule generated");

    ScheduleResult {
        success: conflict_count == 0 && scheduled_sections > 0,
        validation_errors,
        allocations,
        unscheduled_list,
        total_sections,
        scheduled_sections,
        success_rate: if total_sections > 0 {
            scheduled_sections as f64 / total_sections as f64 * 100.0
        } else {
            0.0
        },
        online_allocations,
        physical_allocations,
        hybrid_split_stats: prepared.split_stats,
        optimization_stats: OptimizationStats {
            initial_cost: anneal.initial_cost,
            final_cost: anneal.final_cost,
            iterations: anneal.iterations,
            improvements: anneal.improvements,
            quantum_tunnels: anneal.quantum_tunnels,
            block_swaps: anneal.block_swaps,
            conflict_count,
            time_elapsed_ms: start_time.elapsed().as_millis() as u64,
        },
        warnings,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Decode a request into the fixed run inputs: grid, day sets, decomposed
/// sections, pins, compatibility table, and session-slot requirements.
/// Expects `config.resolve_weights()` to have run.
pub fn prepare_run(request: &ScheduleRequest) -> PreparedRun {
    let mut issues = Vec::new();

    let slots = build_grid(request);
    let active_days = parse_days(&request.active_days, &mut issues, "active_days");
    let online_parsed = parse_days(&request.online_days, &mut issues, "online_days");
    let online_days: BTreeSet<Day> = online_parsed
        .into_iter()
        .filter(|d| active_days.contains(d))
        .collect();

    let (mut section_list, split_stats) = decompose_sections(
        &request.sections,
        &request.rooms,
        request.config.combine_split_lectures,
    );

    let pins = resolve_pins(request, &mut section_list, &slots, &mut issues);

    let sections: BTreeMap<SectionId, Section> =
        section_list.into_iter().map(|s| (s.id, s)).collect();
    let rooms: BTreeMap<RoomId, _> = request.rooms.iter().cloned().map(|r| (r.id, r)).collect();

    let compatible = compute_compatible_rooms(&sections, &rooms, &request.config);

    let needed_slots: BTreeMap<SectionId, u32> = sections
        .iter()
        .map(|(id, section)| {
            let total = plan_sessions(section, &request.config)
                .iter()
                .map(|b| b.slot_count)
                .sum();
            (*id, total)
        })
        .collect();

    PreparedRun {
        ctx: Context {
            sections,
            rooms,
            slots: slots.into_iter().map(|s| (s.id, s)).collect(),
            active_days,
            online_days,
            faculty: request
                .faculty_profiles
                .iter()
                .cloned()
                .map(|mut profile| {
                    let type_policy = request
                        .config
                        .faculty_types
                        .iter()
                        .find(|(key, _)| {
                            key.eq_ignore_ascii_case(profile.employment_type.as_str())
                        })
                        .map(|(_, policy)| policy);
                    if let Some(policy) = type_policy {
                        profile.apply_type_policy(policy);
                    }
                    (profile.teacher_id, profile)
                })
                .collect(),
            compatible,
            needed_slots,
            config: request.config.clone(),
        },
        pins,
        issues,
        split_stats,
    }
}

/// Use the request's explicit slots when present (re-indexed densely),
/// otherwise generate the grid from the configured window. Lunch is excised
/// from generated grids in auto and strict modes.
fn build_grid(request: &ScheduleRequest) -> Vec<TimeSlot> {
    let config = &request.config;
    if let Some(specs) = &request.time_slots {
        let mut slots: Vec<TimeSlot> = specs
            .iter()
            .filter_map(|spec| {
                let start = parse_hhmm(&spec.start_time)?;
                let duration = match &spec.end_time {
                    Some(end) => parse_hhmm(end)?.saturating_sub(start),
                    None => spec.duration_minutes,
                };
                Some(TimeSlot {
                    id: SlotId(0),
                    start_minutes: start,
                    duration_minutes: duration.max(1),
                })
            })
            .collect();
        slots.sort_by_key(|s| s.start_minutes);
        for (index, slot) in slots.iter_mut().enumerate() {
            slot.id = SlotId(index as u32 + 1);
        }
        return slots;
    }

    let lunch = match config.lunch_mode {
        LunchMode::Auto | LunchMode::Strict => config.lunch_window(),
        _ => None,
    };
    build_time_grid(
        config.day_open_minutes(),
        config.closing_minutes(),
        config.slot_duration_minutes,
        lunch,
    )
}

fn parse_days(names: &[String], issues: &mut Vec<ValidationIssue>, field: &str) -> Vec<Day> {
    let mut days: Vec<Day> = Vec::new();
    for name in names {
        match Day::parse(name) {
            Some(day) => {
                if !days.contains(&day) {
                    days.push(day);
                }
            }
            None => issues.push(ValidationIssue::warning(
                field,
                format!("Unknown day name '{}'", name),
            )),
        }
    }
    days.sort_by_key(|d| d.index());
    days
}

/// Apply fixed allocations: mark the matching sections pinned and build
/// their verbatim assignments (manual override, no feasibility checks).
fn resolve_pins(
    request: &ScheduleRequest,
    sections: &mut [Section],
    slots: &[TimeSlot],
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Assignment> {
    let mut pins = Vec::new();

    for fixed in &request.fixed_allocations {
        let Some(section) = sections.iter_mut().find(|s| {
            s.id == fixed.class_id
                || s.original_id == Some(fixed.class_id)
                || (!fixed.section.is_empty() && s.section_code == fixed.section)
        }) else {
            issues.push(ValidationIssue::warning(
                "fixed_allocations",
                format!("No section matches fixed allocation {}", fixed.class_id),
            ));
            continue;
        };

        let Some(day) = Day::parse(&fixed.schedule_day) else {
            issues.push(ValidationIssue::warning(
                "fixed_allocations",
                format!("Unknown day '{}'", fixed.schedule_day),
            ));
            continue;
        };

        let Some((start_minutes, end_minutes)) = parse_time_range(&fixed.schedule_time) else {
            issues.push(ValidationIssue::warning(
                "fixed_allocations",
                format!("Bad time range '{}'", fixed.schedule_time),
            ));
            continue;
        };

        let Some(start_slot) = slots.iter().find(|s| s.start_minutes == start_minutes) else {
            issues.push(ValidationIssue::warning(
                "fixed_allocations",
                format!(
                    "No slot starts at '{}' for section {}",
                    fixed.schedule_time, fixed.class_id
                ),
            ));
            continue;
        };

        let duration = end_minutes.saturating_sub(start_minutes).max(1);
        let slot_count = fixed
            .slot_count
            .unwrap_or_else(|| duration.div_ceil(start_slot.duration_minutes.max(1)));

        section.pinned_day = Some(day);
        section.pinned_room = fixed.room_id;
        section.pinned_slot = Some(start_slot.id);
        section.pinned_slot_count = Some(slot_count);

        pins.push(Assignment {
            section_id: section.id,
            room_id: fixed.room_id,
            day,
            start_slot: start_slot.id,
            slot_count,
            duration_minutes: duration,
            is_online: fixed.room_id.is_none(),
            is_lab: section.needs_lab_room(),
            teacher_id: section.teacher_id,
        });
    }

    pins
}

/// "HH:MM - HH:MM" into a minute range
fn parse_time_range(value: &str) -> Option<(u32, u32)> {
    let (start, end) = value.split_once('-')?;
    Some((parse_hhmm(start)?, parse_hhmm(end)?))
}

fn collect_unscheduled(state: &ScheduleState, ctx: &Context) -> Vec<UnscheduledSection> {
    let mut unscheduled = Vec::new();

    for (id, section) in &ctx.sections {
        let needed = ctx.needed_slots.get(id).copied().unwrap_or(0);
        let assigned = state.assigned_slot_count(*id);
        if assigned >= needed {
            continue;
        }

        let reason = if !is_placeable(ctx, section) {
            "No compatible rooms satisfy capacity, type, and college constraints".to_string()
        } else {
            format!(
                "Could not place {} of {} required session slots",
                needed - assigned,
                needed
            )
        };

        unscheduled.push(UnscheduledSection {
            section_id: *id,
            section_code: section.section_code.clone(),
            subject_name: section.subject_name.clone(),
            reason,
            needed_slots: needed,
            assigned_slots: assigned,
        });
    }

    unscheduled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        EngineConfig, FixedAllocation, RawSection, Room, ScheduleRequest, TeacherId,
    };

    fn raw_section(
        id: i64,
        code: &str,
        subject: &str,
        lec: u32,
        lab: u32,
        students: u32,
        teacher: Option<i64>,
    ) -> RawSection {
        RawSection {
            id: SectionId(id),
            section_code: code.to_string(),
            course_code: "BSCS".to_string(),
            subject_code: subject.to_string(),
            subject_name: format!("Subject {}", subject),
            teacher_id: teacher.map(TeacherId),
            teacher_name: teacher.map(|t| format!("Teacher {}", t)),
            year_level: 1,
            student_count: students,
            required_room_type: String::new(),
            lec_hours: lec,
            lab_hours: lab,
            required_features: vec![],
            college: None,
            department: "CS".to_string(),
            courses: None,
        }
    }

    fn lecture_room(id: i64, capacity: u32) -> Room {
        Room {
            id: RoomId(id),
            code: format!("R-{}", id),
            name: format!("Room {}", id),
            building: "Main".to_string(),
            campus: String::new(),
            capacity,
            room_type: "Lecture Room".to_string(),
            floor: 1,
            is_accessible: false,
            features: vec![],
            college: None,
        }
    }

    fn base_request() -> ScheduleRequest {
        let mut config = EngineConfig::default();
        config.slot_duration_minutes = 90;
        config.lunch_mode = LunchMode::None;
        config.start_time = "07:00".to_string();
        config.end_time = "20:00".to_string();
        config.seed = Some(1);
        config.max_iterations = 300;
        config.resolve_weights();

        ScheduleRequest {
            sections: vec![],
            rooms: vec![],
            time_slots: None,
            active_days: vec![
                "monday".into(),
                "tuesday".into(),
                "wednesday".into(),
                "thursday".into(),
                "friday".into(),
            ],
            online_days: vec![],
            faculty_profiles: vec![],
            fixed_allocations: vec![],
            config,
        }
    }

    #[test]
    fn test_single_section_single_room() {
        let mut request = base_request();
        request.sections = vec![raw_section(1, "CS101-A", "CS101", 3, 0, 30, Some(1))];
        request.rooms = vec![lecture_room(1, 40)];

        let result = run_scheduler(request, true);

        assert!(result.success);
        assert_eq!(result.scheduled_sections, 1);
        assert_eq!(result.allocations.len(), 1);
        let a = &result.allocations[0];
        // Earliest slot on the earliest day, ending exactly 180 minutes in
        assert_eq!(a.day, "monday");
        assert_eq!(a.start_time, "7:00 AM");
        assert_eq!(a.end_time, "10:00 AM");
        assert!(result.unscheduled_list.is_empty());
    }

    #[test]
    fn test_forced_tbd_on_conflicting_pins() {
        let mut request = base_request();
        request.sections = vec![
            raw_section(1, "CS101-A", "CS101", 3, 0, 30, Some(1)),
            raw_section(2, "CS102-B", "CS102", 3, 0, 30, Some(1)),
        ];
        request.rooms = vec![lecture_room(1, 40), lecture_room(2, 40)];
        request.fixed_allocations = vec![
            FixedAllocation {
                class_id: SectionId(1),
                room_id: Some(RoomId(2)),
                schedule_day: "monday".to_string(),
                schedule_time: "07:00 - 10:00".to_string(),
                section: String::new(),
                slot_count: None,
            },
            FixedAllocation {
                class_id: SectionId(2),
                room_id: Some(RoomId(1)),
                schedule_day: "monday".to_string(),
                schedule_time: "07:00 - 10:00".to_string(),
                section: String::new(),
                slot_count: None,
            },
        ];

        let result = run_scheduler(request, true);

        // Pins placed verbatim
        let monday_seven: Vec<_> = result
            .allocations
            .iter()
            .filter(|a| a.day == "monday" && a.start_time == "7:00 AM")
            .collect();
        assert_eq!(monday_seven.len(), 2);

        // The smaller room id keeps the teacher; the other goes TBD
        let tbd: Vec<_> = result
            .allocations
            .iter()
            .filter(|a| a.teacher_name == "TBD")
            .collect();
        assert_eq!(tbd.len(), 1);
        assert_eq!(tbd[0].room_id, Some(RoomId(2)));

        // Published output has zero teacher double-bookings
        assert_eq!(result.optimization_stats.conflict_count, 0);
    }

    #[test]
    fn test_online_day_hosts_lectures_but_not_labs() {
        let mut request = base_request();
        request.active_days.push("saturday".into());
        request.online_days = vec!["Saturday".into()];
        request.sections = vec![
            raw_section(1, "CS101-A", "CS101", 3, 0, 30, Some(1)),
            raw_section(2, "CS102-A", "CS102", 3, 0, 30, Some(2)),
            raw_section(3, "CS103-LAB", "CS103", 0, 3, 20, Some(3)),
        ];
        request.rooms = vec![lecture_room(1, 40), {
            let mut lab = lecture_room(9, 30);
            lab.room_type = "Computer Lab".to_string();
            lab
        }];

        let result = run_scheduler(request, true);

        assert!(result.success);
        // Online allocations carry no room
        for a in &result.allocations {
            if a.is_online {
                assert_eq!(a.room_id, None);
                assert_eq!(a.day, "saturday");
            }
            if a.is_lab {
                assert_ne!(a.day, "saturday");
                assert!(!a.is_online);
            }
        }
        // The greedy builder favors the free online day for lectures
        assert!(result.online_allocations >= 1);
    }

    #[test]
    fn test_six_hour_course_spreads_non_consecutively() {
        let mut request = base_request();
        request.sections = vec![raw_section(1, "CS201-A", "CS201", 6, 0, 30, Some(1))];
        request.rooms = vec![lecture_room(1, 40)];

        let result = run_scheduler(request, true);

        assert!(result.success);
        assert_eq!(result.allocations.len(), 2);
        let mut indices: Vec<u8> = result
            .allocations
            .iter()
            .map(|a| Day::parse(&a.day).unwrap().index())
            .collect();
        indices.sort_unstable();
        assert!(
            indices[1] - indices[0] >= 2,
            "sessions landed on adjacent days: {:?}",
            indices
        );
    }

    #[test]
    fn test_infeasible_section_is_reported_not_fatal() {
        let mut request = base_request();
        request.sections = vec![
            raw_section(1, "CS101-A", "CS101", 3, 0, 30, Some(1)),
            raw_section(2, "HUGE-A", "CS999", 3, 0, 100, Some(2)),
        ];
        request.rooms = vec![lecture_room(1, 50)];

        let result = run_scheduler(request, true);

        assert_eq!(result.scheduled_sections, 1);
        assert_eq!(result.unscheduled_list.len(), 1);
        let entry = &result.unscheduled_list[0];
        assert_eq!(entry.section_code, "HUGE-A");
        assert!(entry.reason.contains("No compatible rooms"));
        // The rest of the run still succeeds
        assert!(result.success);
    }

    #[test]
    fn test_validation_errors_abort_without_partial_result() {
        let mut request = base_request();
        request.sections = vec![raw_section(1, "CS101-A", "CS101", 0, 0, 30, Some(1))];
        request.rooms = vec![lecture_room(1, 40)];

        let result = run_scheduler(request, true);

        assert!(!result.success);
        assert!(result.allocations.is_empty());
        assert!(!result.validation_errors.is_empty());
    }

    #[test]
    fn test_fixed_seed_reproduces_allocations() {
        let make = || {
            let mut request = base_request();
            request.config.seed = Some(2024);
            request.sections = vec![
                raw_section(1, "CS101-A", "CS101", 3, 0, 30, Some(1)),
                raw_section(2, "CS102-A", "CS102", 3, 0, 25, Some(2)),
                raw_section(3, "CS103-A", "CS103", 3, 0, 35, Some(3)),
                raw_section(4, "CS104-A", "CS104", 3, 0, 28, Some(1)),
            ];
            request.rooms = vec![lecture_room(1, 40), lecture_room(2, 30)];
            request
        };

        let first = run_scheduler(make(), true);
        let second = run_scheduler(make(), true);

        assert_eq!(first.allocations, second.allocations);
        assert_eq!(
            first.optimization_stats.final_cost,
            second.optimization_stats.final_cost
        );
        assert_eq!(
            first.optimization_stats.iterations,
            second.optimization_stats.iterations
        );
    }

    #[test]
    fn test_hybrid_decomposition_end_to_end() {
        let mut request = base_request();
        request.sections = vec![raw_section(1, "BSCS-1A", "CS110", 3, 3, 60, Some(1))];
        request.rooms = vec![lecture_room(1, 80), {
            let mut lab = lecture_room(5, 30);
            lab.room_type = "Computer Lab".to_string();
            lab
        }, {
            let mut lab = lecture_room(6, 30);
            lab.room_type = "Computer Lab".to_string();
            lab
        }];

        let result = run_scheduler(request, true);

        assert_eq!(result.hybrid_split_stats.hybrid_sections_split, 1);
        assert_eq!(result.total_sections, 3);

        let codes: Vec<&str> = result
            .allocations
            .iter()
            .map(|a| a.section_code.as_str())
            .collect();
        assert!(codes.iter().any(|c| c.ends_with("_LEC")));
        assert!(codes.iter().any(|c| c.ends_with("_G1_LAB")));
        assert!(codes.iter().any(|c| c.ends_with("_G2_LAB")));

        // Decomposition accounting: the halves sum back to the parent
        let g1 = result
            .allocations
            .iter()
            .find(|a| a.section_code.ends_with("_G1_LAB"))
            .unwrap();
        let g2 = result
            .allocations
            .iter()
            .find(|a| a.section_code.ends_with("_G2_LAB"))
            .unwrap();
        assert_eq!(g1.student_count + g2.student_count, 60);
        assert_eq!(result.optimization_stats.conflict_count, 0);
    }
}
