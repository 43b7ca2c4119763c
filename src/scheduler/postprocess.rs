use super::context::Context;
use super::initial;
use super::state::ScheduleState;
use crate::types::{Day, RoomId, SectionId, SlotId, TeacherId};
use std::collections::BTreeMap;

/// Phase 6: one more aggressive placement pass, then demote any surviving
/// teacher double-booking to the TBD sentinel so the published schedule is
/// always physically executable.
///
/// Returns the number of demoted assignments.
pub fn postprocess(state: &mut ScheduleState, ctx: &Context) -> u32 {
    initial::aggressive_reschedule(state, ctx);
    demote_teacher_conflicts(state)
}

/// Deterministic sweep: among overlapping same-teacher assignments the one
/// with the smallest room id keeps its teacher (online sessions sort before
/// any room); every other one becomes TBD.
fn demote_teacher_conflicts(state: &mut ScheduleState) -> u32 {
    let mut by_slot: BTreeMap<(TeacherId, Day, SlotId), Vec<AssignmentKey>> = BTreeMap::new();

    for a in state.assignments() {
        let Some(teacher) = a.teacher_id.filter(|t| !t.is_tbd()) else {
            continue;
        };
        for slot in a.slot_range() {
            by_slot
                .entry((teacher, a.day, SlotId(slot)))
                .or_default()
                .push(AssignmentKey {
                    section_id: a.section_id,
                    room_id: a.room_id,
                    day: a.day,
                    start_slot: a.start_slot,
                });
        }
    }

    let mut to_demote: Vec<AssignmentKey> = Vec::new();
    for (_, mut contenders) in by_slot {
        if contenders.len() < 2 {
            continue;
        }
        contenders.sort();
        contenders.dedup();
        if contenders.len() < 2 {
            continue;
        }
        for loser in &contenders[1..] {
            if !to_demote.contains(loser) {
                to_demote.push(loser.clone());
            }
        }
    }

    let demoted = to_demote.len() as u32;
    for key in to_demote {
        state.demote_teacher(key.section_id, key.room_id, key.day, key.start_slot);
    }
    demoted
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AssignmentKey {
    // Room first: the smallest room id wins the tie-break
    room_id: Option<RoomId>,
    section_id: SectionId,
    day: Day,
    start_slot: SlotId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::state::Assignment;
    use crate::scheduler::test_support::{small_context, ContextSpec};

    #[test]
    fn test_teacher_double_booking_demoted_to_tbd() {
        let ctx = small_context(ContextSpec::default());
        let mut state = ScheduleState::new();

        // Sections 1 and 4 share teacher 1; force an overlap with
        // unchecked inserts, the way conflicting pins would land
        state.insert_unchecked(
            &ctx,
            Assignment {
                section_id: SectionId(1),
                room_id: Some(RoomId(2)),
                day: Day::Monday,
                start_slot: SlotId(1),
                slot_count: 2,
                duration_minutes: 90,
                is_online: false,
                is_lab: false,
                teacher_id: Some(TeacherId(1)),
            },
        );
        state.insert_unchecked(
            &ctx,
            Assignment {
                section_id: SectionId(4),
                room_id: Some(RoomId(1)),
                day: Day::Monday,
                start_slot: SlotId(1),
                slot_count: 2,
                duration_minutes: 90,
                is_online: false,
                is_lab: false,
                teacher_id: Some(TeacherId(1)),
            },
        );

        let demoted = demote_teacher_conflicts(&mut state);
        assert_eq!(demoted, 1);

        // The smaller room id keeps its teacher
        let keeper = state.section_assignments(SectionId(4))[0].clone();
        let loser = state.section_assignments(SectionId(1))[0].clone();
        assert_eq!(keeper.teacher_id, Some(TeacherId(1)));
        assert_eq!(loser.teacher_id, Some(TeacherId::TBD));

        // Re-running finds nothing further to demote
        assert_eq!(demote_teacher_conflicts(&mut state), 0);
    }

    #[test]
    fn test_no_demotion_without_overlap() {
        let ctx = small_context(ContextSpec::default());
        let mut state = ScheduleState::new();

        assert!(state.allocate(&ctx, SectionId(1), Some(RoomId(1)), Day::Monday, SlotId(1), 2, false, 90));
        assert!(state.allocate(&ctx, SectionId(4), Some(RoomId(1)), Day::Monday, SlotId(3), 2, false, 90));

        assert_eq!(demote_teacher_conflicts(&mut state), 0);
    }
}
