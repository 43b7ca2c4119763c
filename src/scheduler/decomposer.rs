use crate::types::{
    HybridSplitStats, RawSection, Room, Section, SectionId, SectionType, SplitGroup,
};

/// Phase 2: split hybrid and oversized sections into linked children.
///
/// A hybrid section bigger than the median lab-room capacity becomes a
/// full-size `_LEC` anchor plus two half-size `_G1_LAB`/`_G2_LAB`
/// satellites. Oversized pure labs split into `_G1`/`_G2`. Smaller hybrids
/// still split into `_LEC` + `_LAB` siblings when
/// `combine_split_lectures` is on.
pub fn decompose_sections(
    raw_sections: &[RawSection],
    rooms: &[Room],
    combine_split_lectures: bool,
) -> (Vec<Section>, HybridSplitStats) {
    let median_lab_capacity = median_lab_capacity(rooms);
    let mut next_id = raw_sections.iter().map(|s| s.id.0).max().unwrap_or(0) + 1;
    let mut sections = Vec::new();
    let mut stats = HybridSplitStats::default();

    for raw in raw_sections {
        let hybrid = raw.lec_hours > 0 && raw.lab_hours > 0;
        let oversized = median_lab_capacity
            .map(|cap| raw.student_count > cap)
            .unwrap_or(false);

        if hybrid && oversized {
            let g1_count = raw.student_count.div_ceil(2);
            let g2_count = raw.student_count / 2;

            let lec_id = SectionId(next_id);
            let g1_id = SectionId(next_id + 1);
            let g2_id = SectionId(next_id + 2);
            next_id += 3;

            let mut lec = child_of(raw, lec_id, "_LEC", SectionType::Lecture);
            lec.lec_hours = raw.lec_hours;
            lec.lab_hours = 0;
            lec.sibling_id = Some(g1_id);

            let mut g1 = child_of(raw, g1_id, "_G1_LAB", SectionType::Lab);
            g1.lec_hours = 0;
            g1.lab_hours = raw.lab_hours;
            g1.student_count = g1_count;
            g1.split_group = Some(SplitGroup::G1);
            g1.sibling_id = Some(lec_id);
            g1.linked_id = Some(g2_id);

            let mut g2 = child_of(raw, g2_id, "_G2_LAB", SectionType::Lab);
            g2.lec_hours = 0;
            g2.lab_hours = raw.lab_hours;
            g2.student_count = g2_count;
            g2.split_group = Some(SplitGroup::G2);
            g2.sibling_id = Some(lec_id);
            g2.linked_id = Some(g1_id);

            sections.push(lec);
            sections.push(g1);
            sections.push(g2);
            stats.hybrid_sections_split += 1;
            stats.child_sections_created += 3;
        } else if !hybrid && raw.lab_hours > 0 && oversized {
            let g1_count = raw.student_count.div_ceil(2);
            let g2_count = raw.student_count / 2;

            let g1_id = SectionId(next_id);
            let g2_id = SectionId(next_id + 1);
            next_id += 2;

            let mut g1 = child_of(raw, g1_id, "_G1", SectionType::Lab);
            g1.lab_hours = raw.lab_hours;
            g1.student_count = g1_count;
            g1.split_group = Some(SplitGroup::G1);
            g1.linked_id = Some(g2_id);

            let mut g2 = child_of(raw, g2_id, "_G2", SectionType::Lab);
            g2.lab_hours = raw.lab_hours;
            g2.student_count = g2_count;
            g2.split_group = Some(SplitGroup::G2);
            g2.linked_id = Some(g1_id);

            sections.push(g1);
            sections.push(g2);
            stats.oversized_labs_split += 1;
            stats.child_sections_created += 2;
        } else if hybrid && combine_split_lectures {
            let lec_id = SectionId(next_id);
            let lab_id = SectionId(next_id + 1);
            next_id += 2;

            let mut lec = child_of(raw, lec_id, "_LEC", SectionType::Lecture);
            lec.lec_hours = raw.lec_hours;
            lec.lab_hours = 0;
            lec.sibling_id = Some(lab_id);

            let mut lab = child_of(raw, lab_id, "_LAB", SectionType::Lab);
            lab.lec_hours = 0;
            lab.lab_hours = raw.lab_hours;
            lab.sibling_id = Some(lec_id);

            sections.push(lec);
            sections.push(lab);
            stats.hybrid_sections_split += 1;
            stats.child_sections_created += 2;
        } else {
            let section_type = if hybrid {
                SectionType::Combined
            } else if raw.lab_hours > 0 {
                SectionType::Lab
            } else {
                SectionType::Lecture
            };
            let mut section = child_of(raw, raw.id, "", section_type);
            section.lec_hours = raw.lec_hours;
            section.lab_hours = raw.lab_hours;
            section.original_id = None;
            sections.push(section);
        }
    }

    (sections, stats)
}

/// Median capacity over lab rooms, used as the oversize threshold
fn median_lab_capacity(rooms: &[Room]) -> Option<u32> {
    let mut capacities: Vec<u32> = rooms
        .iter()
        .filter(|r| r.is_lab_room())
        .map(|r| r.capacity)
        .collect();
    if capacities.is_empty() {
        return None;
    }
    capacities.sort_unstable();
    Some(capacities[capacities.len() / 2])
}

fn child_of(raw: &RawSection, id: SectionId, suffix: &str, section_type: SectionType) -> Section {
    Section {
        id,
        section_code: format!("{}{}", raw.section_code, suffix),
        course_code: raw.course_code.clone(),
        subject_code: raw.subject_code.clone(),
        subject_name: raw.subject_name.clone(),
        teacher_id: raw.teacher_id,
        teacher_name: raw.teacher_name.clone(),
        year_level: raw.year_level,
        student_count: raw.student_count,
        required_room_type: raw.required_room_type.clone(),
        lec_hours: 0,
        lab_hours: 0,
        required_features: raw.required_features.clone(),
        college: raw.effective_college(),
        department: raw.effective_department(),
        section_type,
        split_group: None,
        original_id: Some(raw.id),
        sibling_id: None,
        linked_id: None,
        pinned_day: None,
        pinned_room: None,
        pinned_slot: None,
        pinned_slot_count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomId;

    fn raw(id: i64, code: &str, lec: u32, lab: u32, students: u32) -> RawSection {
        RawSection {
            id: SectionId(id),
            section_code: code.to_string(),
            course_code: "BSCS".to_string(),
            subject_code: "CS101".to_string(),
            subject_name: "Intro to Computing".to_string(),
            teacher_id: None,
            teacher_name: None,
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

    fn room(id: i64, room_type: &str, capacity: u32) -> Room {
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
            college: None,
        }
    }

    #[test]
    fn test_oversized_hybrid_splits_into_anchor_and_satellites() {
        let rooms = vec![room(1, "Computer Lab", 30), room(2, "Lecture Room", 80)];
        let raws = vec![raw(1, "BSCS-1A", 3, 3, 60)];

        let (sections, stats) = decompose_sections(&raws, &rooms, true);

        assert_eq!(sections.len(), 3);
        assert_eq!(stats.hybrid_sections_split, 1);

        let lec = &sections[0];
        let g1 = &sections[1];
        let g2 = &sections[2];

        assert!(lec.section_code.ends_with("_LEC"));
        assert_eq!(lec.student_count, 60);
        assert_eq!(lec.lab_hours, 0);

        assert!(g1.section_code.ends_with("_G1_LAB"));
        assert!(g2.section_code.ends_with("_G2_LAB"));
        assert_eq!(g1.student_count + g2.student_count, 60);
        assert_eq!(g1.lec_hours, 0);

        // Mutually linked, all pointing back at the parent
        assert_eq!(g1.linked_id, Some(g2.id));
        assert_eq!(g2.linked_id, Some(g1.id));
        assert_eq!(g1.sibling_id, Some(lec.id));
        assert_eq!(lec.original_id, Some(SectionId(1)));
        assert_eq!(g2.original_id, Some(SectionId(1)));
    }

    #[test]
    fn test_odd_student_count_splits_unevenly() {
        let rooms = vec![room(1, "Computer Lab", 30)];
        let raws = vec![raw(1, "BSCS-1A", 0, 3, 61)];

        let (sections, stats) = decompose_sections(&raws, &rooms, true);

        assert_eq!(sections.len(), 2);
        assert_eq!(stats.oversized_labs_split, 1);
        assert_eq!(sections[0].student_count, 31);
        assert_eq!(sections[1].student_count, 30);
    }

    #[test]
    fn test_small_hybrid_splits_into_siblings() {
        let rooms = vec![room(1, "Computer Lab", 40)];
        let raws = vec![raw(1, "BSCS-1A", 2, 3, 25)];

        let (sections, _) = decompose_sections(&raws, &rooms, true);

        assert_eq!(sections.len(), 2);
        let lec = &sections[0];
        let lab = &sections[1];
        assert_eq!(lec.sibling_id, Some(lab.id));
        assert_eq!(lab.sibling_id, Some(lec.id));
        assert_eq!(lec.lec_hours, 2);
        assert_eq!(lab.lab_hours, 3);
        assert_eq!(lab.student_count, 25);
    }

    #[test]
    fn test_small_hybrid_stays_combined_when_disabled() {
        let rooms = vec![room(1, "Computer Lab", 40)];
        let raws = vec![raw(1, "BSCS-1A", 2, 3, 25)];

        let (sections, _) = decompose_sections(&raws, &rooms, false);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_type, SectionType::Combined);
        assert_eq!(sections[0].lec_hours, 2);
        assert_eq!(sections[0].lab_hours, 3);
    }

    #[test]
    fn test_plain_lecture_untouched() {
        let rooms = vec![room(1, "Lecture Room", 40)];
        let raws = vec![raw(7, "BSCS-2A", 3, 0, 35)];

        let (sections, stats) = decompose_sections(&raws, &rooms, true);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, SectionId(7));
        assert_eq!(sections[0].section_type, SectionType::Lecture);
        assert_eq!(sections[0].original_id, None);
        assert_eq!(stats.child_sections_created, 0);
    }
}
