use crate::types::{ScheduleRequest, Severity, ValidationIssue};

/// Pre-flight §-style validation of a request. Any `error` severity aborts
/// the run before solving; warnings ride along in the result.
pub fn validate_request(request: &ScheduleRequest) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if request.sections.is_empty() {
        issues.push(ValidationIssue::error("sections", "No sections provided"));
    }
    if request.rooms.is_empty() {
        issues.push(ValidationIssue::error("rooms", "No rooms provided"));
    }

    for section in &request.sections {
        let hours = section.lec_hours + section.lab_hours;
        if hours == 0 {
            issues.push(ValidationIssue::error(
                "sections",
                format!(
                    "Section '{}' has zero weekly hours",
                    section.section_code
                ),
            ));
        } else if hours > 40 {
            issues.push(ValidationIssue::error(
                "sections",
                format!(
                    "Section '{}' has {} weekly hours (max 40)",
                    section.section_code, hours
                ),
            ));
        }

        if section.student_count == 0 {
            issues.push(ValidationIssue::error(
                "sections",
                format!(
                    "Section '{}' has no students",
                    section.section_code
                ),
            ));
        }
    }

    for room in &request.rooms {
        if room.capacity == 0 {
            issues.push(ValidationIssue::error(
                "rooms",
                format!("Room '{}' has zero capacity", room.code),
            ));
        }
    }

    let has_lab_sections = request.sections.iter().any(|s| s.lab_hours > 0);
    let has_lab_rooms = request.rooms.iter().any(|r| r.is_lab_room());
    if has_lab_sections && !has_lab_rooms {
        issues.push(ValidationIssue::error(
            "rooms",
            "Lab sections present but no lab rooms available",
        ));
    }

    check_demand_supply(request, &mut issues);

    let config = &request.config;
    if !(0.5..1.0).contains(&config.cooling_rate) {
        issues.push(ValidationIssue::error(
            "config.cooling_rate",
            format!(
                "cooling_rate {} outside [0.5, 1.0)",
                config.cooling_rate
            ),
        ));
    }
    if config.max_iterations < 100 {
        issues.push(ValidationIssue::warning(
            "config.max_iterations",
            format!(
                "max_iterations {} is very low; results may be poor",
                config.max_iterations
            ),
        ));
    }

    issues
}

/// Total requested teaching minutes must fit in the physical week
fn check_demand_supply(request: &ScheduleRequest, issues: &mut Vec<ValidationIssue>) {
    if request.rooms.is_empty() || request.sections.is_empty() {
        return;
    }

    let config = &request.config;
    let open = config.day_open_minutes();
    let close = config.closing_minutes();
    if close <= open {
        issues.push(ValidationIssue::error(
            "config.end_time",
            "Campus closing must be after opening",
        ));
        return;
    }

    let lunch_minutes = config
        .lunch_window()
        .map(|(start, end)| end.saturating_sub(start))
        .unwrap_or(0);
    let day_minutes = (close - open).saturating_sub(lunch_minutes) as u64;

    let physical_days = request
        .active_days
        .iter()
        .filter(|d| !request.online_days.iter().any(|o| o.eq_ignore_ascii_case(d)))
        .count() as u64;

    let supply = day_minutes * physical_days.max(1) * request.rooms.len() as u64;
    let demand: u64 = request
        .sections
        .iter()
        .map(|s| ((s.lec_hours + s.lab_hours) * 60) as u64)
        .sum();

    if demand > supply {
        issues.push(ValidationIssue::error(
            "sections",
            format!(
                "Requested {} teaching minutes exceed the {} available room-minutes",
                demand, supply
            ),
        ));
    }
}

/// True when any issue is a hard error
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawSection, Room, RoomId, ScheduleRequest, SectionId};

    fn raw_section(code: &str, lec: u32, lab: u32, students: u32) -> RawSection {
        RawSection {
            id: SectionId(1),
            section_code: code.to_string(),
            course_code: String::new(),
            subject_code: "CS101".to_string(),
            subject_name: "Intro".to_string(),
            teacher_id: None,
            teacher_name: None,
            year_level: 1,
            student_count: students,
            required_room_type: String::new(),
            lec_hours: lec,
            lab_hours: lab,
            required_features: vec![],
            college: None,
            department: String::new(),
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

    fn request(sections: Vec<RawSection>, rooms: Vec<Room>) -> ScheduleRequest {
        ScheduleRequest {
            sections,
            rooms,
            time_slots: None,
            active_days: vec!["monday".into(), "tuesday".into(), "wednesday".into()],
            online_days: vec![],
            faculty_profiles: vec![],
            fixed_allocations: vec![],
            config: Default::default(),
        }
    }

    #[test]
    fn test_empty_request_rejected() {
        let issues = validate_request(&request(vec![], vec![]));
        assert!(has_errors(&issues));
        assert!(issues.iter().any(|i| i.field == "sections"));
        assert!(issues.iter().any(|i| i.field == "rooms"));
    }

    #[test]
    fn test_zero_hours_rejected() {
        let issues = validate_request(&request(
            vec![raw_section("BSCS-1A", 0, 0, 30)],
            vec![lecture_room(1, 40)],
        ));
        assert!(has_errors(&issues));
    }

    #[test]
    fn test_lab_sections_need_lab_rooms() {
        let issues = validate_request(&request(
            vec![raw_section("BSCS-1A", 0, 3, 30)],
            vec![lecture_room(1, 40)],
        ));
        assert!(issues
            .iter()
            .any(|i| i.message.contains("no lab rooms")));
    }

    #[test]
    fn test_bad_cooling_rate_rejected() {
        let mut req = request(
            vec![raw_section("BSCS-1A", 3, 0, 30)],
            vec![lecture_room(1, 40)],
        );
        req.config.cooling_rate = 1.5;
        let issues = validate_request(&req);
        assert!(issues.iter().any(|i| i.field == "config.cooling_rate"));
    }

    #[test]
    fn test_low_iterations_is_warning_only() {
        let mut req = request(
            vec![raw_section("BSCS-1A", 3, 0, 30)],
            vec![lecture_room(1, 40)],
        );
        req.config.max_iterations = 50;
        let issues = validate_request(&req);
        assert!(!has_errors(&issues));
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn test_valid_request_passes() {
        let issues = validate_request(&request(
            vec![raw_section("BSCS-1A", 3, 0, 30)],
            vec![lecture_room(1, 40)],
        ));
        assert!(!has_errors(&issues));
    }
}
