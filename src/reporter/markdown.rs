use crate::types::{Day, ScheduleResult};

/// Generate a markdown timetable, one table per day
pub fn generate_markdown_report(result: &ScheduleResult) -> String {
    let mut lines = vec![
        "# Room Allocation".to_string(),
        String::new(),
        format!(
            "{} of {} sections scheduled ({:.1}%), {} allocations, generated {}",
            result.scheduled_sections,
            result.total_sections,
            result.success_rate,
            result.allocations.len(),
            result.generated_at
        ),
        String::new(),
    ];

    for day in Day::ALL {
        let mut todays: Vec<_> = result
            .allocations
            .iter()
            .filter(|a| a.day == day.as_str())
            .collect();
        if todays.is_empty() {
            continue;
        }
        todays.sort_by_key(|a| a.start_slot_id);

        lines.push(format!("## {}", day.name()));
        lines.push(String::new());
        lines.push("| Time | Section | Subject | Room | Teacher |".to_string());
        lines.push("|------|---------|---------|------|---------|".to_string());
        for a in todays {
            let room = if a.is_online {
                "Online".to_string()
            } else {
                a.room_code.clone().unwrap_or_else(|| "-".to_string())
            };
            lines.push(format!(
                "| {} - {} | {} | {} {} | {} | {} |",
                a.start_time,
                a.end_time,
                a.section_code,
                a.subject_code,
                a.subject_name,
                room,
                a.teacher_name
            ));
        }
        lines.push(String::new());
    }

    if !result.unscheduled_list.is_empty() {
        lines.push("## Unscheduled".to_string());
        lines.push(String::new());
        for entry in &result.unscheduled_list {
            lines.push(format!(
                "- **{}** ({}): {}",
                entry.section_code, entry.subject_name, entry.reason
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
