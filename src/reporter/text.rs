use crate::types::{ScheduleResult, Severity};
use colored::Colorize;

/// Generate a plain text report (with colors for terminal)
pub fn generate_text_report(result: &ScheduleResult) -> String {
    let mut lines = Vec::new();

    lines.push("═".repeat(60));
    lines.push("               ROOM ALLOCATION REPORT".to_string());
    lines.push("═".repeat(60));
    lines.push(String::new());

    lines.push(format!("Generated: {}", result.generated_at));
    lines.push(format!(
        "Solve Time: {}ms",
        result.optimization_stats.time_elapsed_ms
    ));
    lines.push(String::new());

    lines.push("─".repeat(40));
    lines.push("STATISTICS".to_string());
    lines.push("─".repeat(40));
    lines.push(format!("  Sections:      {}", result.total_sections));
    lines.push(format!("  Scheduled:     {}", result.scheduled_sections));
    lines.push(format!("  Success Rate:  {:.1}%", result.success_rate));
    lines.push(format!(
        "  Allocations:   {} ({} online, {} physical)",
        result.allocations.len(),
        result.online_allocations,
        result.physical_allocations
    ));
    lines.push(format!(
        "  Cost:          {:.1} -> {:.1} over {} iterations",
        result.optimization_stats.initial_cost,
        result.optimization_stats.final_cost,
        result.optimization_stats.iterations
    ));
    lines.push(format!(
        "  Tunnels:       {} ({} block swaps)",
        result.optimization_stats.quantum_tunnels, result.optimization_stats.block_swaps
    ));
    lines.push(String::new());

    lines.push("─".repeat(40));
    if result.success {
        lines.push("RESULT: OK".green().to_string());
    } else {
        lines.push("RESULT: INCOMPLETE".red().to_string());
    }
    for issue in &result.validation_errors {
        let tag = match issue.severity {
            Severity::Error => "error".red().to_string(),
            Severity::Warning => "warning".yellow().to_string(),
            Severity::Info => "info".to_string(),
        };
        lines.push(format!("  [{}] {}: {}", tag, issue.field, issue.message));
    }
    for warning in &result.warnings {
        lines.push(format!("  ! {}", warning));
    }
    lines.push("─".repeat(40));
    lines.push(String::new());

    if !result.unscheduled_list.is_empty() {
        lines.push("UNSCHEDULED".to_string());
        for entry in &result.unscheduled_list {
            lines.push(format!(
                "  - {} ({}): {} [{}/{} slots]",
                entry.section_code,
                entry.subject_name,
                entry.reason,
                entry.assigned_slots,
                entry.needed_slots
            ));
        }
        lines.push(String::new());
    }

    lines.push("ALLOCATIONS".to_string());
    for a in &result.allocations {
        let location = match (&a.room_code, a.is_online) {
            (_, true) => "ONLINE".to_string(),
            (Some(code), _) => code.clone(),
            (None, _) => "-".to_string(),
        };
        lines.push(format!(
            "  {:<12} {:<10} {:<9} {} - {}  {:<10} {}",
            a.section_code,
            a.subject_code,
            a.day,
            a.start_time,
            a.end_time,
            location,
            a.teacher_name
        ));
    }

    lines.join("\n")
}

/// Console summary after a run
pub fn print_summary(result: &ScheduleResult) {
    let headline = format!(
        "Scheduled {}/{} sections ({:.1}%)",
        result.scheduled_sections, result.total_sections, result.success_rate
    );
    if result.success {
        println!("{}", headline.green().bold());
    } else {
        println!("{}", headline.yellow().bold());
    }

    println!(
        "Cost {:.1} -> {:.1}, {} iterations, {} improvements, {} tunnels, {}ms",
        result.optimization_stats.initial_cost,
        result.optimization_stats.final_cost,
        result.optimization_stats.iterations,
        result.optimization_stats.improvements,
        result.optimization_stats.quantum_tunnels,
        result.optimization_stats.time_elapsed_ms
    );

    if result.optimization_stats.conflict_count > 0 {
        println!(
            "{}",
            format!(
                "{} unresolved conflicts",
                result.optimization_stats.conflict_count
            )
            .red()
        );
    }
    if !result.unscheduled_list.is_empty() {
        println!(
            "{}",
            format!("{} sections unscheduled", result.unscheduled_list.len()).yellow()
        );
    }
}
