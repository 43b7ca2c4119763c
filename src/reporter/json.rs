use crate::error::Result;
use crate::types::ScheduleResult;

/// Generate JSON report of the full result
pub fn generate_json_report(result: &ScheduleResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Summary statistics as JSON
#[derive(serde::Serialize)]
pub struct JsonSummary {
    pub success: bool,
    pub total_sections: usize,
    pub scheduled_sections: usize,
    pub success_rate: f64,
    pub total_allocations: usize,
    pub online_allocations: usize,
    pub unscheduled_count: usize,
    pub conflict_count: u32,
    pub final_cost: f64,
    pub time_elapsed_ms: u64,
}

pub fn generate_json_summary(result: &ScheduleResult) -> Result<String> {
    let summary = JsonSummary {
        success: result.success,
        total_sections: result.total_sections,
        scheduled_sections: result.scheduled_sections,
        success_rate: result.success_rate,
        total_allocations: result.allocations.len(),
        online_allocations: result.online_allocations,
        unscheduled_count: result.unscheduled_list.len(),
        conflict_count: result.optimization_stats.conflict_count,
        final_cost: result.optimization_stats.final_cost,
        time_elapsed_ms: result.optimization_stats.time_elapsed_ms,
    };

    Ok(serde_json::to_string_pretty(&summary)?)
}
