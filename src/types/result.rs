use super::{RoomId, SectionId, SlotId, TeacherId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A structural input problem found before solving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// Which component of a decomposed section an allocation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    #[serde(rename = "LEC")]
    Lec,
    #[serde(rename = "LAB")]
    Lab,
}

/// One scheduled session block in the published output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub section_id: SectionId,
    pub section_code: String,
    pub course_code: String,
    pub subject_code: String,
    pub subject_name: String,
    pub room_id: Option<RoomId>,
    pub room_code: Option<String>,
    pub room_name: Option<String>,
    pub building: Option<String>,
    pub day: String,
    /// 12-hour clock, e.g. "7:00 AM"
    pub start_time: String,
    pub end_time: String,
    pub start_slot_id: SlotId,
    pub slot_count: u32,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub year_level: u8,
    pub student_count: u32,
    pub department: String,
    pub college: Option<String>,
    pub is_lab: bool,
    pub lec_hours: u32,
    pub lab_hours: u32,
    pub is_online: bool,
    pub section_type: String,
    pub component: Component,
    pub original_section_id: Option<SectionId>,
    pub sibling_id: Option<SectionId>,
}

/// A section the engine could not fully place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnscheduledSection {
    pub section_id: SectionId,
    pub section_code: String,
    pub subject_name: String,
    pub reason: String,
    pub needed_slots: u32,
    pub assigned_slots: u32,
}

/// Optimizer telemetry for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationStats {
    pub initial_cost: f64,
    pub final_cost: f64,
    pub iterations: u32,
    pub improvements: u32,
    pub quantum_tunnels: u32,
    pub block_swaps: u32,
    pub conflict_count: u32,
    pub time_elapsed_ms: u64,
}

/// Decomposition bookkeeping surfaced with the result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HybridSplitStats {
    pub hybrid_sections_split: u32,
    pub oversized_labs_split: u32,
    pub child_sections_created: u32,
}

/// The complete engine response. Always well-formed: a failed run carries
/// its validation errors instead of allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub success: bool,
    pub validation_errors: Vec<ValidationIssue>,
    pub allocations: Vec<AllocationRecord>,
    pub unscheduled_list: Vec<UnscheduledSection>,
    pub total_sections: usize,
    pub scheduled_sections: usize,
    pub success_rate: f64,
    pub online_allocations: usize,
    pub physical_allocations: usize,
    pub hybrid_split_stats: HybridSplitStats,
    pub optimization_stats: OptimizationStats,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

impl ScheduleResult {
    /// A run rejected by pre-flight validation; never a partial result
    pub fn validation_failure(issues: Vec<ValidationIssue>) -> Self {
        Self {
            success: false,
            validation_errors: issues,
            allocations: Vec::new(),
            unscheduled_list: Vec::new(),
            total_sections: 0,
            scheduled_sections: 0,
            success_rate: 0.0,
            online_allocations: 0,
            physical_allocations: 0,
            hybrid_split_stats: HybridSplitStats::default(),
            optimization_stats: OptimizationStats::default(),
            warnings: Vec::new(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
