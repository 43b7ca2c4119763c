use super::{FacultyProfile, FacultyTypePolicy, Room, RoomId, SectionId, TeacherId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the lunch window is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LunchMode {
    /// Lunch is excised from the grid; long teacher/cohort runs get a
    /// mandatory recovery break
    Auto,
    /// Any assignment touching the window is a hard violation
    Strict,
    /// Lunch overlap is allowed at a soft cost
    Flexible,
    /// No lunch handling at all
    None,
}

/// A section as submitted, before decomposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSection {
    pub id: SectionId,
    pub section_code: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub subject_code: String,
    #[serde(default, alias = "course_name")]
    pub subject_name: String,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default)]
    pub year_level: u8,
    #[serde(default = "default_student_count")]
    pub student_count: u32,
    #[serde(default)]
    pub required_room_type: String,
    #[serde(default)]
    pub lec_hours: u32,
    #[serde(default)]
    pub lab_hours: u32,
    #[serde(default)]
    pub required_features: Vec<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub department: String,
    /// Back-compat nested shape `{courses: {college, department}}`
    #[serde(default)]
    pub courses: Option<NestedCourseMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedCourseMeta {
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

fn default_student_count() -> u32 {
    30
}

impl RawSection {
    /// College, preferring the flat field over the nested back-compat shape
    pub fn effective_college(&self) -> Option<String> {
        self.college
            .clone()
            .or_else(|| self.courses.as_ref().and_then(|c| c.college.clone()))
    }

    pub fn effective_department(&self) -> String {
        if !self.department.is_empty() {
            return self.department.clone();
        }
        self.courses
            .as_ref()
            .and_then(|c| c.department.clone())
            .unwrap_or_default()
    }
}

/// Explicit time slot supplied with the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotSpec {
    pub id: u32,
    /// "HH:MM"
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default = "default_slot_duration")]
    pub duration_minutes: u32,
}

/// A manual pin applied before optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedAllocation {
    pub class_id: SectionId,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub schedule_day: String,
    /// "HH:MM - HH:MM"
    pub schedule_time: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub slot_count: Option<u32>,
}

/// Soft-penalty weights. The config value is authoritative; these constants
/// are only the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftWeights {
    pub room_type_mismatch: f64,
    pub specialized_lab_misuse: f64,
    pub capacity_waste: f64,
    pub lunch_overlap_flexible: f64,
    pub teacher_daily_overload: f64,
    pub accessibility_bonus: f64,
    pub morning_preference: f64,
    pub day_imbalance: f64,
    pub sibling_same_day: f64,
    pub teacher_no_lunch_break: f64,
    pub consecutive_overload: f64,
    pub night_class: f64,
    pub daily_span: f64,
    pub shift_mismatch: f64,
    pub cohort_gap: f64,
    pub unplaced_slot: f64,
}

impl Default for SoftWeights {
    fn default() -> Self {
        Self {
            room_type_mismatch: 50.0,
            specialized_lab_misuse: 500.0,
            capacity_waste: 15.0,
            lunch_overlap_flexible: 500.0,
            teacher_daily_overload: 80.0,
            accessibility_bonus: 10.0,
            morning_preference: 5.0,
            day_imbalance: 20.0,
            sibling_same_day: 100.0,
            teacher_no_lunch_break: 1000.0,
            consecutive_overload: 500.0,
            night_class: 200.0,
            daily_span: 500.0,
            shift_mismatch: 500.0,
            cohort_gap: 50.0,
            unplaced_slot: 1000.0,
        }
    }
}

impl SoftWeights {
    /// Apply `SOFT_*` overrides from the request config map
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, f64>) {
        for (key, value) in overrides {
            match key.to_uppercase().as_str() {
                "SOFT_ROOM_TYPE_MISMATCH" => self.room_type_mismatch = *value,
                "SOFT_SPECIALIZED_LAB_MISUSE" => self.specialized_lab_misuse = *value,
                "SOFT_CAPACITY_WASTE" => self.capacity_waste = *value,
                "SOFT_LUNCH_OVERLAP" => self.lunch_overlap_flexible = *value,
                "SOFT_TEACHER_DAILY_OVERLOAD" => self.teacher_daily_overload = *value,
                "SOFT_ACCESSIBILITY_BONUS" => self.accessibility_bonus = *value,
                "SOFT_MORNING_PREFERENCE" => self.morning_preference = *value,
                "SOFT_DAY_IMBALANCE" => self.day_imbalance = *value,
                "SOFT_SIBLING_SAME_DAY" => self.sibling_same_day = *value,
                "SOFT_TEACHER_NO_LUNCH_BREAK" => self.teacher_no_lunch_break = *value,
                "SOFT_CONSECUTIVE_OVERLOAD" => self.consecutive_overload = *value,
                "SOFT_NIGHT_CLASS" => self.night_class = *value,
                "SOFT_DAILY_SPAN" => self.daily_span = *value,
                "SOFT_SHIFT_MISMATCH" => self.shift_mismatch = *value,
                "SOFT_COHORT_GAP" => self.cohort_gap = *value,
                "SOFT_UNPLACED_SLOT" => self.unplaced_slot = *value,
                _ => {}
            }
        }
    }
}

/// Engine configuration with request-level overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_iterations: u32,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    pub lunch_mode: LunchMode,
    pub lunch_start_hour: u32,
    pub lunch_end_hour: u32,
    /// Campus opening, "HH:MM"
    pub start_time: String,
    /// Campus closing, "HH:MM"
    pub end_time: String,
    /// Start of the night block, "HH:MM"
    pub night_start_time: String,
    pub slot_duration_minutes: u32,
    /// Hard per-day teaching cap (hours)
    pub max_teacher_hours_per_day: u32,
    /// Soft per-day cap before overload penalties accrue (hours)
    pub soft_teacher_hours_per_day: u32,
    pub max_consecutive_hours: u32,
    pub strict_lab_room_matching: bool,
    pub strict_lecture_room_matching: bool,
    pub prioritize_accessibility: bool,
    pub allow_split_sessions: bool,
    pub combine_split_lectures: bool,
    pub capacity_tolerance: f64,
    /// Fixing the seed makes the run trajectory reproducible
    pub seed: Option<u64>,
    /// Optional wall-clock budget, sampled between iterations
    pub time_budget_ms: Option<u64>,
    pub soft_weight_overrides: BTreeMap<String, f64>,
    /// Per-employment-type cap overrides, keyed by type name
    pub faculty_types: BTreeMap<String, FacultyTypePolicy>,
    #[serde(skip)]
    pub weights: SoftWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            initial_temperature: 100.0,
            cooling_rate: 0.995,
            lunch_mode: LunchMode::Auto,
            lunch_start_hour: 12,
            lunch_end_hour: 13,
            start_time: "07:00".to_string(),
            end_time: "21:00".to_string(),
            night_start_time: "18:00".to_string(),
            slot_duration_minutes: 30,
            max_teacher_hours_per_day: 8,
            soft_teacher_hours_per_day: 6,
            max_consecutive_hours: 3,
            strict_lab_room_matching: true,
            strict_lecture_room_matching: false,
            prioritize_accessibility: false,
            allow_split_sessions: true,
            combine_split_lectures: true,
            capacity_tolerance: 0.10,
            seed: None,
            time_budget_ms: None,
            soft_weight_overrides: BTreeMap::new(),
            faculty_types: BTreeMap::new(),
            weights: SoftWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn day_open_minutes(&self) -> u32 {
        super::parse_hhmm(&self.start_time).unwrap_or(7 * 60)
    }

    pub fn closing_minutes(&self) -> u32 {
        super::parse_hhmm(&self.end_time).unwrap_or(21 * 60)
    }

    pub fn night_start_minutes(&self) -> u32 {
        super::parse_hhmm(&self.night_start_time).unwrap_or(18 * 60)
    }

    /// Lunch window in minutes, when a mode that uses it is active
    pub fn lunch_window(&self) -> Option<(u32, u32)> {
        match self.lunch_mode {
            LunchMode::None => None,
            _ => Some((self.lunch_start_hour * 60, self.lunch_end_hour * 60)),
        }
    }

    /// Resolve the authoritative weights: defaults + `SOFT_*` overrides
    pub fn resolve_weights(&mut self) {
        let mut weights = SoftWeights::default();
        weights.apply_overrides(&self.soft_weight_overrides);
        self.weights = weights;
    }
}

fn default_slot_duration() -> u32 {
    30
}

/// The full scheduling request handed in by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub sections: Vec<RawSection>,
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub time_slots: Option<Vec<TimeSlotSpec>>,
    #[serde(default = "default_active_days")]
    pub active_days: Vec<String>,
    #[serde(default)]
    pub online_days: Vec<String>,
    #[serde(default)]
    pub faculty_profiles: Vec<FacultyProfile>,
    #[serde(default)]
    pub fixed_allocations: Vec<FixedAllocation>,
    #[serde(default)]
    pub config: EngineConfig,
}

fn default_active_days() -> Vec<String> {
    vec![
        "monday".to_string(),
        "tuesday".to_string(),
        "wednesday".to_string(),
        "thursday".to_string(),
        "friday".to_string(),
    ]
}
