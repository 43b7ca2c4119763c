use super::{Day, TeacherId};
use serde::{Deserialize, Serialize};

/// Faculty employment class; drives the default load policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
}

impl EmploymentType {
    /// Wire name, matching the `faculty_types` config keys
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
        }
    }
}

/// Preferred teaching shift, by session start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
}

impl Shift {
    /// Classify a start time (minutes since midnight) into a shift
    pub fn of_start(start_minutes: u32) -> Shift {
        match start_minutes {
            m if m < 12 * 60 => Shift::Morning,
            m if m < 18 * 60 => Shift::Afternoon,
            _ => Shift::Evening,
        }
    }
}

/// Per-teacher load policy supplied with the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacultyProfile {
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(default = "default_employment")]
    pub employment_type: EmploymentType,
    /// Weekly teaching-hour cap
    #[serde(default = "default_weekly_hours")]
    pub max_weekly_hours: u32,
    /// Hard daily cap; overrides the engine-wide default when present
    #[serde(default)]
    pub max_daily_hours: Option<u32>,
    /// Cap on distinct courses taught
    #[serde(default)]
    pub max_courses: Option<u32>,
    /// Cap on distinct sections taught
    #[serde(default)]
    pub max_sections: Option<u32>,
    #[serde(default)]
    pub unavailable_days: Vec<Day>,
    #[serde(default)]
    pub preferred_shift: Option<Shift>,
    /// When set, a shift mismatch is a hard violation instead of a soft one
    #[serde(default)]
    pub shift_is_hard: bool,
}

fn default_employment() -> EmploymentType {
    EmploymentType::FullTime
}

fn default_weekly_hours() -> u32 {
    24
}

impl FacultyProfile {
    /// Part-time faculty do not teach Saturdays
    pub fn allows_day(&self, day: Day) -> bool {
        if self.unavailable_days.contains(&day) {
            return false;
        }
        !(self.employment_type == EmploymentType::PartTime && day == Day::Saturday)
    }

    /// Fold the per-employment-type policy from the request config into
    /// this profile
    pub fn apply_type_policy(&mut self, policy: &FacultyTypePolicy) {
        if let Some(weekly) = policy.max_weekly_hours {
            self.max_weekly_hours = weekly;
        }
        if let Some(daily) = policy.max_daily_hours {
            self.max_daily_hours = Some(daily);
        }
        if let Some(hard) = policy.shift_is_hard {
            self.shift_is_hard = hard;
        }
    }
}

/// Employment-type defaults supplied via the request config's
/// `faculty_types` map, keyed by employment type name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacultyTypePolicy {
    #[serde(default)]
    pub max_weekly_hours: Option<u32>,
    #[serde(default)]
    pub max_daily_hours: Option<u32>,
    #[serde(default)]
    pub shift_is_hard: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_classification() {
        assert_eq!(Shift::of_start(7 * 60), Shift::Morning);
        assert_eq!(Shift::of_start(13 * 60), Shift::Afternoon);
        assert_eq!(Shift::of_start(18 * 60), Shift::Evening);
    }

    #[test]
    fn test_part_time_saturday() {
        let profile = FacultyProfile {
            teacher_id: TeacherId(1),
            teacher_name: None,
            employment_type: EmploymentType::PartTime,
            max_weekly_hours: 12,
            max_daily_hours: None,
            max_courses: None,
            max_sections: None,
            unavailable_days: vec![Day::Wednesday],
            preferred_shift: None,
            shift_is_hard: false,
        };
        assert!(!profile.allows_day(Day::Saturday));
        assert!(!profile.allows_day(Day::Wednesday));
        assert!(profile.allows_day(Day::Monday));
    }

    #[test]
    fn test_type_policy_overrides_caps() {
        let mut profile = FacultyProfile {
            teacher_id: TeacherId(1),
            teacher_name: None,
            employment_type: EmploymentType::PartTime,
            max_weekly_hours: 24,
            max_daily_hours: None,
            max_courses: None,
            max_sections: None,
            unavailable_days: vec![],
            preferred_shift: None,
            shift_is_hard: false,
        };
        profile.apply_type_policy(&FacultyTypePolicy {
            max_weekly_hours: Some(12),
            max_daily_hours: Some(4),
            shift_is_hard: Some(true),
        });
        assert_eq!(profile.max_weekly_hours, 12);
        assert_eq!(profile.max_daily_hours, Some(4));
        assert!(profile.shift_is_hard);
    }
}
