use super::{Day, RoomId, SectionId, SlotId, TeacherId};
use serde::{Deserialize, Serialize};

/// What a section meets for after decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Lecture,
    Lab,
    /// Lecture and lab hours taught as one block (undecomposed hybrid)
    Combined,
}

/// Half-cohort marker for split lab satellites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitGroup {
    G1,
    G2,
}

/// A schedulable section, post-decomposition.
///
/// Relations are integer ids: `original_id` points at the raw parent,
/// `sibling_id` pairs a lecture anchor with its lab, `linked_id` pairs the
/// G1/G2 half-cohorts of an oversized lab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub section_code: String,
    pub course_code: String,
    pub subject_code: String,
    pub subject_name: String,
    pub teacher_id: Option<TeacherId>,
    pub teacher_name: Option<String>,
    pub year_level: u8,
    pub student_count: u32,
    pub required_room_type: String,
    /// Weekly lecture hours carried by this section
    pub lec_hours: u32,
    /// Weekly lab hours carried by this section
    pub lab_hours: u32,
    pub required_features: Vec<String>,
    pub college: Option<String>,
    pub department: String,
    pub section_type: SectionType,
    pub split_group: Option<SplitGroup>,
    pub original_id: Option<SectionId>,
    pub sibling_id: Option<SectionId>,
    pub linked_id: Option<SectionId>,
    // Pinning fields set by fixed allocations; pinned sections never move
    pub pinned_day: Option<Day>,
    pub pinned_room: Option<RoomId>,
    pub pinned_slot: Option<SlotId>,
    pub pinned_slot_count: Option<u32>,
}

impl Section {
    /// Total weekly minutes this section must meet
    pub fn weekly_minutes(&self) -> u32 {
        (self.lec_hours + self.lab_hours) * 60
    }

    /// True when this section needs a lab room for its physical sessions
    pub fn needs_lab_room(&self) -> bool {
        self.lab_hours > 0
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_day.is_some() && self.pinned_slot.is_some()
    }

    /// Section code with every split suffix stripped; identifies the cohort
    pub fn base_code(&self) -> String {
        base_code_of(&self.section_code)
    }

    /// Key identifying one cohort-and-subject pairing across split children
    pub fn subject_group_key(&self) -> String {
        format!("{}::{}", self.base_code(), self.subject_code)
    }

    /// Cohort-hierarchy overlap: `BSCS-1A` conflicts with `BSCS-1A_G1`,
    /// while G1 and G2 of the same cohort only conflict when they share a
    /// teacher.
    pub fn cohort_conflicts_with(&self, other: &Section) -> bool {
        if self.base_code() != other.base_code() {
            return false;
        }
        match (self.split_group, other.split_group) {
            (Some(a), Some(b)) if a != b => match (self.teacher_id, other.teacher_id) {
                (Some(ta), Some(tb)) => ta == tb && !ta.is_tbd(),
                _ => false,
            },
            _ => true,
        }
    }
}

/// Strip the decomposition suffixes (`_LEC`, `_LAB`, `_G1`, `_G2`) from a
/// section code, in any stacking order
pub fn base_code_of(code: &str) -> String {
    const SUFFIXES: [&str; 4] = ["_LEC", "_LAB", "_G1", "_G2"];
    let mut base = code.trim();
    loop {
        let mut stripped = false;
        for suffix in SUFFIXES {
            if let Some(rest) = base.strip_suffix(suffix) {
                base = rest.trim_end();
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }
    base.to_string()
}
