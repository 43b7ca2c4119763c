use super::RoomId;
use serde::{Deserialize, Serialize};

/// Represents a physical room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    #[serde(default, alias = "room_code")]
    pub code: String,
    #[serde(default, alias = "room_name")]
    pub name: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub campus: String,
    pub capacity: u32,
    /// Free-form room type, e.g. "Lecture Room", "Computer Lab", "Drafting"
    #[serde(default)]
    pub room_type: String,
    #[serde(default = "default_floor")]
    pub floor: i32,
    #[serde(default)]
    pub is_accessible: bool,
    /// Equipment feature tags (e.g., "projector", "drafting_tables")
    #[serde(default)]
    pub features: Vec<String>,
    /// Owning college, or None / "Shared" for common rooms
    #[serde(default)]
    pub college: Option<String>,
}

fn default_floor() -> i32 {
    1
}

impl Room {
    /// A room is a lab room iff its type mentions "lab" or "computer"
    pub fn is_lab_room(&self) -> bool {
        let lower = self.room_type.to_lowercase();
        lower.contains("lab") || lower.contains("computer")
    }

    /// Check if room has all required equipment features
    pub fn has_features(&self, required: &[String]) -> bool {
        required.iter().all(|f| self.features.contains(f))
    }

    /// College gate: a room is open to a section when it is shared, untagged,
    /// or owned by the section's college
    pub fn allows_college(&self, college: Option<&str>) -> bool {
        match self.college.as_deref() {
            None => true,
            Some(tag) if tag.eq_ignore_ascii_case("shared") => true,
            Some(tag) => match college {
                Some(c) => tag.eq_ignore_ascii_case(c),
                None => false,
            },
        }
    }
}
