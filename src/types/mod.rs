mod day;
mod faculty;
mod request;
mod result;
mod room;
mod section;
mod timeslot;

pub use day::*;
pub use faculty::*;
pub use request::*;
pub use result::*;
pub use room::*;
pub use section::*;
pub use timeslot::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for section identifiers (synthetic ids from decomposition are negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub i64);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for room identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub i64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for teacher identifiers; `TeacherId(0)` is the TBD sentinel
/// written by the post-processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeacherId(pub i64);

impl TeacherId {
    pub const TBD: TeacherId = TeacherId(0);

    pub fn is_tbd(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for time-slot identifiers (dense, 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
