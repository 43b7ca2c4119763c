use serde::{Deserialize, Serialize};
use std::fmt;

/// Day of week. Indices are used by the non-consecutive-day rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// 0-based index within the week (Monday = 0)
    pub fn index(&self) -> u8 {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 1,
            Day::Wednesday => 2,
            Day::Thursday => 3,
            Day::Friday => 4,
            Day::Saturday => 5,
            Day::Sunday => 6,
        }
    }

    /// Case-insensitive parse of a day name ("monday", "Mon", "MONDAY")
    pub fn parse(name: &str) -> Option<Day> {
        let lower = name.trim().to_lowercase();
        Day::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == lower || d.as_str().starts_with(&lower) && lower.len() >= 3)
    }

    /// Lowercase name as used in wire records
    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }

    /// Capitalized name for reports
    pub fn name(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    /// True when the two days are adjacent in the week
    pub fn is_adjacent(&self, other: Day) -> bool {
        (self.index() as i8 - other.index() as i8).abs() == 1
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Day::parse("Monday"), Some(Day::Monday));
        assert_eq!(Day::parse("SATURDAY"), Some(Day::Saturday));
        assert_eq!(Day::parse("wed"), Some(Day::Wednesday));
        assert_eq!(Day::parse("notaday"), None);
    }

    #[test]
    fn test_adjacency() {
        assert!(Day::Monday.is_adjacent(Day::Tuesday));
        assert!(Day::Thursday.is_adjacent(Day::Wednesday));
        assert!(!Day::Monday.is_adjacent(Day::Wednesday));
        assert!(!Day::Friday.is_adjacent(Day::Friday));
    }
}
