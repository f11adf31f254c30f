pub mod assignment;
mod error;
pub mod ids;
pub mod io;
pub mod optimize;
pub mod overbooking;
pub mod state;
pub mod statistics;
pub mod timespan;

pub use assignment::{Assignment, Violation};
pub use error::Error;
pub use ids::IdAllocator;
pub use timespan::Timespan;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Id of a student or an activity. Both kinds of ids are allocated independently.
pub type Id = u64;

/// Number of grades (school years) the activities are offered to
pub const NUM_GRADES: usize = 4;

/// Rank value representing a guaranteed assignment in serialized data
pub const GUARANTEED_RANK: i64 = -1;

/// A school grade between 1 and 4
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub struct Grade(u8);

impl Grade {
    pub fn new(grade: i64) -> Result<Self, Error> {
        if (1..=NUM_GRADES as i64).contains(&grade) {
            Ok(Self(grade as u8))
        } else {
            Err(Error::InvalidGrade(grade))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Index of this grade in per-grade arrays
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<i64> for Grade {
    type Error = Error;

    fn try_from(grade: i64) -> Result<Self, Self::Error> {
        Grade::new(grade)
    }
}

impl From<Grade> for i64 {
    fn from(grade: Grade) -> Self {
        grade.0 as i64
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student's wish to attend an activity
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub enum Preference {
    /// Ordinary choice. Lower ranks are stronger preferences.
    Ranked(u32),
    /// The student must be placed in this activity whenever at all possible
    Guaranteed,
}

impl TryFrom<i64> for Preference {
    type Error = Error;

    fn try_from(rank: i64) -> Result<Self, Self::Error> {
        if rank == GUARANTEED_RANK {
            Ok(Preference::Guaranteed)
        } else {
            u32::try_from(rank)
                .map(Preference::Ranked)
                .map_err(|_| Error::InvalidRank(rank))
        }
    }
}

impl From<Preference> for i64 {
    fn from(preference: Preference) -> Self {
        match preference {
            Preference::Ranked(rank) => rank as i64,
            Preference::Guaranteed => GUARANTEED_RANK,
        }
    }
}

/// Representation of a student's data
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Student {
    pub id: Id,
    pub name: String,
    pub grade: Grade,
    /// Class label within the grade (e.g. "a"). Not relevant for the assignment.
    pub subgrade: String,
    /// Chosen activities. Activities missing from this map must not be assigned to the student.
    #[serde(default)]
    pub preferences: BTreeMap<Id, Preference>,
}

impl Student {
    /// Create a student without preferences, taking the next id from `ids`
    pub fn new(
        ids: &IdAllocator,
        name: impl Into<String>,
        grade: i64,
        subgrade: impl Into<String>,
    ) -> Result<Self, Error> {
        let grade = Grade::new(grade)?;
        Ok(Self {
            id: ids.next_id(),
            name: name.into(),
            grade,
            subgrade: subgrade.into(),
            preferences: BTreeMap::new(),
        })
    }

    pub fn with_preferences<I: IntoIterator<Item = (Id, Preference)>>(
        mut self,
        preferences: I,
    ) -> Self {
        self.preferences = preferences.into_iter().collect();
        self
    }

    pub fn prefers(&self, activity_id: Id) -> bool {
        self.preferences.contains_key(&activity_id)
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}{})", self.name, self.grade, self.subgrade)
    }
}

/// Representation of an activity's data
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "ActivityData")]
pub struct Activity {
    pub id: Id,
    pub name: String,
    /// Minimum number of attendees
    pub min_capacity: u32,
    /// Maximum number of attendees, `None` if unbounded
    pub max_capacity: Option<u32>,
    pub timespan: Timespan,
    /// Whether students of grade `i + 1` may attend
    pub valid_grades: [bool; NUM_GRADES],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ActivityData {
    id: Id,
    name: String,
    #[serde(default)]
    min_capacity: u32,
    #[serde(default)]
    max_capacity: Option<u32>,
    #[serde(default)]
    timespan: Timespan,
    #[serde(default = "all_grades")]
    valid_grades: [bool; NUM_GRADES],
}

fn all_grades() -> [bool; NUM_GRADES] {
    [true; NUM_GRADES]
}

impl TryFrom<ActivityData> for Activity {
    type Error = Error;

    fn try_from(data: ActivityData) -> Result<Self, Self::Error> {
        Activity {
            id: data.id,
            name: data.name,
            min_capacity: 0,
            max_capacity: None,
            timespan: data.timespan,
            valid_grades: data.valid_grades,
        }
        .with_capacity(data.min_capacity, data.max_capacity)
    }
}

impl Activity {
    /// Create an unrestricted activity (no capacity bounds, all grades, empty timespan at the
    /// start of the week), taking the next id from `ids`
    pub fn new(ids: &IdAllocator, name: impl Into<String>) -> Self {
        Self {
            id: ids.next_id(),
            name: name.into(),
            min_capacity: 0,
            max_capacity: None,
            timespan: Timespan::default(),
            valid_grades: all_grades(),
        }
    }

    pub fn with_capacity(mut self, min: u32, max: Option<u32>) -> Result<Self, Error> {
        self.set_capacity(min, max)?;
        Ok(self)
    }

    pub fn with_timespan(mut self, timespan: Timespan) -> Self {
        self.timespan = timespan;
        self
    }

    pub fn with_valid_grades(mut self, valid_grades: [bool; NUM_GRADES]) -> Self {
        self.valid_grades = valid_grades;
        self
    }

    pub fn set_capacity(&mut self, min: u32, max: Option<u32>) -> Result<(), Error> {
        if let Some(max) = max {
            if max < min {
                return Err(Error::InvalidCapacity { min, max });
            }
        }
        self.min_capacity = min;
        self.max_capacity = max;
        Ok(())
    }

    pub fn set_grade_validity(&mut self, grade: i64, valid: bool) -> Result<(), Error> {
        let grade = Grade::new(grade)?;
        self.valid_grades[grade.index()] = valid;
        Ok(())
    }

    pub fn is_valid_grade(&self, grade: i64) -> Result<bool, Error> {
        Ok(self.admits(Grade::new(grade)?))
    }

    /// Check if students of the given grade may attend this activity
    pub fn admits(&self, grade: Grade) -> bool {
        self.valid_grades[grade.index()]
    }

    pub fn is_overbooked(&self, participants: usize) -> bool {
        self.max_capacity
            .map_or(false, |max| participants > max as usize)
    }

    pub fn is_underbooked(&self, participants: usize) -> bool {
        participants < self.min_capacity as usize
    }

    /// Check if both activities take place at the same time. Comparing an activity with
    /// itself is the caller's responsibility.
    pub fn overlaps(&self, other: &Activity) -> bool {
        self.timespan.overlaps(&other.timespan)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.timespan)
    }
}

pub fn student_map(students: &[Student]) -> HashMap<Id, &Student> {
    students.iter().map(|s| (s.id, s)).collect()
}

pub fn activity_map(activities: &[Activity]) -> HashMap<Id, &Activity> {
    activities.iter().map(|a| (a.id, a)).collect()
}
