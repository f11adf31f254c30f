//! Error type for all fail-fast conditions of the crate.
//!
//! Whole-assignment constraint checking does not use this type. See
//! [`Violation`](crate::assignment::Violation) for the aggregated report of
//! [`Assignment::check_validity()`](crate::assignment::Assignment::check_validity).

use crate::Id;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Grade must be between 1 and 4, got {0}.")]
    InvalidGrade(i64),
    #[error("Invalid timespan from slot {from} to slot {to}.")]
    InvalidTimespan { from: u32, to: u32 },
    #[error("Invalid time {hour:02}:{minute:02} on day {day}.")]
    InvalidTime { day: u32, hour: u32, minute: u32 },
    #[error("Invalid preference rank {0}.")]
    InvalidRank(i64),
    #[error("Minimum capacity {min} exceeds maximum capacity {max}.")]
    InvalidCapacity { min: u32, max: u32 },
    #[error("Unknown student id {0}.")]
    UnknownStudent(Id),
    #[error("Unknown activity id {0}.")]
    UnknownActivity(Id),
    #[error("Student id {0} is used more than once.")]
    DuplicateStudent(Id),
    #[error("Activity id {0} is used more than once.")]
    DuplicateActivity(Id),
    #[error("Student {student} is not assigned to activity {activity}.")]
    NotAssigned { student: Id, activity: Id },
    #[error("Inconsistent edge: student {student}, activity {activity}.")]
    InconsistentAssignment { student: Id, activity: Id },
    #[error("Student {0} has no valid preferences.")]
    EmptyPreferences(Id),
    #[error("Activity {activity}: {participants} possible, minimum {min}.")]
    MinimumCapacityNotReached {
        activity: Id,
        participants: usize,
        min: u32,
    },
    #[error("Activity {activity} is overbooked with {participants} students.")]
    MaximumCapacityExceeded { activity: Id, participants: usize },
}
