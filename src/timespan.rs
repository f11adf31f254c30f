//! The weekly time grid: a week is split into 672 slots of 15 minutes each, starting on Monday,
//! 00:00. Activities recur every week, there are no calendar dates.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SLOTS_PER_HOUR: u32 = 4;
pub const SLOTS_PER_DAY: u32 = 24 * SLOTS_PER_HOUR;
pub const SLOTS_PER_WEEK: u32 = 7 * SLOTS_PER_DAY;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Half-open interval `[from_slot, to_slot)` of 15 minute slots within the week
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "RawTimespan")]
pub struct Timespan {
    from_slot: u32,
    to_slot: u32,
}

#[derive(Deserialize)]
struct RawTimespan {
    from_slot: u32,
    to_slot: u32,
}

impl TryFrom<RawTimespan> for Timespan {
    type Error = Error;

    fn try_from(raw: RawTimespan) -> Result<Self, Self::Error> {
        Timespan::new(raw.from_slot, raw.to_slot)
    }
}

impl Timespan {
    pub fn new(from_slot: u32, to_slot: u32) -> Result<Self, Error> {
        if from_slot > to_slot || to_slot >= SLOTS_PER_WEEK {
            return Err(Error::InvalidTimespan {
                from: from_slot,
                to: to_slot,
            });
        }
        Ok(Self { from_slot, to_slot })
    }

    /// Create a timespan from weekday (0 = Monday), hour and minute of its start and end.
    ///
    /// Minutes must be a multiple of 15.
    pub fn from_day_hour_minute(from: (u32, u32, u32), to: (u32, u32, u32)) -> Result<Self, Error> {
        let from_slot = slot_from_day_hour_minute(from)?;
        let to_slot = slot_from_day_hour_minute(to)?;
        Self::new(from_slot, to_slot)
    }

    pub fn from_slot(&self) -> u32 {
        self.from_slot
    }

    pub fn to_slot(&self) -> u32 {
        self.to_slot
    }

    pub fn start(&self) -> (u32, u32, u32) {
        day_hour_minute(self.from_slot)
    }

    pub fn end(&self) -> (u32, u32, u32) {
        day_hour_minute(self.to_slot)
    }

    /// Check if two timespans overlap. Touching boundaries do not count. A zero-length timespan
    /// overlaps only timespans that strictly contain its point.
    pub fn overlaps(&self, other: &Timespan) -> bool {
        !(self.to_slot <= other.from_slot || other.to_slot <= self.from_slot)
    }
}

/// Convert (weekday, hour, minute) into a slot index
fn slot_from_day_hour_minute((day, hour, minute): (u32, u32, u32)) -> Result<u32, Error> {
    if day >= 7 || hour >= 24 || minute >= 60 || minute % 15 != 0 {
        return Err(Error::InvalidTime { day, hour, minute });
    }
    Ok(day * SLOTS_PER_DAY + hour * SLOTS_PER_HOUR + minute / 15)
}

/// Convert a slot index into (weekday, hour, minute)
pub fn day_hour_minute(slot: u32) -> (u32, u32, u32) {
    let minute = 15 * (slot % SLOTS_PER_HOUR);
    let hour = (slot / SLOTS_PER_HOUR) % 24;
    let day = slot / SLOTS_PER_DAY;
    (day, hour, minute)
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (from_day, from_hour, from_minute) = self.start();
        let (to_day, to_hour, to_minute) = self.end();
        if from_day == to_day {
            write!(
                f,
                "{}, {:02}:{:02} - {:02}:{:02}",
                WEEKDAYS[from_day as usize], from_hour, from_minute, to_hour, to_minute
            )
        } else {
            write!(
                f,
                "{}, {:02}:{:02} - {}, {:02}:{:02}",
                WEEKDAYS[from_day as usize],
                from_hour,
                from_minute,
                WEEKDAYS[to_day as usize],
                to_hour,
                to_minute
            )
        }
    }
}
