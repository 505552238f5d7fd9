//! Simulation-relative dates.
//!
//! Model dates are not calendar dates: year 1 is the first simulation
//! year. The fixed string form is `month/day/year`, e.g. `"11/1/1"`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A simulation-relative date.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimDate {
    /// Simulation year, starting at 1.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
}

impl SimDate {
    /// Creates a date, validating the component ranges.
    ///
    /// # Errors
    /// Returns a validation error if month, day, or year is out of range.
    pub fn new(month: u8, day: u8, year: u16) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::validation(format!("month {month} out of range 1-12")));
        }
        if !(1..=31).contains(&day) {
            return Err(Error::validation(format!("day {day} out of range 1-31")));
        }
        if year == 0 {
            return Err(Error::validation("simulation year must be >= 1"));
        }
        Ok(Self { year, month, day })
    }

    /// Returns the day-of-simulation ordinal used for date arithmetic.
    ///
    /// Months are treated uniformly for ordering purposes.
    #[must_use]
    pub fn ordinal(self) -> u32 {
        (u32::from(self.year) - 1) * 372 + (u32::from(self.month) - 1) * 31
            + u32::from(self.day) - 1
    }
}

impl fmt::Display for SimDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.month, self.day, self.year)
    }
}

impl FromStr for SimDate {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let mut parts = s.split('/');
        let (Some(m), Some(d), Some(y), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::validation(format!(
                "date '{s}' is not in month/day/year form"
            )));
        };
        let month: u8 = m
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("date '{s}' has a bad month")))?;
        let day: u8 = d
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("date '{s}' has a bad day")))?;
        let year: u16 = y
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("date '{s}' has a bad year")))?;
        Self::new(month, day, year)
    }
}
