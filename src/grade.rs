use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest grade on the scale, in hundredths.
pub const MIN_HUNDREDTHS: u16 = 100;
/// Highest grade on the scale, in hundredths.
pub const MAX_HUNDREDTHS: u16 = 600;
/// Granularity of the scale, in hundredths.
pub const STEP_HUNDREDTHS: u16 = 25;

/// A grade stored as fixed-point hundredths, so 4.75 is `Grade(475)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Grade(u16);

impl Grade {
    pub const fn from_hundredths(hundredths: u16) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> u16 {
        self.0
    }

    /// Snaps a floating point value to the nearest hundredth.
    ///
    /// Returns `None` for NaN, infinities and values that do not fit the
    /// fixed-point range, which callers treat as "no grade".
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let scaled = (value * 100.0).round();
        if scaled > f64::from(u16::MAX) {
            return None;
        }
        Some(Self(scaled as u16))
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Absolute distance between two grades, in hundredths.
    pub fn distance(self, other: Grade) -> u16 {
        self.0.abs_diff(other.0)
    }

    /// True when the grade is one of the values produced by [`grade_domain`].
    pub fn is_canonical(self) -> bool {
        (MIN_HUNDREDTHS..=MAX_HUNDREDTHS).contains(&self.0) && self.0 % STEP_HUNDREDTHS == 0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let fraction = self.0 % 100;
        if fraction == 0 {
            write!(f, "{whole}")
        } else if fraction % 10 == 0 {
            write!(f, "{whole}.{}", fraction / 10)
        } else {
            write!(f, "{whole}.{fraction:02}")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GradeError {
    NotANumber { value: String },
    OutOfRange { value: f64 },
}

impl fmt::Display for GradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeError::NotANumber { value } => write!(f, "'{}' is not a grade", value),
            GradeError::OutOfRange { value } => {
                write!(f, "{} cannot be represented as a grade", value)
            }
        }
    }
}

impl std::error::Error for GradeError {}

impl TryFrom<f64> for Grade {
    type Error = GradeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Grade::from_f64(value).ok_or(GradeError::OutOfRange { value })
    }
}

impl From<Grade> for f64 {
    fn from(value: Grade) -> Self {
        value.as_f64()
    }
}

impl std::str::FromStr for Grade {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| GradeError::NotANumber {
            value: s.to_string(),
        })?;
        Grade::try_from(value)
    }
}

/// Reads an optional grade cell. NaN, infinite and negative numbers become
/// `None` instead of failing the record.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Grade>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.and_then(Grade::from_f64))
}

/// The 21 valid grades from 1.00 to 6.00 in quarter steps, ascending.
pub fn grade_domain() -> Vec<Grade> {
    (MIN_HUNDREDTHS..=MAX_HUNDREDTHS)
        .step_by(STEP_HUNDREDTHS as usize)
        .map(Grade)
        .collect()
}

/// Renders a grade without trailing zero decimals; a missing grade renders as `-`.
pub fn format_grade(grade: Option<Grade>) -> String {
    match grade {
        Some(grade) => grade.to_string(),
        None => "-".to_string(),
    }
}
