//! Challenge rating tokens and the CR→XP table
//!
//! A challenge rating is written either as a whole number ("3") or as one of
//! the three standard fractions ("1/8", "1/4", "1/2"). Fractions sort below
//! CR 1 in the standard ordering. The XP value of a creature comes from a
//! fixed table; the engine always recomputes encounter totals from this
//! table rather than trusting totals asserted by the external generator.

use serde::{Deserialize, Serialize};

/// XP values for fractional ratings, lowest first: CR 0, 1/8, 1/4, 1/2.
const FRACTIONAL_XP: [u32; 4] = [10, 25, 50, 100];

/// XP values for whole ratings. Index is CR - 1 (so CR 1 = index 0).
const WHOLE_XP: [u32; 30] = [
    200,    // CR 1
    450,    // CR 2
    700,    // CR 3
    1_100,  // CR 4
    1_800,  // CR 5
    2_300,  // CR 6
    2_900,  // CR 7
    3_900,  // CR 8
    5_000,  // CR 9
    5_900,  // CR 10
    7_200,  // CR 11
    8_400,  // CR 12
    10_000, // CR 13
    11_500, // CR 14
    13_000, // CR 15
    15_000, // CR 16
    18_000, // CR 17
    20_000, // CR 18
    22_000, // CR 19
    25_000, // CR 20
    33_000, // CR 21
    41_000, // CR 22
    50_000, // CR 23
    62_000, // CR 24
    75_000, // CR 25
    90_000, // CR 26
    105_000, // CR 27
    120_000, // CR 28
    135_000, // CR 29
    155_000, // CR 30
];

/// A creature's challenge rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeRating {
    Zero,
    Eighth,
    Quarter,
    Half,
    /// Whole-numbered rating, 1..=30
    Whole(u8),
}

impl ChallengeRating {
    /// Parse a CR token as it appears in catalog data ("0", "1/4", "12")
    pub fn parse(token: &str) -> Result<Self, CrParseError> {
        match token.trim() {
            "0" => Ok(Self::Zero),
            "1/8" => Ok(Self::Eighth),
            "1/4" => Ok(Self::Quarter),
            "1/2" => Ok(Self::Half),
            whole => {
                let value: u8 = whole
                    .parse()
                    .map_err(|_| CrParseError::Malformed(token.to_string()))?;
                if value == 0 || value > 30 {
                    return Err(CrParseError::OutOfRange(value));
                }
                Ok(Self::Whole(value))
            }
        }
    }

    /// XP awarded for a creature of this rating
    pub fn xp(&self) -> u32 {
        match self {
            Self::Zero => FRACTIONAL_XP[0],
            Self::Eighth => FRACTIONAL_XP[1],
            Self::Quarter => FRACTIONAL_XP[2],
            Self::Half => FRACTIONAL_XP[3],
            // parse() keeps Whole in 1..=30, but a hand-built value might
            // not be; clamp to the table bounds instead of indexing out
            Self::Whole(n) => WHOLE_XP[(*n).clamp(1, 30) as usize - 1],
        }
    }

    /// Position in the standard ordering (CR 0 = 0, 1/8 = 1, ..., CR 1 = 4)
    pub fn rank(&self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::Eighth => 1,
            Self::Quarter => 2,
            Self::Half => 3,
            Self::Whole(n) => (*n).clamp(1, 30) + 3,
        }
    }

    /// Whole-number value this rating is effectively at for comparisons
    /// against party level (fractions count as level 0).
    pub fn effective_level(&self) -> u8 {
        match self {
            Self::Whole(n) => *n,
            _ => 0,
        }
    }

    pub fn is_fractional(&self) -> bool {
        !matches!(self, Self::Whole(_))
    }

    /// Canonical token form ("1/4", "3")
    pub fn token(&self) -> String {
        match self {
            Self::Zero => "0".to_string(),
            Self::Eighth => "1/8".to_string(),
            Self::Quarter => "1/4".to_string(),
            Self::Half => "1/2".to_string(),
            Self::Whole(n) => n.to_string(),
        }
    }
}

impl PartialOrd for ChallengeRating {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChallengeRating {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl std::fmt::Display for ChallengeRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl Serialize for ChallengeRating {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token())
    }
}

impl<'de> Deserialize<'de> for ChallengeRating {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::parse(&token).map_err(serde::de::Error::custom)
    }
}

/// Errors produced when parsing a CR token
#[derive(Debug, thiserror::Error)]
pub enum CrParseError {
    #[error("malformed challenge rating token: {0:?}")]
    Malformed(String),
    #[error("challenge rating out of range: {0}")]
    OutOfRange(u8),
}
