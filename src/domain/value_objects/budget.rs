//! XP budgets and target windows
//!
//! The budget for an encounter is a pure function of party level, party
//! size, and difficulty tier: a per-character table value multiplied by the
//! number of characters. Callers are responsible for clamping level and size
//! into range before asking for a budget.

use serde::{Deserialize, Serialize};

/// Per-character XP budget by level. Index is level - 1; columns are
/// low / moderate / high.
const BUDGET_PER_CHARACTER: [[u32; 3]; 20] = [
    [50, 75, 100],        // Level 1
    [100, 150, 200],      // Level 2
    [150, 225, 400],      // Level 3
    [250, 375, 500],      // Level 4
    [500, 750, 1_100],    // Level 5
    [600, 1_000, 1_400],  // Level 6
    [750, 1_300, 1_700],  // Level 7
    [1_000, 1_700, 2_100],   // Level 8
    [1_300, 2_000, 2_600],   // Level 9
    [1_600, 2_300, 3_100],   // Level 10
    [1_900, 2_900, 4_100],   // Level 11
    [2_200, 3_700, 4_700],   // Level 12
    [2_600, 4_200, 5_400],   // Level 13
    [2_900, 4_900, 6_200],   // Level 14
    [3_300, 5_400, 7_800],   // Level 15
    [3_800, 6_100, 9_800],   // Level 16
    [4_500, 7_200, 11_700],  // Level 17
    [5_000, 8_700, 14_200],  // Level 18
    [5_500, 10_700, 17_200], // Level 19
    [6_400, 13_200, 22_000], // Level 20
];

/// How punishing an encounter should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Low,
    Moderate,
    High,
}

impl Default for DifficultyTier {
    fn default() -> Self {
        Self::Moderate
    }
}

impl DifficultyTier {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }

    fn column(&self) -> usize {
        match self {
            Self::Low => 0,
            Self::Moderate => 1,
            Self::High => 2,
        }
    }
}

/// The party an encounter is being balanced for
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartyProfile {
    /// Average character level, 1..=20
    pub level: u8,
    /// Number of characters at the table, 1..=8
    pub size: u8,
}

impl PartyProfile {
    pub fn new(level: u8, size: u8) -> Self {
        Self { level, size }
    }

    /// Clamp level and size into the supported ranges
    pub fn clamped(self) -> Self {
        Self {
            level: self.level.clamp(1, 20),
            size: self.size.clamp(1, 8),
        }
    }
}

/// Total XP budget for an encounter. Monotone in level, size, and tier.
///
/// Inputs are expected to be pre-clamped; see [`PartyProfile::clamped`].
pub fn xp_budget(party: PartyProfile, tier: DifficultyTier) -> u32 {
    let per_character = BUDGET_PER_CHARACTER[(party.level - 1) as usize][tier.column()];
    per_character * party.size as u32
}

/// An inclusive XP range a combo's total must land inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpWindow {
    pub min: u32,
    pub max: u32,
}

impl XpWindow {
    /// The standard window around a budget: [95%, 105%]
    pub fn around(budget: u32) -> Self {
        Self {
            min: (budget as u64 * 95 / 100) as u32,
            max: (budget as u64 * 105 / 100) as u32,
        }
    }

    pub fn contains(&self, total: u32) -> bool {
        total >= self.min && total <= self.max
    }
}
