use std::fmt;

use serde::{Deserialize, Serialize};

/// The four statutory insurance programmes a bracket can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceCategory {
    Labor,
    Health,
    LaborPension,
    OccupationalInjury,
}

impl InsuranceCategory {
    pub const ALL: [InsuranceCategory; 4] = [
        Self::Labor,
        Self::Health,
        Self::LaborPension,
        Self::OccupationalInjury,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labor => "labor",
            Self::Health => "health",
            Self::LaborPension => "labor_pension",
            Self::OccupationalInjury => "occupational_injury",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "labor" => Some(Self::Labor),
            "health" => Some(Self::Health),
            "labor_pension" => Some(Self::LaborPension),
            "occupational_injury" => Some(Self::OccupationalInjury),
            _ => None,
        }
    }
}

impl fmt::Display for InsuranceCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
