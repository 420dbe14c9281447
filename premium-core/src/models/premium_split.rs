use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{InsuranceBracket, InsuranceCategory};
use crate::calculations::common::round_half_up;

/// Identifying attributes of the bracket a premium was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedBracket {
    pub category: InsuranceCategory,
    pub grade_level: u32,
    pub salary_min: Decimal,
    pub salary_max: Option<Decimal>,
    pub premium_base: Decimal,
}

impl From<&InsuranceBracket> for MatchedBracket {
    fn from(bracket: &InsuranceBracket) -> Self {
        Self {
            category: bracket.category,
            grade_level: bracket.grade_level,
            salary_min: bracket.salary_min,
            salary_max: bracket.salary_max,
            premium_base: bracket.premium_base,
        }
    }
}

/// A premium and its division among the three payers.
///
/// Amounts carry full decimal precision. Use [`PremiumSplit::rounded`] for
/// display values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumSplit {
    pub total: Decimal,
    pub employee: Decimal,
    pub employer: Decimal,
    pub government: Decimal,
    pub matched_bracket: MatchedBracket,
}

impl PremiumSplit {
    /// Computes the split for a single bracket.
    pub fn from_bracket(bracket: &InsuranceBracket) -> Self {
        Self {
            total: bracket.total_premium(),
            employee: bracket.employee_premium(),
            employer: bracket.employer_premium(),
            government: bracket.government_premium(),
            matched_bracket: MatchedBracket::from(bracket),
        }
    }

    /// Sum of the three payer shares.
    pub fn payer_sum(&self) -> Decimal {
        self.employee + self.employer + self.government
    }

    /// Returns a copy with each amount rounded half-up to two decimal places.
    pub fn rounded(&self) -> Self {
        Self {
            total: round_half_up(self.total),
            employee: round_half_up(self.employee),
            employer: round_half_up(self.employer),
            government: round_half_up(self.government),
            matched_bracket: self.matched_bracket.clone(),
        }
    }
}
