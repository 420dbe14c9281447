use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::InsuranceCategory;

/// Allowed distance between the sum of the three payer ratios and 1.
pub const RATIO_SUM_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Invariant violations on a single bracket record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketValidationError {
    #[error("grade level must be positive, got {0}")]
    InvalidGradeLevel(u32),

    #[error("salary minimum must be non-negative, got {0}")]
    NegativeSalaryMin(Decimal),

    #[error("salary maximum {max} is below salary minimum {min}")]
    SalaryMaxBelowMin { min: Decimal, max: Decimal },

    #[error("premium base must be positive, got {0}")]
    InvalidPremiumBase(Decimal),

    #[error("rate must be in (0, 1], got {0}")]
    InvalidRate(Decimal),

    #[error("{payer} ratio must be between 0 and 1, got {ratio}")]
    InvalidRatio { payer: &'static str, ratio: Decimal },

    #[error("payer ratios must sum to 1, got {0}")]
    RatioSumMismatch(Decimal),

    #[error("expiry date {expiry} must be after effective date {effective}")]
    ExpiryNotAfterEffective {
        effective: NaiveDate,
        expiry: NaiveDate,
    },
}

/// One contribution tier of one insurance category during one validity window.
///
/// Records are immutable once stored. A rate-table change is modelled as a
/// new record with its own window, never as an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceBracket {
    pub category: InsuranceCategory,

    /// Ordering hint within a category; also the first tie-break key.
    pub grade_level: u32,

    /// Inclusive lower salary bound.
    pub salary_min: Decimal,

    /// Inclusive upper salary bound. `None` marks the open-ended top tier.
    pub salary_max: Option<Decimal>,

    /// Assessed wage base the premium is computed from.
    pub premium_base: Decimal,

    /// Total contribution rate in (0, 1].
    pub rate: Decimal,

    pub employee_ratio: Decimal,
    pub employer_ratio: Decimal,
    pub government_ratio: Decimal,

    /// First day the bracket applies (inclusive).
    pub effective_date: NaiveDate,

    /// First day the bracket no longer applies (exclusive).
    pub expiry_date: Option<NaiveDate>,
}

impl InsuranceBracket {
    /// True when `as_of` falls inside `[effective_date, expiry_date)`.
    pub fn is_active(
        &self,
        as_of: NaiveDate,
    ) -> bool {
        self.effective_date <= as_of && self.expiry_date.is_none_or(|expiry| expiry > as_of)
    }

    /// True when `salary` lies within the inclusive salary bounds.
    pub fn covers_salary(
        &self,
        salary: Decimal,
    ) -> bool {
        self.salary_min <= salary && self.salary_max.is_none_or(|max| max >= salary)
    }

    pub fn total_premium(&self) -> Decimal {
        self.premium_base * self.rate
    }

    pub fn employee_premium(&self) -> Decimal {
        self.total_premium() * self.employee_ratio
    }

    pub fn employer_premium(&self) -> Decimal {
        self.total_premium() * self.employer_ratio
    }

    pub fn government_premium(&self) -> Decimal {
        self.total_premium() * self.government_ratio
    }

    /// Checks every record invariant, reporting the first violation found.
    ///
    /// # Errors
    ///
    /// Returns [`BracketValidationError`] if:
    /// - `grade_level` is zero
    /// - `salary_min` is negative or `salary_max` is below it
    /// - `premium_base` is not positive
    /// - `rate` is not in (0, 1]
    /// - a payer ratio is outside [0, 1] or the three do not sum to 1
    ///   within [`RATIO_SUM_TOLERANCE`]
    /// - `expiry_date` is not strictly after `effective_date`
    pub fn validate(&self) -> Result<(), BracketValidationError> {
        if self.grade_level == 0 {
            return Err(BracketValidationError::InvalidGradeLevel(self.grade_level));
        }

        if self.salary_min < Decimal::ZERO {
            return Err(BracketValidationError::NegativeSalaryMin(self.salary_min));
        }

        if let Some(max) = self.salary_max {
            if max < self.salary_min {
                return Err(BracketValidationError::SalaryMaxBelowMin {
                    min: self.salary_min,
                    max,
                });
            }
        }

        if self.premium_base <= Decimal::ZERO {
            return Err(BracketValidationError::InvalidPremiumBase(self.premium_base));
        }

        if self.rate <= Decimal::ZERO || self.rate > Decimal::ONE {
            return Err(BracketValidationError::InvalidRate(self.rate));
        }

        for (payer, ratio) in [
            ("employee", self.employee_ratio),
            ("employer", self.employer_ratio),
            ("government", self.government_ratio),
        ] {
            if ratio < Decimal::ZERO || ratio > Decimal::ONE {
                return Err(BracketValidationError::InvalidRatio { payer, ratio });
            }
        }

        let ratio_sum = self.employee_ratio + self.employer_ratio + self.government_ratio;
        if (ratio_sum - Decimal::ONE).abs() >= RATIO_SUM_TOLERANCE {
            return Err(BracketValidationError::RatioSumMismatch(ratio_sum));
        }

        if let Some(expiry) = self.expiry_date {
            if expiry <= self.effective_date {
                return Err(BracketValidationError::ExpiryNotAfterEffective {
                    effective: self.effective_date,
                    expiry,
                });
            }
        }

        Ok(())
    }
}
