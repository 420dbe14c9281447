//! Resolution of the applicable bracket and its premium split.
//!
//! # Resolution
//!
//! For a `(category, salary, as_of)` query the resolver takes the brackets
//! that are of that category, active on `as_of`, and cover `salary`. An
//! empty intersection is "no match" and is returned as `None`: a salary
//! below the lowest tier, above every bounded tier with no open-ended tier,
//! an unknown category, or a salary that is not a non-negative number.
//!
//! # Overlapping brackets
//!
//! The store does not prevent overlapping records (the 2025 health table
//! itself shares the 313000 boundary between grades 66 and 67). When more
//! than one record matches, the resolver picks the one with the lowest
//! `grade_level`, then the earliest `effective_date`. Remaining full ties
//! keep store order.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use premium_core::{BracketStore, InsuranceBracket, InsuranceCategory, PremiumResolver};
//!
//! let brackets = vec![InsuranceBracket {
//!     category: InsuranceCategory::Labor,
//!     grade_level: 1,
//!     salary_min: dec!(28590),
//!     salary_max: Some(dec!(29999)),
//!     premium_base: dec!(28590),
//!     rate: dec!(0.125),
//!     employee_ratio: dec!(0.2),
//!     employer_ratio: dec!(0.7),
//!     government_ratio: dec!(0.1),
//!     effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//!     expiry_date: None,
//! }];
//!
//! let resolver = PremiumResolver::new(BracketStore::new(&brackets));
//! let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
//!
//! let split = resolver.compute_premium("labor", "28590", as_of).unwrap();
//!
//! assert_eq!(split.total, dec!(3573.75));
//! assert_eq!(split.employee, dec!(714.75));
//! assert_eq!(split.employer, dec!(2501.625));
//! assert_eq!(split.government, dec!(357.375));
//!
//! assert!(resolver.compute_premium("labor", 20000, as_of).is_none());
//! ```

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use super::{BracketStore, SalaryInput};
use crate::models::{InsuranceBracket, InsuranceCategory, PremiumSplit};

/// Stateless bracket resolver over a borrowed [`BracketStore`].
#[derive(Debug, Clone, Copy)]
pub struct PremiumResolver<'a> {
    store: BracketStore<'a>,
}

impl<'a> PremiumResolver<'a> {
    pub fn new(store: BracketStore<'a>) -> Self {
        Self { store }
    }

    /// Finds the single bracket that applies to `salary` in `category` on
    /// `as_of`.
    ///
    /// Returns `None` for an unknown category, a salary that does not coerce
    /// to a non-negative number, or when no active bracket covers the salary.
    pub fn find_bracket(
        &self,
        category: &str,
        salary: impl SalaryInput,
        as_of: NaiveDate,
    ) -> Option<&'a InsuranceBracket> {
        let Some(category) = InsuranceCategory::parse(category) else {
            debug!(category, "unrecognized insurance category");
            return None;
        };
        let Some(salary) = salary.to_salary() else {
            debug!(%category, "salary is not a non-negative number");
            return None;
        };

        let candidates = self.store.candidates(category, salary, as_of);
        if candidates.len() > 1 {
            warn!(
                %category,
                %salary,
                %as_of,
                candidates = candidates.len(),
                "overlapping brackets match; preferring lowest grade, then earliest effective date"
            );
        }

        let matched = candidates.into_iter().min_by(|a, b| {
            a.grade_level
                .cmp(&b.grade_level)
                .then(a.effective_date.cmp(&b.effective_date))
        });

        match matched {
            Some(bracket) => debug!(
                %category,
                %salary,
                %as_of,
                grade_level = bracket.grade_level,
                "bracket resolved"
            ),
            None => debug!(%category, %salary, %as_of, "no bracket covers salary"),
        }

        matched
    }

    /// Computes the premium split for the bracket [`find_bracket`] resolves.
    ///
    /// [`find_bracket`]: Self::find_bracket
    pub fn compute_premium(
        &self,
        category: &str,
        salary: impl SalaryInput,
        as_of: NaiveDate,
    ) -> Option<PremiumSplit> {
        self.find_bracket(category, salary, as_of)
            .map(PremiumSplit::from_bracket)
    }

    /// [`find_bracket`](Self::find_bracket) evaluated on the local calendar date.
    pub fn find_current_bracket(
        &self,
        category: &str,
        salary: impl SalaryInput,
    ) -> Option<&'a InsuranceBracket> {
        self.find_bracket(category, salary, today())
    }

    /// [`compute_premium`](Self::compute_premium) evaluated on the local calendar date.
    pub fn compute_current_premium(
        &self,
        category: &str,
        salary: impl SalaryInput,
    ) -> Option<PremiumSplit> {
        self.compute_premium(category, salary, today())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
