//! Read-only queries over a borrowed set of insurance brackets.
//!
//! The store never owns bracket storage. The persistence layer loads records
//! and lends them out as a slice; every query here is a pure filter over that
//! slice and preserves its order.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use premium_core::{BracketStore, InsuranceBracket, InsuranceCategory};
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
//! let store = BracketStore::new(&brackets);
//!
//! assert_eq!(store.brackets_for("labor").len(), 1);
//! assert!(store.brackets_for("pension").is_empty());
//! assert_eq!(store.brackets_covering_salary(dec!(29999)).len(), 1);
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{InsuranceBracket, InsuranceCategory};

#[derive(Debug, Clone, Copy)]
pub struct BracketStore<'a> {
    brackets: &'a [InsuranceBracket],
}

impl<'a> BracketStore<'a> {
    pub fn new(brackets: &'a [InsuranceBracket]) -> Self {
        Self { brackets }
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, InsuranceBracket> {
        self.brackets.iter()
    }

    /// Brackets whose validity window contains `as_of`.
    pub fn active_brackets(
        &self,
        as_of: NaiveDate,
    ) -> Vec<&'a InsuranceBracket> {
        self.iter().filter(|b| b.is_active(as_of)).collect()
    }

    /// Brackets of the named category.
    ///
    /// Names outside the four known categories select nothing rather than
    /// failing.
    pub fn brackets_for(
        &self,
        category: &str,
    ) -> Vec<&'a InsuranceBracket> {
        match InsuranceCategory::parse(category) {
            Some(category) => self.brackets_in(category),
            None => Vec::new(),
        }
    }

    /// Brackets of an already-parsed category.
    pub fn brackets_in(
        &self,
        category: InsuranceCategory,
    ) -> Vec<&'a InsuranceBracket> {
        self.iter().filter(|b| b.category == category).collect()
    }

    /// Brackets whose inclusive salary range contains `salary`.
    pub fn brackets_covering_salary(
        &self,
        salary: Decimal,
    ) -> Vec<&'a InsuranceBracket> {
        self.iter().filter(|b| b.covers_salary(salary)).collect()
    }

    /// Intersection of the three queries above, in store order.
    pub fn candidates(
        &self,
        category: InsuranceCategory,
        salary: Decimal,
        as_of: NaiveDate,
    ) -> Vec<&'a InsuranceBracket> {
        self.iter()
            .filter(|b| b.category == category)
            .filter(|b| b.is_active(as_of))
            .filter(|b| b.covers_salary(salary))
            .collect()
    }

    /// Number of stored brackets per category. Categories with no brackets
    /// are omitted.
    pub fn count_by_category(&self) -> BTreeMap<InsuranceCategory, usize> {
        let mut counts = BTreeMap::new();
        for bracket in self.brackets {
            *counts.entry(bracket.category).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bracket(
        category: InsuranceCategory,
        grade_level: u32,
        salary_min: Decimal,
        salary_max: Option<Decimal>,
    ) -> InsuranceBracket {
        InsuranceBracket {
            category,
            grade_level,
            salary_min,
            salary_max,
            premium_base: salary_min,
            rate: dec!(0.125),
            employee_ratio: dec!(0.2),
            employer_ratio: dec!(0.7),
            government_ratio: dec!(0.1),
            effective_date: date(2025, 1, 1),
            expiry_date: None,
        }
    }

    fn sample_brackets() -> Vec<InsuranceBracket> {
        vec![
            bracket(InsuranceCategory::Labor, 1, dec!(28590), Some(dec!(29999))),
            bracket(InsuranceCategory::Labor, 2, dec!(30000), Some(dec!(31199))),
            bracket(InsuranceCategory::Labor, 15, dec!(45800), None),
            bracket(InsuranceCategory::Health, 1, dec!(28590), Some(dec!(29999))),
            InsuranceBracket {
                effective_date: date(2024, 1, 1),
                expiry_date: Some(date(2025, 1, 1)),
                rate: dec!(0.115),
                ..bracket(InsuranceCategory::Labor, 1, dec!(28590), Some(dec!(29999)))
            },
        ]
    }

    fn grades(brackets: &[&InsuranceBracket]) -> Vec<(InsuranceCategory, u32)> {
        brackets.iter().map(|b| (b.category, b.grade_level)).collect()
    }

    // =========================================================================
    // active_brackets tests
    // =========================================================================

    #[test]
    fn active_brackets_excludes_expired_records() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let active = store.active_brackets(date(2025, 1, 1));

        assert_eq!(active.len(), 4);
        assert!(active.iter().all(|b| b.expiry_date.is_none()));
    }

    #[test]
    fn active_brackets_returns_superseded_record_inside_its_window() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let active = store.active_brackets(date(2024, 12, 31));

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].rate, dec!(0.115));
    }

    #[test]
    fn active_brackets_can_be_empty() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        assert!(store.active_brackets(date(2023, 6, 1)).is_empty());
    }

    // =========================================================================
    // brackets_for tests
    // =========================================================================

    #[test]
    fn brackets_for_matches_exact_category() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let health = store.brackets_for("health");

        assert_eq!(grades(&health), vec![(InsuranceCategory::Health, 1)]);
    }

    #[test]
    fn brackets_for_unknown_category_is_empty() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        assert!(store.brackets_for("dental").is_empty());
        assert!(store.brackets_for("Labor").is_empty());
        assert!(store.brackets_for("").is_empty());
    }

    #[test]
    fn brackets_for_known_category_without_records_is_empty() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        assert!(store.brackets_for("labor_pension").is_empty());
    }

    // =========================================================================
    // brackets_covering_salary tests
    // =========================================================================

    #[test]
    fn covering_salary_includes_lower_bound() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let covering = store.brackets_covering_salary(dec!(30000));

        assert_eq!(grades(&covering), vec![(InsuranceCategory::Labor, 2)]);
    }

    #[test]
    fn covering_salary_includes_upper_bound() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let covering = store.brackets_covering_salary(dec!(31199));

        assert_eq!(grades(&covering), vec![(InsuranceCategory::Labor, 2)]);
    }

    #[test]
    fn covering_salary_between_bounded_brackets_is_empty() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        assert!(store.brackets_covering_salary(dec!(31199.5)).is_empty());
    }

    #[test]
    fn covering_salary_matches_open_ended_top_tier() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let covering = store.brackets_covering_salary(dec!(99999999));

        assert_eq!(grades(&covering), vec![(InsuranceCategory::Labor, 15)]);
    }

    // =========================================================================
    // candidates / count tests
    // =========================================================================

    #[test]
    fn candidates_intersects_category_date_and_salary() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let found = store.candidates(InsuranceCategory::Labor, dec!(28590), date(2025, 3, 1));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rate, dec!(0.125));
    }

    #[test]
    fn count_by_category_counts_every_record() {
        let brackets = sample_brackets();
        let store = BracketStore::new(&brackets);

        let counts = store.count_by_category();

        assert_eq!(counts.get(&InsuranceCategory::Labor), Some(&4));
        assert_eq!(counts.get(&InsuranceCategory::Health), Some(&1));
        assert_eq!(counts.get(&InsuranceCategory::LaborPension), None);
    }

    #[test]
    fn empty_store_answers_every_query_with_nothing() {
        let store = BracketStore::new(&[]);

        assert!(store.is_empty());
        assert!(store.active_brackets(date(2025, 1, 1)).is_empty());
        assert!(store.brackets_for("labor").is_empty());
        assert!(store.brackets_covering_salary(dec!(30000)).is_empty());
        assert!(store.count_by_category().is_empty());
    }
}
