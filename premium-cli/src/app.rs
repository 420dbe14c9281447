//! Command implementations behind the `premium` binary.
//!
//! Each command produces a report value whose `Display` impl is what the
//! binary prints, so the formatting is testable without a process.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use premium_core::db::{BracketRepository, RepositoryError, RepositoryRegistry};
use premium_core::{
    BracketStore, InsuranceBracket, InsuranceCategory, PremiumResolver, PremiumSplit, TaxId,
    TaxIdError,
};
use premium_db_sqlite::SqliteRepositoryFactory;

/// Registry with every backend compiled into this binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Fetch the brackets a command needs. Unknown category names load nothing.
pub async fn load_brackets(
    repo: &dyn BracketRepository,
    category: &str,
) -> Result<Vec<InsuranceBracket>, RepositoryError> {
    let Some(category) = InsuranceCategory::parse(category) else {
        debug!(category, "unknown category; skipping load");
        return Ok(Vec::new());
    };
    let brackets = repo.list_brackets_by_category(category).await?;
    debug!(%category, count = brackets.len(), "brackets loaded");
    Ok(brackets)
}

fn fmt_amount(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn fmt_range(
    min: Decimal,
    max: Option<Decimal>,
) -> String {
    match max {
        Some(max) => format!("{} - {}", min, max),
        None => format!("{} and above", min),
    }
}

// ─── quote ───────────────────────────────────────────────────────────────────

/// Outcome of `premium quote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteReport {
    pub category: String,
    pub salary: String,
    pub as_of: NaiveDate,
    /// Rounded to 2 dp; `None` when no bracket applies.
    pub split: Option<PremiumSplit>,
}

pub fn quote(
    brackets: &[InsuranceBracket],
    category: &str,
    salary: &str,
    as_of: NaiveDate,
) -> QuoteReport {
    let resolver = PremiumResolver::new(BracketStore::new(brackets));
    QuoteReport {
        category: category.to_string(),
        salary: salary.to_string(),
        as_of,
        split: resolver
            .compute_premium(category, salary, as_of)
            .map(|split| split.rounded()),
    }
}

impl fmt::Display for QuoteReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let Some(split) = &self.split else {
            return write!(
                f,
                "no matching bracket for {} salary {} on {}",
                self.category, self.salary, self.as_of
            );
        };
        let matched = &split.matched_bracket;

        writeln!(f, "Category:     {}", matched.category)?;
        writeln!(f, "As of:        {}", self.as_of)?;
        writeln!(f, "Grade:        {}", matched.grade_level)?;
        writeln!(
            f,
            "Salary range: {}",
            fmt_range(matched.salary_min, matched.salary_max)
        )?;
        writeln!(f, "Premium base: {}", matched.premium_base)?;
        writeln!(f, "Total:        {:>12}", fmt_amount(split.total))?;
        writeln!(f, "Employee:     {:>12}", fmt_amount(split.employee))?;
        writeln!(f, "Employer:     {:>12}", fmt_amount(split.employer))?;
        write!(f, "Government:   {:>12}", fmt_amount(split.government))
    }
}

// ─── brackets ────────────────────────────────────────────────────────────────

/// Outcome of `premium brackets`: the active brackets of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTable {
    pub category: String,
    pub as_of: NaiveDate,
    pub brackets: Vec<InsuranceBracket>,
}

pub fn bracket_table(
    brackets: &[InsuranceBracket],
    category: &str,
    as_of: NaiveDate,
) -> BracketTable {
    let store = BracketStore::new(brackets);
    let mut active: Vec<InsuranceBracket> = store
        .brackets_for(category)
        .into_iter()
        .filter(|b| b.is_active(as_of))
        .cloned()
        .collect();
    active.sort_by(|a, b| {
        a.grade_level
            .cmp(&b.grade_level)
            .then(a.effective_date.cmp(&b.effective_date))
    });

    BracketTable {
        category: category.to_string(),
        as_of,
        brackets: active,
    }
}

impl fmt::Display for BracketTable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.brackets.is_empty() {
            return write!(f, "no active {} brackets on {}", self.category, self.as_of);
        }

        writeln!(
            f,
            "{} brackets active on {} ({})",
            self.category,
            self.as_of,
            self.brackets.len()
        )?;
        write!(
            f,
            "{:>5}  {:<24} {:>10} {:>8} {:>10} {:>10} {:>10}",
            "grade", "salary range", "base", "rate", "employee", "employer", "government"
        )?;
        for b in &self.brackets {
            let split = PremiumSplit::from_bracket(b).rounded();
            write!(
                f,
                "\n{:>5}  {:<24} {:>10} {:>8} {:>10} {:>10} {:>10}",
                b.grade_level,
                fmt_range(b.salary_min, b.salary_max),
                b.premium_base,
                b.rate,
                fmt_amount(split.employee),
                fmt_amount(split.employer),
                fmt_amount(split.government),
            )?;
        }
        Ok(())
    }
}

// ─── check-tax-id ────────────────────────────────────────────────────────────

/// Outcome of `premium check-tax-id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxIdReport {
    pub input: String,
    pub result: Result<TaxId, TaxIdError>,
}

pub fn check_tax_id(input: &str) -> TaxIdReport {
    TaxIdReport {
        input: input.to_string(),
        result: TaxId::parse(input),
    }
}

impl TaxIdReport {
    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for TaxIdReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.result {
            Ok(id) => write!(f, "{}: valid", id),
            Err(e) => write!(f, "{:?}: invalid ({})", self.input, e),
        }
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

    fn labor(
        grade_level: u32,
        salary_min: Decimal,
        salary_max: Option<Decimal>,
    ) -> InsuranceBracket {
        InsuranceBracket {
            category: InsuranceCategory::Labor,
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

    fn sample() -> Vec<InsuranceBracket> {
        vec![
            labor(2, dec!(30000), Some(dec!(31199))),
            labor(1, dec!(28590), Some(dec!(29999))),
            labor(15, dec!(45800), None),
        ]
    }

    // ── quote ────────────────────────────────────────────────────────────
    #[test]
    fn quote_rounds_split_for_display() {
        let brackets = sample();

        let report = quote(&brackets, "labor", "28590", date(2025, 6, 1));

        let split = report.split.clone().expect("grade 1 should match");
        assert_eq!(split.employer, dec!(2501.63));
        assert_eq!(split.government, dec!(357.38));
        assert_eq!(
            report.to_string(),
            "Category:     labor\n\
             As of:        2025-06-01\n\
             Grade:        1\n\
             Salary range: 28590 - 29999\n\
             Premium base: 28590\n\
             Total:             3573.75\n\
             Employee:           714.75\n\
             Employer:          2501.63\n\
             Government:         357.38"
        );
    }

    #[test]
    fn quote_open_ended_tier_shows_and_above() {
        let brackets = sample();

        let report = quote(&brackets, "labor", "90000", date(2025, 6, 1));

        assert!(report.to_string().contains("Salary range: 45800 and above"));
    }

    #[test]
    fn quote_without_match_says_so() {
        let brackets = sample();

        for (category, salary) in [("labor", "20000"), ("dental", "30000"), ("labor", "abc")] {
            let report = quote(&brackets, category, salary, date(2025, 6, 1));
            assert_eq!(report.split, None);
            assert!(report.to_string().starts_with("no matching bracket"));
        }
    }

    // ── brackets ─────────────────────────────────────────────────────────
    #[test]
    fn bracket_table_orders_by_grade() {
        let brackets = sample();

        let table = bracket_table(&brackets, "labor", date(2025, 6, 1));

        let grades: Vec<u32> = table.brackets.iter().map(|b| b.grade_level).collect();
        assert_eq!(grades, vec![1, 2, 15]);
        let rendered = table.to_string();
        assert!(rendered.starts_with("labor brackets active on 2025-06-01 (3)"));
        assert_eq!(rendered.lines().count(), 5);
    }

    #[test]
    fn bracket_table_before_effective_date_is_empty() {
        let brackets = sample();

        let table = bracket_table(&brackets, "labor", date(2024, 12, 31));

        assert!(table.brackets.is_empty());
        assert_eq!(table.to_string(), "no active labor brackets on 2024-12-31");
    }

    // ── check-tax-id ─────────────────────────────────────────────────────
    #[test]
    fn tax_id_report_valid() {
        let report = check_tax_id("04595257");

        assert!(report.is_valid());
        assert_eq!(report.to_string(), "04595257: valid");
    }

    #[test]
    fn tax_id_report_names_failed_rule() {
        assert_eq!(
            check_tax_id("1234567").to_string(),
            "\"1234567\": invalid (tax id must be exactly 8 ASCII digits)"
        );
        assert_eq!(
            check_tax_id("88117126").to_string(),
            "\"88117126\": invalid (tax id check digit does not match)"
        );
    }

    // ── registry ─────────────────────────────────────────────────────────
    #[test]
    fn registry_offers_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }
}
