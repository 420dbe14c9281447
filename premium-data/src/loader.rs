use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use premium_core::{
    BracketRepository, BracketValidationError, InsuranceBracket, InsuranceCategory,
    RepositoryError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading insurance bracket data.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Row {row}: unknown insurance category '{category}'")]
    InvalidCategory { row: usize, category: String },

    #[error("Row {row}: {source}")]
    InvalidBracket {
        row: usize,
        #[source]
        source: BracketValidationError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the insurance brackets CSV file.
///
/// Columns:
/// - `category`: `labor`, `health`, `labor_pension` or `occupational_injury`
/// - `grade_level`: tier number within the category, starting at 1
/// - `salary_min` / `salary_max`: inclusive salary range (`salary_max` empty
///   for the open-ended top tier)
/// - `premium_base`: assessed wage the premium is computed from
/// - `rate`: premium rate as a decimal (e.g., 0.125 for 12.5%)
/// - `employee_ratio` / `employer_ratio` / `government_ratio`: payer shares
///   (`government_ratio` may be empty, meaning 0)
/// - `effective_date` / `expiry_date`: validity window, `YYYY-MM-DD`
///   (`expiry_date` empty for no expiry)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub category: String,
    pub grade_level: u32,
    pub salary_min: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub salary_max: Option<Decimal>,
    pub premium_base: Decimal,
    pub rate: Decimal,
    pub employee_ratio: Decimal,
    pub employer_ratio: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub government_ratio: Option<Decimal>,
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl BracketRecord {
    /// Convert to a validated [`InsuranceBracket`]. `row` is the 1-based
    /// record number used in error messages.
    pub fn to_bracket(
        &self,
        row: usize,
    ) -> Result<InsuranceBracket, BracketLoaderError> {
        let category = InsuranceCategory::parse(&self.category).ok_or_else(|| {
            BracketLoaderError::InvalidCategory {
                row,
                category: self.category.clone(),
            }
        })?;

        let bracket = InsuranceBracket {
            category,
            grade_level: self.grade_level,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            premium_base: self.premium_base,
            rate: self.rate,
            employee_ratio: self.employee_ratio,
            employer_ratio: self.employer_ratio,
            government_ratio: self.government_ratio.unwrap_or(Decimal::ZERO),
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
        };

        bracket
            .validate()
            .map_err(|source| BracketLoaderError::InvalidBracket { row, source })?;

        Ok(bracket)
    }
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for insurance bracket data from CSV files.
///
/// This loader reads CSV data and writes it through the
/// [`BracketRepository`] trait, so it works with any storage backend.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or
    /// a byte slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Validate every record, then replace the stored brackets of each
    /// (category, effective date) group found in `records`.
    ///
    /// Nothing is written if any record is invalid. Each group goes through
    /// [`BracketRepository::replace_brackets`], so on a transactional backend
    /// a failed group keeps its previous rows. Loading the same records twice
    /// leaves the store unchanged. Returns the number of brackets inserted.
    pub async fn load<R: BracketRepository + ?Sized>(
        repo: &R,
        records: &[BracketRecord],
    ) -> Result<usize, BracketLoaderError> {
        let mut groups: BTreeMap<(InsuranceCategory, NaiveDate), Vec<InsuranceBracket>> =
            BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            let bracket = record.to_bracket(index + 1)?;
            groups
                .entry((bracket.category, bracket.effective_date))
                .or_default()
                .push(bracket);
        }

        let mut inserted = 0;

        for ((category, effective_date), brackets) in groups {
            let removed = repo
                .replace_brackets(category, effective_date, &brackets)
                .await?;
            debug!(%category, %effective_date, removed, "cleared existing brackets");
            inserted += brackets.len();

            info!(
                %category,
                %effective_date,
                count = brackets.len(),
                "loaded insurance brackets"
            );
        }

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "category,grade_level,salary_min,salary_max,premium_base,rate,employee_ratio,employer_ratio,government_ratio,effective_date,expiry_date";

    const TEST_CSV: &str = r#"category,grade_level,salary_min,salary_max,premium_base,rate,employee_ratio,employer_ratio,government_ratio,effective_date,expiry_date
labor,1,28590,29999,28590,0.125,0.2,0.7,0.1,2025-01-01,
labor,2,30000,31199,30000,0.125,0.2,0.7,0.1,2025-01-01,
labor,15,45800,,45800,0.125,0.2,0.7,0.1,2025-01-01,
health,1,28590,29999,28590,0.0517,0.3,0.6,0.1,2025-01-01,
labor_pension,1,1500,3000,1500,0.06,0.0,1.0,0.0,2025-01-01,
labor,1,27470,28800,27470,0.115,0.2,0.7,0.1,2024-01-01,2025-01-01
"#;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn csv_with(row: &str) -> String {
        format!("{HEADER}\n{row}\n")
    }

    // ── in-memory repository ─────────────────────────────────────────────
    #[derive(Default)]
    struct MemoryRepository {
        brackets: Mutex<Vec<InsuranceBracket>>,
    }

    #[async_trait]
    impl BracketRepository for MemoryRepository {
        async fn list_brackets(&self) -> Result<Vec<InsuranceBracket>, RepositoryError> {
            Ok(self.brackets.lock().unwrap().clone())
        }
        async fn list_brackets_by_category(
            &self,
            category: InsuranceCategory,
        ) -> Result<Vec<InsuranceBracket>, RepositoryError> {
            Ok(self
                .brackets
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.category == category)
                .cloned()
                .collect())
        }
        async fn insert_bracket(
            &self,
            bracket: &InsuranceBracket,
        ) -> Result<(), RepositoryError> {
            self.brackets.lock().unwrap().push(bracket.clone());
            Ok(())
        }
        async fn delete_brackets(
            &self,
            category: InsuranceCategory,
            effective_date: NaiveDate,
        ) -> Result<u64, RepositoryError> {
            let mut brackets = self.brackets.lock().unwrap();
            let before = brackets.len();
            brackets.retain(|b| !(b.category == category && b.effective_date == effective_date));
            Ok((before - brackets.len()) as u64)
        }
        async fn count_brackets(
            &self,
            category: InsuranceCategory,
        ) -> Result<i64, RepositoryError> {
            Ok(self
                .brackets
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.category == category)
                .count() as i64)
        }
    }

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn test_parse_csv_single_bracket() {
        let csv = csv_with("labor,1,28590,29999,28590,0.125,0.2,0.7,0.1,2025-01-01,");

        let records = BracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![BracketRecord {
                category: "labor".to_string(),
                grade_level: 1,
                salary_min: dec!(28590),
                salary_max: Some(dec!(29999)),
                premium_base: dec!(28590),
                rate: dec!(0.125),
                employee_ratio: dec!(0.2),
                employer_ratio: dec!(0.7),
                government_ratio: Some(dec!(0.1)),
                effective_date: date(2025, 1, 1),
                expiry_date: None,
            }]
        );
    }

    #[test]
    fn test_parse_csv_open_ended_max_and_expiry() {
        let records = BracketLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 6);
        assert_eq!(records[2].salary_max, None);
        assert_eq!(records[5].expiry_date, Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_parse_empty_government_ratio() {
        let csv = csv_with("labor_pension,1,1500,3000,1500,0.06,0.0,1.0,,2025-01-01,");

        let records = BracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].government_ratio, None);
        let bracket = records[0].to_bracket(1).expect("Should be valid");
        assert_eq!(bracket.government_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_parse_invalid_csv_missing_column() {
        let csv = "category,grade_level,salary_min\nlabor,1,28590";

        let err = BracketLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");

        let BracketLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {}",
            msg
        );
    }

    #[test]
    fn test_parse_invalid_csv_bad_decimal() {
        let csv = csv_with("labor,1,abc,29999,28590,0.125,0.2,0.7,0.1,2025-01-01,");

        let err = BracketLoader::parse(csv.as_bytes()).expect_err("Should fail for bad decimal");

        assert!(matches!(err, BracketLoaderError::CsvParse(_)));
    }

    #[test]
    fn test_parse_invalid_csv_bad_date() {
        let csv = csv_with("labor,1,28590,29999,28590,0.125,0.2,0.7,0.1,2025-13-01,");

        let err = BracketLoader::parse(csv.as_bytes()).expect_err("Should fail for bad date");

        assert!(matches!(err, BracketLoaderError::CsvParse(_)));
    }

    #[test]
    fn test_parse_empty_csv() {
        let records = BracketLoader::parse(format!("{HEADER}\n").as_bytes())
            .expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    // =========================================================================
    // to_bracket tests
    // =========================================================================

    #[test]
    fn test_to_bracket_rejects_unknown_category() {
        let csv = csv_with("dental,1,28590,29999,28590,0.125,0.2,0.7,0.1,2025-01-01,");
        let records = BracketLoader::parse(csv.as_bytes()).unwrap();

        match records[0].to_bracket(7) {
            Err(BracketLoaderError::InvalidCategory { row, category }) => {
                assert_eq!(row, 7);
                assert_eq!(category, "dental");
            }
            other => panic!("expected InvalidCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_to_bracket_rejects_ratio_sum_mismatch() {
        let csv = csv_with("labor,1,28590,29999,28590,0.125,0.2,0.7,0.2,2025-01-01,");
        let records = BracketLoader::parse(csv.as_bytes()).unwrap();

        match records[0].to_bracket(1) {
            Err(BracketLoaderError::InvalidBracket { row, source }) => {
                assert_eq!(row, 1);
                assert_eq!(source, BracketValidationError::RatioSumMismatch(dec!(1.1)));
            }
            other => panic!("expected InvalidBracket, got {other:?}"),
        }
    }

    // =========================================================================
    // load tests
    // =========================================================================

    #[tokio::test]
    async fn test_load_inserts_every_record() {
        let repo = MemoryRepository::default();
        let records = BracketLoader::parse(TEST_CSV.as_bytes()).unwrap();

        let inserted = BracketLoader::load(&repo, &records)
            .await
            .expect("Failed to load brackets");

        assert_eq!(inserted, 6);
        assert_eq!(repo.count_brackets(InsuranceCategory::Labor).await, Ok(4));
        assert_eq!(repo.count_brackets(InsuranceCategory::Health).await, Ok(1));
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let repo = MemoryRepository::default();
        let records = BracketLoader::parse(TEST_CSV.as_bytes()).unwrap();

        BracketLoader::load(&repo, &records).await.unwrap();
        BracketLoader::load(&repo, &records).await.unwrap();

        assert_eq!(repo.list_brackets().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_load_replaces_only_matching_window() {
        let repo = MemoryRepository::default();
        let records = BracketLoader::parse(TEST_CSV.as_bytes()).unwrap();
        BracketLoader::load(&repo, &records).await.unwrap();

        let update = csv_with("labor,1,28590,29999,28590,0.13,0.2,0.7,0.1,2025-01-01,");
        let update = BracketLoader::parse(update.as_bytes()).unwrap();
        BracketLoader::load(&repo, &update).await.unwrap();

        let labor = repo
            .list_brackets_by_category(InsuranceCategory::Labor)
            .await
            .unwrap();
        assert_eq!(labor.len(), 2);
        assert!(labor.iter().any(|b| b.effective_date == date(2024, 1, 1)));
        assert!(labor.iter().any(|b| b.rate == dec!(0.13)));
        assert_eq!(repo.count_brackets(InsuranceCategory::Health).await, Ok(1));
    }

    #[tokio::test]
    async fn test_load_writes_nothing_when_any_record_is_invalid() {
        let repo = MemoryRepository::default();
        let csv = format!(
            "{HEADER}\nlabor,1,28590,29999,28590,0.125,0.2,0.7,0.1,2025-01-01,\nlabor,2,31199,30000,30000,0.125,0.2,0.7,0.1,2025-01-01,\n"
        );
        let records = BracketLoader::parse(csv.as_bytes()).unwrap();

        let err = BracketLoader::load(&repo, &records)
            .await
            .expect_err("Should reject inverted salary range");

        assert!(matches!(err, BracketLoaderError::InvalidBracket { row: 2, .. }));
        assert!(repo.list_brackets().await.unwrap().is_empty());
    }
}
