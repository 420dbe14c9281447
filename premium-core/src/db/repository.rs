use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{InsuranceBracket, InsuranceCategory};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for insurance bracket records.
///
/// Implementations own the records; callers load them and hand a slice to
/// [`BracketStore`](crate::BracketStore) for lookups.
#[async_trait]
pub trait BracketRepository: Send + Sync {
    /// Every stored bracket, ordered by category, grade level, then
    /// effective date.
    async fn list_brackets(&self) -> Result<Vec<InsuranceBracket>, RepositoryError>;

    /// Brackets of one category, ordered by grade level, then effective date.
    async fn list_brackets_by_category(
        &self,
        category: InsuranceCategory,
    ) -> Result<Vec<InsuranceBracket>, RepositoryError>;

    async fn insert_bracket(
        &self,
        bracket: &InsuranceBracket,
    ) -> Result<(), RepositoryError>;

    /// Removes the brackets of `category` that take effect on
    /// `effective_date`, returning how many were removed.
    async fn delete_brackets(
        &self,
        category: InsuranceCategory,
        effective_date: NaiveDate,
    ) -> Result<u64, RepositoryError>;

    /// Swaps the brackets of `category` taking effect on `effective_date`
    /// for `brackets`, returning how many were removed.
    ///
    /// The default deletes then inserts record by record. Backends with
    /// transactions override it so a failed insert keeps the previous rows.
    async fn replace_brackets(
        &self,
        category: InsuranceCategory,
        effective_date: NaiveDate,
        brackets: &[InsuranceBracket],
    ) -> Result<u64, RepositoryError> {
        let removed = self.delete_brackets(category, effective_date).await?;
        for bracket in brackets {
            self.insert_bracket(bracket).await?;
        }
        Ok(removed)
    }

    async fn count_brackets(
        &self,
        category: InsuranceCategory,
    ) -> Result<i64, RepositoryError>;
}
