use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use premium_core::{BracketRepository, InsuranceBracket, InsuranceCategory, RepositoryError};
use sqlx::Row;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const BRACKET_COLUMNS: &str = "category, grade_level, salary_min, salary_max, premium_base, rate,
     employee_ratio, employer_ratio, government_ratio, effective_date, expiry_date";

const DELETE_WINDOW: &str =
    "DELETE FROM insurance_brackets WHERE category = ? AND effective_date = ?";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connect to `database_url`, which may be a sqlx URL
    /// (`sqlite:insurance.db?mode=rwc`), a bare file path, or `:memory:`.
    ///
    /// The pool holds a single long-lived connection so an in-memory
    /// database survives between queries.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;

        debug!(database_url, "connected to sqlite");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;

            debug!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    /// True while the bracket table holds no rows.
    pub async fn is_empty(&self) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM insurance_brackets) AS populated")
            .fetch_one(&self.pool)
            .await
            .context("Failed to check for stored brackets")?;
        let populated: i64 = row
            .try_get("populated")
            .context("Failed to read bracket presence")?;
        Ok(populated == 0)
    }
}

fn insert_sql() -> String {
    format!(
        "INSERT INTO insurance_brackets ({BRACKET_COLUMNS})
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
}

fn bind_bracket<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    bracket: &InsuranceBracket,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(bracket.category.as_str())
        .bind(i64::from(bracket.grade_level))
        .bind(decimal_to_text(bracket.salary_min))
        .bind(bracket.salary_max.map(decimal_to_text))
        .bind(decimal_to_text(bracket.premium_base))
        .bind(decimal_to_text(bracket.rate))
        .bind(decimal_to_text(bracket.employee_ratio))
        .bind(decimal_to_text(bracket.employer_ratio))
        .bind(decimal_to_text(bracket.government_ratio))
        .bind(bracket.effective_date)
        .bind(bracket.expiry_date)
}

fn get_date(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<NaiveDate>, RepositoryError> {
    row.try_get::<Option<NaiveDate>, _>(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", column, e)))
}

fn row_to_bracket(row: &SqliteRow) -> Result<InsuranceBracket, RepositoryError> {
    let category_str: String = row
        .try_get("category")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let category = InsuranceCategory::parse(&category_str).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid insurance category: {}", category_str))
    })?;

    let grade_level: i64 = row
        .try_get("grade_level")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let grade_level = u32::try_from(grade_level).map_err(|_| {
        RepositoryError::Database(format!("Grade level out of range: {}", grade_level))
    })?;

    let effective_date = get_date(row, "effective_date")?.ok_or_else(|| {
        RepositoryError::Database("Column 'effective_date' is NULL".to_string())
    })?;

    Ok(InsuranceBracket {
        category,
        grade_level,
        salary_min: get_decimal(row, "salary_min")?,
        salary_max: get_optional_decimal(row, "salary_max")?,
        premium_base: get_decimal(row, "premium_base")?,
        rate: get_decimal(row, "rate")?,
        employee_ratio: get_decimal(row, "employee_ratio")?,
        employer_ratio: get_decimal(row, "employer_ratio")?,
        government_ratio: get_decimal(row, "government_ratio")?,
        effective_date,
        expiry_date: get_date(row, "expiry_date")?,
    })
}

#[async_trait]
impl BracketRepository for SqliteRepository {
    async fn list_brackets(&self) -> Result<Vec<InsuranceBracket>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {BRACKET_COLUMNS}
             FROM insurance_brackets
             ORDER BY category, grade_level, effective_date"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_bracket).collect()
    }

    async fn list_brackets_by_category(
        &self,
        category: InsuranceCategory,
    ) -> Result<Vec<InsuranceBracket>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {BRACKET_COLUMNS}
             FROM insurance_brackets
             WHERE category = ?
             ORDER BY grade_level, effective_date"
        ))
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_bracket).collect()
    }

    async fn insert_bracket(
        &self,
        bracket: &InsuranceBracket,
    ) -> Result<(), RepositoryError> {
        let sql = insert_sql();
        bind_bracket(sqlx::query(&sql), bracket)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_brackets(
        &self,
        category: InsuranceCategory,
        effective_date: NaiveDate,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(DELETE_WINDOW)
            .bind(category.as_str())
            .bind(effective_date)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Runs the delete and every insert in one transaction; any failure
    /// rolls back and the previous rows stay in place.
    async fn replace_brackets(
        &self,
        category: InsuranceCategory,
        effective_date: NaiveDate,
        brackets: &[InsuranceBracket],
    ) -> Result<u64, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let removed = sqlx::query(DELETE_WINDOW)
            .bind(category.as_str())
            .bind(effective_date)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .rows_affected();

        let sql = insert_sql();
        for bracket in brackets {
            bind_bracket(sqlx::query(&sql), bracket)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(
            %category,
            %effective_date,
            removed,
            inserted = brackets.len(),
            "replaced brackets"
        );
        Ok(removed)
    }

    async fn count_brackets(
        &self,
        category: InsuranceCategory,
    ) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM insurance_brackets WHERE category = ?")
            .bind(category.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.try_get("n")
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }
}
