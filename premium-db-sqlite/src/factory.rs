use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use premium_core::db::{BracketRepository, DbConfig, RepositoryError, RepositoryFactory};

use crate::repository::SqliteRepository;

/// Environment variable overriding the seeds directory.
pub const SEEDS_DIR_ENV: &str = "PREMIUM_DB_SQLITE_SEEDS_DIR";

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`PREMIUM_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **`$CARGO_MANIFEST_DIR/seeds`** when run from the build tree.
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`premium_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use premium_core::db::RepositoryRegistry;
/// use premium_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, apply
    /// migrations, then load the reference brackets from the seeds
    /// directory if the bracket table is still empty. A database that
    /// already holds brackets is left as it is.
    ///
    /// Accepted connection-string values:
    /// * A bare file path such as `"insurance.db"`. The file is created if
    ///   it does not exist.
    /// * A sqlx URL such as `"sqlite:insurance.db?mode=rwc"`.
    /// * `":memory:"` for an ephemeral database.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn BracketRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let empty = repo
            .is_empty()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        if empty {
            let seeds = seeds_dir();
            repo.run_seeds(&seeds)
                .await
                .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
            info!(seeds = %seeds.display(), "seeded reference brackets");
        } else {
            debug!("brackets already present; skipping seeds");
        }

        info!(database = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
