pub mod calculations;
pub mod db;
pub mod models;
pub mod validation;

pub use calculations::{BracketStore, PremiumResolver, SalaryInput};
pub use db::repository::{BracketRepository, RepositoryError};
pub use models::*;
pub use validation::{TaxId, TaxIdError, is_valid};
