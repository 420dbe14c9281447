//! Identifier validation.

pub mod tax_id;

pub use tax_id::{TaxId, TaxIdError, is_valid};
