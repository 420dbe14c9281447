//! Bracket lookup and premium computation.
//!
//! [`BracketStore`] is a read-only view over bracket records owned by the
//! caller. [`PremiumResolver`] picks the single applicable bracket from that
//! view and splits its premium across the three payers.

pub mod bracket_store;
pub mod common;
pub mod premium_resolver;
pub mod salary;

pub use bracket_store::BracketStore;
pub use premium_resolver::PremiumResolver;
pub use salary::SalaryInput;
