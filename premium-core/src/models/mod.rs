mod insurance_bracket;
mod insurance_category;
mod premium_split;

pub use insurance_bracket::{BracketValidationError, InsuranceBracket, RATIO_SUM_TOLERANCE};
pub use insurance_category::InsuranceCategory;
pub use premium_split::{MatchedBracket, PremiumSplit};
