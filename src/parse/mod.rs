pub mod codeowners;
pub mod owner;
pub mod types;

pub use codeowners::{compile_pattern, parse_codeowners};
pub use owner::normalize_owner;
pub use types::{OwnerId, OwnershipRule, RulePattern};
