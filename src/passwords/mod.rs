//! Password hygiene helpers that work on decrypted vault entries.
//!
//! - Strength scoring and reuse detection (`strength`)
//! - Random password generation (`generator`)
//! - A vault-wide security score (`health`)

pub mod generator;
pub mod health;
pub mod strength;

pub use generator::generate_password;
pub use health::SecurityHealth;
pub use strength::{check_strength, is_reused, StrengthReport};
