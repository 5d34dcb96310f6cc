//! Five-point password strength scoring.

/// Characters that count towards the "special character" point.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Highest score `check_strength` can return.
pub const MAX_SCORE: u8 = 5;

/// Scores below this are reported as weak.
const WEAK_BELOW: u8 = 4;

/// Result of scoring one password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthReport {
    pub score: u8,
    pub max_score: u8,
    pub is_weak: bool,
    /// One hint per missed criterion.
    pub feedback: Vec<String>,
}

/// Score a password: one point each for length ≥ 8, length ≥ 12, mixed
/// case, a digit and a special character.
pub fn check_strength(password: &str) -> StrengthReport {
    let mut score = 0u8;
    let mut feedback = Vec::new();
    let len = password.chars().count();

    if len >= 8 {
        score += 1;
    } else {
        feedback.push("Password should be at least 8 characters".to_string());
    }

    if len >= 12 {
        score += 1;
    }

    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    if has_upper && has_lower {
        score += 1;
    } else {
        feedback.push("Add uppercase and lowercase letters".to_string());
    }

    if password.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    } else {
        feedback.push("Add numbers".to_string());
    }

    if password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        score += 1;
    } else {
        feedback.push("Add special characters".to_string());
    }

    StrengthReport {
        score,
        max_score: MAX_SCORE,
        is_weak: score < WEAK_BELOW,
        feedback,
    }
}

/// Returns `true` if `candidate` already appears in `existing`.
pub fn is_reused<S: AsRef<str>>(candidate: &str, existing: &[S]) -> bool {
    existing.iter().any(|s| s.as_ref() == candidate)
}
