//! Random password generation.

use rand::seq::{IndexedRandom, SliceRandom};

use super::strength::SPECIAL_CHARS;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Shortest password we generate.
pub const MIN_LENGTH: usize = 8;

/// Longest password we generate; matches the secret capacity.
pub const MAX_LENGTH: usize = 64;

/// Generate a random password.
///
/// `length` is clamped to `MIN_LENGTH..=MAX_LENGTH`. The result always
/// holds at least one lowercase letter, one uppercase letter, one digit
/// and, when `include_special` is set, one special character.
pub fn generate_password(length: usize, include_special: bool) -> String {
    let length = length.clamp(MIN_LENGTH, MAX_LENGTH);
    let mut rng = rand::rng();

    let mut classes: Vec<&[u8]> = vec![LOWERCASE, UPPERCASE, DIGITS];
    if include_special {
        classes.push(SPECIAL_CHARS.as_bytes());
    }
    let alphabet: Vec<u8> = classes.iter().flat_map(|c| c.iter().copied()).collect();

    let mut chars: Vec<u8> = classes
        .iter()
        .filter_map(|class| class.choose(&mut rng).copied())
        .collect();

    while chars.len() < length {
        if let Some(&c) = alphabet.choose(&mut rng) {
            chars.push(c);
        }
    }

    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passwords::strength::check_strength;

    #[test]
    fn length_is_clamped() {
        assert_eq!(generate_password(2, true).len(), MIN_LENGTH);
        assert_eq!(generate_password(500, true).len(), MAX_LENGTH);
        assert_eq!(generate_password(20, false).len(), 20);
    }

    #[test]
    fn contains_every_required_class() {
        for _ in 0..50 {
            let pw = generate_password(MIN_LENGTH, true);
            assert!(pw.chars().any(|c| c.is_ascii_lowercase()));
            assert!(pw.chars().any(|c| c.is_ascii_uppercase()));
            assert!(pw.chars().any(|c| c.is_ascii_digit()));
            assert!(pw.chars().any(|c| SPECIAL_CHARS.contains(c)));
        }
    }

    #[test]
    fn no_special_characters_when_disabled() {
        let pw = generate_password(64, false);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn default_style_password_is_strong() {
        let pw = generate_password(16, true);
        assert!(!check_strength(&pw).is_weak);
    }
}
