/*
 * Responsibility
 * - 入力値の validation ルール (現状は strong password のみ)
 * - 失敗時のメッセージは field 名込みで返す (errorMessage にそのまま載せる想定)
 */
use std::sync::LazyLock;

use regex::Regex;

const MIN_PASSWORD_LEN: usize = 8;

static UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]").unwrap());
static LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]").unwrap());
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]").unwrap());
static SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]"#).unwrap());

/// At least 8 characters with one uppercase letter, one lowercase letter,
/// one digit and one special character.
///
/// Length counts `char`s, not UTF-8 bytes, to match the "8 characters" the
/// message promises: `"Aa1!ééé"` is 10 bytes but only 7 characters and fails.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && UPPER.is_match(password)
        && LOWER.is_match(password)
        && DIGIT.is_match(password)
        && SPECIAL.is_match(password)
}

pub fn validate_strong_password(field: &str, password: &str) -> Result<(), String> {
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(format!(
            "{field} must contain at least 8 characters, one uppercase, one lowercase, one digit, and one special character"
        ))
    }
}
