//! Input validation for API requests.
//!
//! Validators return `Result<(), String>` with a Romanian message so they can
//! be fed straight into `ValidationErrorBuilder::check` or mapped to a
//! single-message `ApiError::bad_request`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose email shape check: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    /// Runs of characters that are not allowed in a slug
    static ref SLUG_SEPARATOR_REGEX: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_LOGIN_PASSWORD_LENGTH: usize = 500;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 200;

/// Trim and lower-case an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an (already normalized) email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(email) {
        return Err("Email invalid.".to_string());
    }
    Ok(())
}

/// Password policy for staff accounts: 8..200 characters with letters and digits
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let length = password.chars().count();
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) || !has_letter || !has_digit
    {
        return Err(
            "Parola trebuie să aibă minim 8 caractere și să conțină litere și cifre.".to_string(),
        );
    }
    Ok(())
}

/// Customer signup only enforces a minimum length
pub fn validate_signup_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Email sau parolă invalidă (minim 8 caractere).".to_string());
    }
    Ok(())
}

/// Require a trimmed value of at least `min` characters
pub fn validate_min_length(value: Option<&str>, min: usize, message: &str) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() >= min => Ok(()),
        _ => Err(message.to_string()),
    }
}

/// Validate a UUID string
pub fn validate_uuid(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("Lipsește {}.", field_name));
    }

    if uuid::Uuid::parse_str(id).is_err() {
        return Err(format!("{} invalid.", field_name));
    }

    Ok(())
}

/// Build a URL slug from a display name.
///
/// Romanian diacritics are folded to ASCII (both the comma-below and the
/// legacy cedilla forms), every other run of non-alphanumerics becomes `-`.
pub fn slugify(input: &str) -> String {
    let folded: String = input
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ă' | 'â' | 'á' | 'à' | 'ä' => 'a',
            'î' | 'í' => 'i',
            'ș' | 'ş' => 's',
            'ț' | 'ţ' => 't',
            'é' | 'è' | 'ë' => 'e',
            'ó' | 'ö' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect();

    SLUG_SEPARATOR_REGEX
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Normalize a part code for lookups: ASCII alphanumerics only, upper-case.
///
/// `"A-123.b"` becomes `"A123B"`.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Escape `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("agent@firma.ro").is_ok());
        assert!(validate_email("a.b+c@sub.domeniu.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("fara-arond").is_err());
        assert!(validate_email("a b@c.ro").is_err());
        assert!(validate_email("a@b").is_err());

        let long = format!("{}@firma.ro", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@Firma.RO "), "admin@firma.ro");
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("parola123").is_ok());
        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("doarlitere").is_err());
        assert!(validate_password_strength("1234567890").is_err());
        assert!(validate_password_strength(&format!("a1{}", "x".repeat(199))).is_err());
    }

    #[test]
    fn test_validate_signup_password() {
        assert!(validate_signup_password("12345678").is_ok());
        assert!(validate_signup_password("1234567").is_err());
    }

    #[test]
    fn test_validate_min_length() {
        assert!(validate_min_length(Some("ab"), 2, "Nume").is_ok());
        assert_eq!(
            validate_min_length(Some("a"), 2, "Numele este obligatoriu."),
            Err("Numele este obligatoriu.".to_string())
        );
        assert!(validate_min_length(None, 2, "x").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "userId").is_ok());
        assert!(validate_uuid("", "userId").is_err());
        assert!(validate_uuid("not-a-uuid", "userId").is_err());
    }

    #[test]
    fn test_slugify_folds_romanian_diacritics() {
        assert_eq!(slugify("Plăcuțe frână față"), "placute-frana-fata");
        assert_eq!(slugify("Ştergător parbriz (Şeţ)"), "stergator-parbriz-set");
        assert_eq!(slugify("  --Filtru ulei MAN TGX-- "), "filtru-ulei-man-tgx");
        assert_eq!(slugify("Îmbinare"), "imbinare");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("A-123.b"), "A123B");
        assert_eq!(normalize_code(" 81.12501-6004 "), "81125016004");
        assert_eq!(normalize_code(""), "");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("disc"), "%disc%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }
}
