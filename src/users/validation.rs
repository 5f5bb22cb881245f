/// Maximum number of entries in a user's finished tutorial list
pub const MAX_FINISHED_TUTORIALS: usize = 50;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 22;
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Usernames are 3-22 characters of ASCII letters, digits, underscore and hyphen.
pub fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check password strength, returning the first rule the password breaks.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err("Password must be at least 8 characters long.");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit.");
    }

    if !password.chars().any(char::is_lowercase) {
        return Err("Password must contain at least one lowercase letter.");
    }

    if !password.chars().any(char::is_uppercase) {
        return Err("Password must contain at least one uppercase letter.");
    }

    Ok(())
}
