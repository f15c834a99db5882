//! Local field validation for registration and password forms. Checks run on
//! submit (blocking) and per keystroke on the changed field (advisory). Nothing
//! here talks to the backend.

use regex::Regex;
use std::collections::BTreeMap;

/// Symbols accepted as the password's special character.
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Registration form fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    Password,
    ConfirmPassword,
    NationalId,
}

impl Field {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::NationalId => "nationalId",
        }
    }
}

/// Error message per invalid field.
pub type FieldErrors = BTreeMap<Field, String>;

fn matches(pattern: &str, value: &str) -> bool {
    Regex::new(pattern).is_ok_and(|regex| regex.is_match(value))
}

/// # Errors
/// Returns the message to show when the name is empty or contains anything but
/// letters and spaces.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        Err("Name is required.".to_string())
    } else if !matches(r"^[A-Za-z ]+$", name.trim()) {
        Err("Name can only contain letters and spaces.".to_string())
    } else {
        Ok(())
    }
}

/// # Errors
/// Returns the message to show when the email is empty or not `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        Err("Email is required.".to_string())
    } else if !matches(r"^[^@\s]+@[^@\s]+\.[^@\s]+$", email) {
        Err("Enter a valid email address.".to_string())
    } else {
        Ok(())
    }
}

/// # Errors
/// Returns the message to show unless the phone is 10 digits not starting with `0`.
pub fn validate_phone(phone: &str) -> Result<(), String> {
    let phone = phone.trim();
    if phone.is_empty() {
        Err("Phone number is required.".to_string())
    } else if !matches(r"^[1-9][0-9]{9}$", phone) {
        Err("Phone number must be 10 digits and cannot start with 0.".to_string())
    } else {
        Ok(())
    }
}

/// # Errors
/// Returns the message to show unless the password has at least eight
/// characters including a lowercase letter, an uppercase letter, a digit and
/// one of `@$!%*?&`.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required.".to_string());
    }

    let long_enough = password.chars().count() >= MIN_PASSWORD_CHARS;
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if long_enough && lower && upper && digit && symbol {
        Ok(())
    } else {
        Err(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters and include uppercase, lowercase, a number and one of {PASSWORD_SYMBOLS}."
        ))
    }
}

/// # Errors
/// Returns the message to show when the confirmation differs from the password.
pub fn validate_confirm_password(password: &str, confirm: &str) -> Result<(), String> {
    if confirm.is_empty() {
        Err("Please confirm your password.".to_string())
    } else if password != confirm {
        Err("Passwords do not match.".to_string())
    } else {
        Ok(())
    }
}

/// # Errors
/// Returns the message to show unless the ID is 12 digits that are not all the same.
pub fn validate_national_id(id: &str) -> Result<(), String> {
    let id = id.trim();
    if !matches(r"^[0-9]{12}$", id) {
        return Err("National ID must be exactly 12 digits.".to_string());
    }
    let mut chars = id.chars();
    let first = chars.next();
    if chars.all(|c| Some(c) == first) {
        Err("National ID cannot be a single repeated digit.".to_string())
    } else {
        Ok(())
    }
}

/// Registration form contents as typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    /// Collected only on forms that ask for it.
    pub national_id: Option<String>,
    pub business_name: Option<String>,
}

impl RegistrationForm {
    /// Checks one field. Used on every keystroke; the result is advisory.
    #[must_use]
    pub fn validate_field(&self, field: Field) -> Option<String> {
        let result = match field {
            Field::Name => validate_name(&self.name),
            Field::Email => validate_email(&self.email),
            Field::Phone => validate_phone(&self.phone),
            Field::Password => validate_password(&self.password),
            Field::ConfirmPassword => validate_confirm_password(&self.password, &self.confirm_password),
            Field::NationalId => match &self.national_id {
                Some(id) => validate_national_id(id),
                None => Ok(()),
            },
        };
        result.err()
    }

    /// Checks every field. Submission is blocked unless this is empty.
    #[must_use]
    pub fn validate_all(&self) -> FieldErrors {
        [
            Field::Name,
            Field::Email,
            Field::Phone,
            Field::Password,
            Field::ConfirmPassword,
            Field::NationalId,
        ]
        .into_iter()
        .filter_map(|field| self.validate_field(field).map(|message| (field, message)))
        .collect()
    }
}
