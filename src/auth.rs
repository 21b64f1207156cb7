//! The auth module implements account registration, credential checks and
//! password resets on top of the user store.

use anyhow::Result;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AuthError;
use crate::storage::{Credentials, Storage};

const MIN_PASSWORD_LEN: usize = 6;

static PASSWORD_RULES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [r"[a-z]", r"[A-Z]", r"\d"].map(|rule| Regex::new(rule).expect("Failed to compile password rule"))
});

/// A password is valid with at least six characters, one lowercase letter,
/// one uppercase letter and one digit.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && PASSWORD_RULES.iter().all(|rule| rule.is_match(password))
}

fn hash_password(password: &str, salt: &str) -> String {
    Sha256::digest(format!("{salt}:{password}").as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn new_credentials(password: &str) -> Credentials {
    let salt = Uuid::new_v4().simple().to_string();
    Credentials {
        password_hash: hash_password(password, &salt),
        salt,
    }
}

fn check_new_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }
    if !is_valid_password(password) {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Creates an account after checking the confirmation and password policy.
///
/// # Errors
///
/// Returns [`AuthError`] for mismatching or weak passwords and taken
/// usernames, or a database error.
pub fn register(storage: &Storage, username: &str, password: &str, confirmation: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::EmptyUsername.into());
    }
    check_new_password(password, confirmation)?;

    if !storage.insert_user(username, &new_credentials(password))? {
        return Err(AuthError::UserExists(username.to_owned()).into());
    }

    info!("Registered account {username}");
    Ok(())
}

/// Checks a username and password pair.
///
/// # Errors
///
/// Returns [`AuthError::UnknownUser`] when the account doesn't exist,
/// [`AuthError::InvalidCredentials`] for a wrong password, or a database error.
pub fn verify(storage: &Storage, username: &str, password: &str) -> Result<()> {
    let username = username.trim();
    let credentials = storage
        .get_credentials(username)?
        .ok_or_else(|| AuthError::UnknownUser(username.to_owned()))?;

    if hash_password(password, &credentials.salt) != credentials.password_hash {
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(())
}

/// Sets a new password for an existing account.
///
/// # Errors
///
/// Returns [`AuthError`] for unknown accounts, mismatching or weak
/// passwords, or a database error.
pub fn reset_password(
    storage: &Storage,
    username: &str,
    password: &str,
    confirmation: &str,
) -> Result<()> {
    let username = username.trim();
    if !storage.user_exists(username)? {
        return Err(AuthError::UnknownUser(username.to_owned()).into());
    }
    check_new_password(password, confirmation)?;

    storage.update_credentials(username, &new_credentials(password))?;
    info!("Password reset for {username}");
    Ok(())
}
