//! crates/session_core/src/validation.rs
//!
//! Local checks on user input. Anything rejected here never reaches the gateway.

use crate::domain::{Credentials, PasswordChange, ProfileDraft, ProfilePatch, Role};
use crate::error::{ValidationError, MIN_PASSWORD_LEN};

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationError> {
    if blank(&credentials.email) || credentials.password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}

/// Raw registration input, including the confirmation field.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
}

impl RegistrationForm {
    pub fn validate(self) -> Result<ProfileDraft, ValidationError> {
        if blank(&self.email)
            || self.password.is_empty()
            || blank(&self.first_name)
            || blank(&self.last_name)
        {
            return Err(ValidationError::MissingFields);
        }
        check_new_password(&self.password, &self.confirm_password)?;

        Ok(ProfileDraft {
            email: self.email.trim().to_string(),
            password: self.password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            role: self.role,
        })
    }
}

/// Raw password-change input, including the confirmation field.
#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeForm {
    pub fn validate(self) -> Result<PasswordChange, ValidationError> {
        if self.current_password.is_empty() || self.new_password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        check_new_password(&self.new_password, &self.confirm_password)?;

        Ok(PasswordChange {
            current_password: self.current_password,
            new_password: self.new_password,
        })
    }
}

/// Drops blank fields; a patch with nothing left is rejected.
pub fn validate_patch(patch: ProfilePatch) -> Result<ProfilePatch, ValidationError> {
    let keep = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let patch = ProfilePatch {
        first_name: keep(patch.first_name),
        last_name: keep(patch.last_name),
    };
    if patch.first_name.is_none() && patch.last_name.is_none() {
        return Err(ValidationError::EmptyPatch);
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            email: " ana@example.com ".into(),
            password: "s3cretpass".into(),
            confirm_password: "s3cretpass".into(),
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            role: None,
        }
    }

    #[test]
    fn registration_trims_and_accepts() {
        let draft = registration().validate().unwrap();
        assert_eq!(draft.email, "ana@example.com");
        assert_eq!(draft.role, None);
    }

    #[test]
    fn registration_rejections() {
        let mut form = registration();
        form.last_name = "  ".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::MissingFields);

        let mut form = registration();
        form.confirm_password = "different1".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordMismatch);

        let mut form = registration();
        form.password = "short".into();
        form.confirm_password = "short".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordTooShort);
    }

    #[test]
    fn password_change_checks_confirmation_first() {
        let form = PasswordChangeForm {
            current_password: "oldpassword".into(),
            new_password: "abc".into(),
            confirm_password: "abd".into(),
        };
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordMismatch);
    }

    #[test]
    fn credentials_need_both_fields() {
        assert!(validate_credentials(&Credentials::new("a@b.c", "")).is_err());
        assert!(validate_credentials(&Credentials::new(" ", "pw")).is_err());
        assert!(validate_credentials(&Credentials::new("a@b.c", "pw")).is_ok());
    }

    #[test]
    fn blank_patch_is_rejected() {
        let patch = ProfilePatch {
            first_name: Some(" ".into()),
            last_name: None,
        };
        assert_eq!(validate_patch(patch).unwrap_err(), ValidationError::EmptyPatch);

        let patch = ProfilePatch {
            first_name: Some(" Eva ".into()),
            last_name: None,
        };
        assert_eq!(validate_patch(patch).unwrap().first_name.as_deref(), Some("Eva"));
    }
}
