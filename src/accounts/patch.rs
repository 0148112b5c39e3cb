use crate::{auth::password::hash_password, error::AccountError};

use super::model::UserRecord;

/// Fields `updateUser` may change. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.is_active.is_none()
            && self.password.is_none()
    }

    /// Writes supplied fields onto `user` in memory; the password is rehashed last.
    /// Nothing is persisted here.
    pub fn apply(self, user: &mut UserRecord) -> Result<(), AccountError> {
        if let Some(username) = self.username {
            if username.is_empty() {
                return Err(AccountError::ConstraintViolation(
                    "The given username must be set".into(),
                ));
            }
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(password) = self.password {
            user.password_hash = hash_password(&password)?;
        }
        Ok(())
    }
}
