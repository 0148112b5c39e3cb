use tracing::{debug, info, instrument};

use crate::{
    auth::{
        extractors::Caller,
        password::{hash_password, unusable_password},
    },
    error::AccountError,
};

use super::{
    filter::{UserFilter, UserPredicate},
    model::{normalize_email, NewUser, UserRecord},
    patch::UserPatch,
    store::UserStore,
};

/// Input of `createUser`; every field is optional at the API layer.
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Record of the caller, or `None` for anonymous callers, vanished users and inactive accounts.
#[instrument(skip(store))]
pub async fn current_user(
    store: &dyn UserStore,
    caller: Caller,
) -> Result<Option<UserRecord>, AccountError> {
    let Some(user_id) = caller.user_id() else {
        return Ok(None);
    };
    match store.get(user_id).await {
        Ok(user) if user.is_active => Ok(Some(user)),
        Ok(_) | Err(AccountError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

#[instrument(skip(store))]
pub async fn get_user(store: &dyn UserStore, id: i64) -> Result<UserRecord, AccountError> {
    store.get(id).await
}

#[instrument(skip(store))]
pub async fn list_users(
    store: &dyn UserStore,
    filter: &UserFilter,
) -> Result<Vec<UserRecord>, AccountError> {
    store.list(&UserPredicate::from(filter)).await
}

#[instrument(skip(store, input), fields(username = ?input.username))]
pub async fn create_user(
    store: &dyn UserStore,
    input: CreateUserInput,
) -> Result<UserRecord, AccountError> {
    let username = input
        .username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AccountError::ConstraintViolation("The given username must be set".into()))?;

    let password_hash = match input.password.as_deref() {
        Some(password) => hash_password(password)?,
        None => unusable_password(),
    };

    let user = store
        .create(NewUser {
            username,
            email: normalize_email(input.email.as_deref().unwrap_or_default()),
            password_hash,
            is_active: true,
            is_staff: false,
            is_superuser: false,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok(user)
}

#[instrument(skip(store, patch))]
pub async fn update_user(
    store: &dyn UserStore,
    id: i64,
    patch: UserPatch,
) -> Result<UserRecord, AccountError> {
    let mut user = store.get(id).await?;
    if patch.is_empty() {
        debug!(user_id = id, "no fields supplied; saving record unchanged");
    }
    patch.apply(&mut user)?;
    let user = store.save(&user).await?;

    info!(user_id = user.id, username = %user.username, "user updated");
    Ok(user)
}
