use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::AccountError;

use super::{
    filter::UserPredicate,
    model::{NewUser, UserRecord},
    store::UserStore,
};

/// `UserStore` backed by a map, with the same uniqueness rule as the `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<BTreeMap<i64, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn username_taken(rows: &BTreeMap<i64, UserRecord>, username: &str, except: i64) -> bool {
        rows.values()
            .any(|u| u.id != except && u.username == username)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, id: i64) -> Result<UserRecord, AccountError> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AccountError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self, predicate: &UserPredicate) -> Result<Vec<UserRecord>, AccountError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|u| predicate.matches(u))
            .cloned()
            .collect())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, AccountError> {
        let mut rows = self.rows.write().await;
        if Self::username_taken(&rows, &user.username, 0) {
            return Err(AccountError::ConstraintViolation(
                "duplicate key value violates unique constraint \"users_username_key\"".into(),
            ));
        }
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        let record = UserRecord {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            first_name: String::new(),
            last_name: String::new(),
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            last_login: None,
            date_joined: OffsetDateTime::now_utc(),
        };
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn save(&self, user: &UserRecord) -> Result<UserRecord, AccountError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&user.id) {
            return Err(AccountError::NotFound);
        }
        if Self::username_taken(&rows, &user.username, user.id) {
            return Err(AccountError::ConstraintViolation(
                "duplicate key value violates unique constraint \"users_username_key\"".into(),
            ));
        }
        rows.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn touch_last_login(&self, id: i64, at: OffsetDateTime) -> Result<(), AccountError> {
        if let Some(user) = self.rows.write().await.get_mut(&id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::filter::UserFilter;

    fn new_user(username: &str, is_superuser: bool) -> NewUser {
        NewUser {
            username: username.into(),
            email: String::new(),
            password_hash: "!x".into(),
            is_active: true,
            is_staff: is_superuser,
            is_superuser,
        }
    }

    #[tokio::test]
    async fn assigns_increasing_keys_and_rejects_duplicates() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a", false)).await.unwrap();
        let b = store.create(new_user("b", false)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let err = store.create(new_user("a", false)).await.unwrap_err();
        assert!(matches!(err, AccountError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn save_enforces_uniqueness_against_other_rows() {
        let store = MemoryUserStore::new();
        store.create(new_user("a", false)).await.unwrap();
        let mut b = store.create(new_user("b", false)).await.unwrap();

        b.username = "b".into();
        store.save(&b).await.expect("saving own username is fine");

        b.username = "a".into();
        assert!(matches!(
            store.save(&b).await,
            Err(AccountError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn list_applies_predicate() {
        let store = MemoryUserStore::new();
        store.create(new_user("root", true)).await.unwrap();
        store.create(new_user("alice", false)).await.unwrap();

        let all = store
            .list(&UserPredicate::from(&UserFilter::default()))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].username, "alice");
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let store = MemoryUserStore::new();
        assert!(matches!(store.get(9).await, Err(AccountError::NotFound)));
    }
}
