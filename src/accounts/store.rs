use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::error::AccountError;

use super::{
    filter::UserPredicate,
    model::{NewUser, UserRecord},
};

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `NotFound` when no row has this key.
    async fn get(&self, id: i64) -> Result<UserRecord, AccountError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError>;
    async fn list(&self, predicate: &UserPredicate) -> Result<Vec<UserRecord>, AccountError>;
    async fn create(&self, user: NewUser) -> Result<UserRecord, AccountError>;
    /// Writes every mutable column of `user` in a single statement.
    async fn save(&self, user: &UserRecord) -> Result<UserRecord, AccountError>;
    async fn touch_last_login(&self, id: i64, at: OffsetDateTime) -> Result<(), AccountError>;
}

const COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                       is_active, is_staff, is_superuser, last_login, date_joined";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: i64) -> Result<UserRecord, AccountError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list(&self, predicate: &UserPredicate) -> Result<Vec<UserRecord>, AccountError> {
        let users = list_query(predicate)
            .build_query_as::<UserRecord>()
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, AccountError> {
        let created = insert_query(&user)
            .build_query_as::<UserRecord>()
            .fetch_one(&self.db)
            .await?;
        Ok(created)
    }

    async fn save(&self, user: &UserRecord) -> Result<UserRecord, AccountError> {
        let saved = update_query(user)
            .build_query_as::<UserRecord>()
            .fetch_one(&self.db)
            .await?;
        Ok(saved)
    }

    async fn touch_last_login(&self, id: i64, at: OffsetDateTime) -> Result<(), AccountError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn list_query(predicate: &UserPredicate) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users"));
    predicate.push_where(&mut qb);
    qb.push(" ORDER BY id");
    qb
}

fn insert_query(user: &NewUser) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "INSERT INTO users (username, email, password_hash, is_active, is_staff, is_superuser) ",
    );
    qb.push_values(std::iter::once(user), |mut row, u| {
        row.push_bind(u.username.clone())
            .push_bind(u.email.clone())
            .push_bind(u.password_hash.clone())
            .push_bind(u.is_active)
            .push_bind(u.is_staff)
            .push_bind(u.is_superuser);
    });
    qb.push(format!(" RETURNING {COLUMNS}"));
    qb
}

/// Every mutable column, the password hash included, goes out in one statement.
fn update_query(user: &UserRecord) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE users SET ");
    let mut set = qb.separated(", ");
    set.push("username = ").push_bind_unseparated(user.username.clone());
    set.push("email = ").push_bind_unseparated(user.email.clone());
    set.push("password_hash = ").push_bind_unseparated(user.password_hash.clone());
    set.push("first_name = ").push_bind_unseparated(user.first_name.clone());
    set.push("last_name = ").push_bind_unseparated(user.last_name.clone());
    set.push("is_active = ").push_bind_unseparated(user.is_active);
    set.push("is_staff = ").push_bind_unseparated(user.is_staff);
    set.push("is_superuser = ").push_bind_unseparated(user.is_superuser);
    set.push("last_login = ").push_bind_unseparated(user.last_login);
    qb.push(" WHERE id = ");
    qb.push_bind(user.id);
    qb.push(format!(" RETURNING {COLUMNS}"));
    qb
}
