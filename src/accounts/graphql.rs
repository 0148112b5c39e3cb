use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, Interface, Object, Result, SimpleObject, ID};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::auth::extractors::Caller;

use super::{
    filter::UserFilter,
    global_id::{self, USER_TYPE},
    model::UserRecord,
    patch::UserPatch,
    services::{self, CreateUserInput},
    store::UserStore,
};

/// Public view of a user. Password and staff/superuser flags are not exposed.
#[derive(Clone)]
pub struct User(UserRecord);

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self(record)
    }
}

/// Relay object identification. Every node carries an opaque global `id`.
#[derive(Interface)]
#[graphql(field(name = "id", ty = "ID"))]
pub enum Node {
    User(User),
}

fn rfc3339(at: OffsetDateTime) -> Option<String> {
    at.format(&Rfc3339).ok()
}

#[Object]
impl User {
    /// The ID of the object.
    async fn id(&self) -> ID {
        ID(global_id::encode(USER_TYPE, self.0.id))
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn first_name(&self) -> &str {
        &self.0.first_name
    }

    async fn last_name(&self) -> &str {
        &self.0.last_name
    }

    /// Whether this account may log in.
    async fn is_active(&self) -> bool {
        self.0.is_active
    }

    async fn last_login(&self) -> Option<String> {
        self.0.last_login.and_then(rfc3339)
    }

    async fn date_joined(&self) -> Option<String> {
        rfc3339(self.0.date_joined)
    }
}

#[derive(SimpleObject)]
pub struct CreateUser {
    ok: bool,
    user: User,
}

#[derive(SimpleObject)]
pub struct UpdateUser {
    ok: bool,
    user: User,
}

fn store<'a>(ctx: &Context<'a>) -> Result<&'a Arc<dyn UserStore>> {
    ctx.data::<Arc<dyn UserStore>>()
}

#[derive(Default)]
pub struct AccountQuery;

#[Object]
impl AccountQuery {
    /// The authenticated caller, or null.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let caller = ctx.data_opt::<Caller>().copied().unwrap_or_default();
        let user = services::current_user(store(ctx)?.as_ref(), caller)
            .await
            .map_err(|e| e.extend())?;
        Ok(user.map(User::from))
    }

    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<User> {
        let pk = global_id::decode_user(&id).map_err(|e| e.extend())?;
        let user = services::get_user(store(ctx)?.as_ref(), pk)
            .await
            .map_err(|e| e.extend())?;
        Ok(user.into())
    }

    /// User list.
    async fn users(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Username substring, case-insensitive")] username: Option<String>,
        #[graphql(desc = "Account status, enabled or disabled")] is_active: Option<bool>,
    ) -> Result<Vec<User>> {
        let filter = UserFilter {
            username,
            is_active,
        };
        let users = services::list_users(store(ctx)?.as_ref(), &filter)
            .await
            .map_err(|e| e.extend())?;
        Ok(users.into_iter().map(User::from).collect())
    }
}

#[derive(Default)]
pub struct AccountMutation;

#[Object]
impl AccountMutation {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        username: Option<String>,
        password: Option<String>,
        email: Option<String>,
    ) -> Result<CreateUser> {
        let input = CreateUserInput {
            username,
            password,
            email,
        };
        let user = services::create_user(store(ctx)?.as_ref(), input)
            .await
            .map_err(|e| e.extend())?;
        Ok(CreateUser {
            ok: true,
            user: user.into(),
        })
    }

    async fn update_user(
        &self,
        ctx: &Context<'_>,
        id: ID,
        username: Option<String>,
        password: Option<String>,
        is_active: Option<bool>,
        email: Option<String>,
    ) -> Result<UpdateUser> {
        let pk = global_id::decode_user(&id).map_err(|e| e.extend())?;
        let patch = UserPatch {
            username,
            email,
            is_active,
            password,
        };
        let user = services::update_user(store(ctx)?.as_ref(), pk, patch)
            .await
            .map_err(|e| e.extend())?;
        Ok(UpdateUser {
            ok: true,
            user: user.into(),
        })
    }
}
