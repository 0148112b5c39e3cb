use std::sync::Arc;

use async_graphql::{extensions::Tracing, EmptySubscription, MergedObject, Schema};

use crate::accounts::{
    graphql::{AccountMutation, AccountQuery, Node},
    store::UserStore,
};

#[derive(MergedObject, Default)]
pub struct Query(AccountQuery);

#[derive(MergedObject, Default)]
pub struct Mutation(AccountMutation);

pub type AppSchema = Schema<Query, Mutation, EmptySubscription>;

/// Builds the schema once at startup; the store handle is shared by every request.
pub fn build_schema(store: Arc<dyn UserStore>) -> AppSchema {
    Schema::build(Query::default(), Mutation::default(), EmptySubscription)
        .register_output_type::<Node>()
        .data(store)
        .extension(Tracing)
        .finish()
}
