//! GraphQL schema glue.
//!
//! File, user and sharing resolvers live outside this crate; the schema here
//! only carries what the auth layer itself needs to expose.

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, Object, Schema, SimpleObject};
use chrono::{DateTime, Utc};

use crate::auth::{Identity, TokenService};
use crate::db::DbPool;

pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Identity of the caller for the current operation, if authenticated.
pub fn identity<'a>(ctx: &Context<'a>) -> Option<&'a Identity> {
    ctx.data_opt::<Identity>()
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn health(&self) -> &'static str {
        "ok"
    }

    /// The authenticated user id, or null for anonymous operations.
    async fn viewer(&self, ctx: &Context<'_>) -> Option<String> {
        identity(ctx).map(|id| id.as_str().to_string())
    }
}

#[derive(Debug, SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub token_expires: DateTime<Utc>,
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Exchange a still-valid token for a fresh one.
    async fn refresh_token(
        &self,
        ctx: &Context<'_>,
        token: String,
    ) -> async_graphql::Result<AuthPayload> {
        let tokens = ctx.data::<Arc<TokenService>>()?;
        let user_id = tokens.validate(&token)?;
        let issued = tokens.issue(&user_id)?;

        tracing::info!(user_id = %user_id, "Refreshed token");

        Ok(AuthPayload {
            token: issued.token,
            token_expires: issued.expires_at,
        })
    }
}

pub fn build_schema(tokens: Arc<TokenService>, pool: Option<DbPool>) -> ApiSchema {
    let builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(tokens);

    match pool {
        Some(pool) => builder.data(pool).finish(),
        None => builder.finish(),
    }
}
