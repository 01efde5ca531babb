//! HTTP handlers.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLBatchRequest, GraphQLResponse};
use axum::{extract::State, response::Html};

use crate::auth::Identity;
use crate::db;
use crate::error::ApiResult;
use crate::AppState;

/// Execute GraphQL requests from either transport (GET query string or POST body).
///
/// The caller's identity, when the middleware resolved one, is attached to
/// every request in the batch.
pub async fn graphql_handler(
    State(state): State<AppState>,
    identity: Option<Identity>,
    request: GraphQLBatchRequest,
) -> GraphQLResponse {
    let mut request = request.into_inner();
    if let Some(identity) = identity {
        request = request.data(identity);
    }

    state.schema.execute_batch(request).await.into()
}

pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/query").finish())
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<&'static str> {
    db::ping(&state.pool).await?;
    Ok("ok")
}
