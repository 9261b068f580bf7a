use anyhow::Result;
use std::future::Future;

use crate::model::Id;

/// Run a resolver only when its query parameter is present.
///
/// Listing handlers join several of these with `tokio::try_join!`: the resolvers are
/// independent of each other, and the first failure fails the whole request.
pub async fn resolve_if_present<T, F, Fut>(value: Option<T>, resolve: F) -> Result<Option<Vec<Id>>>
where
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<Vec<Id>>>,
{
    match value {
        Some(value) => resolve(value).await.map(Some),
        None => Ok(None),
    }
}
