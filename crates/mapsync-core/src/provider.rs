// crates/mapsync-core/src/provider.rs
#![cfg(feature = "runtime")]

use crate::config::SuggestOptions;
use crate::error::{Result, SearchError};
use crate::model::{LocationFeature, Suggestion};
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The two remote operations of a geocoding provider.
///
/// Implementations must resolve to [`SearchError::Cancelled`] once `cancel`
/// fires, whatever the state of the underlying request.
pub trait GeocodingProvider: Send + Sync + 'static {
    /// Suggestions for a non-empty query.
    fn suggest(
        &self,
        query: String,
        options: SuggestOptions,
        cancel: CancellationToken,
    ) -> ProviderFuture<'_, Vec<Suggestion>>;

    /// Full detail for a suggestion id. Zero features is `Ok(vec![])`.
    fn retrieve(
        &self,
        id: String,
        cancel: Option<CancellationToken>,
    ) -> ProviderFuture<'_, Vec<LocationFeature>>;
}

/// Run `fut` until it completes or `cancel` fires, whichever is first.
pub async fn cancellable<T, F>(cancel: Option<&CancellationToken>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(SearchError::Cancelled),
                out = fut => out,
            }
        }
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn cancel_wins_over_slow_future() {
        let token = CancellationToken::new();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, SearchError>(1)
        };
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        assert_eq!(cancellable(Some(&token), slow).await, Err(SearchError::Cancelled));
    }

    #[tokio::test]
    async fn already_cancelled_never_polls() {
        let token = CancellationToken::new();
        token.cancel();
        let out = cancellable(Some(&token), async { Ok::<_, SearchError>(1) }).await;
        assert!(out.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn without_token_runs_to_completion() {
        assert_eq!(cancellable(None, async { Ok::<_, SearchError>(7) }).await, Ok(7));
    }
}
