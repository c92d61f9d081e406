//! The caller-supplied fetch capability.

use std::future::Future;

use async_trait::async_trait;

use crate::error::FetchError;

/// An asynchronous operation run against the current target on every tick.
///
/// Implementations must tolerate being called repeatedly and concurrently:
/// a slow fetch does not hold back the next tick. Any `Fn(T) -> Future`
/// closure returning `Result<(), FetchError>` implements this trait.
///
/// # Example
///
/// ```rust,ignore
/// use auto_refresh::{AutoRefresh, FetchError};
///
/// let refresh = AutoRefresh::with_interval(
///     |invoice_id: u64| async move {
///         reload_invoice(invoice_id).await.map_err(FetchError::failed)
///     },
///     Duration::from_secs(30),
/// )?;
/// ```
#[async_trait]
pub trait FetchOperation<T: Send + 'static>: Send + Sync + 'static {
    async fn fetch(&self, target: T) -> Result<(), FetchError>;
}

#[async_trait]
impl<T, F, Fut> FetchOperation<T> for F
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), FetchError>> + Send + 'static,
{
    async fn fetch(&self, target: T) -> Result<(), FetchError> {
        (self)(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct SumFetcher {
        total: AtomicU64,
    }

    #[async_trait]
    impl FetchOperation<u64> for SumFetcher {
        async fn fetch(&self, target: u64) -> Result<(), FetchError> {
            self.total.fetch_add(target, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_closure_is_fetch_operation() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let op = move |id: String| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(id);
                Ok::<_, FetchError>(())
            }
        };

        op.fetch("invoice-7".to_string()).await.unwrap();
        assert_eq!(*seen.lock(), vec!["invoice-7".to_string()]);
    }

    #[tokio::test]
    async fn test_struct_is_fetch_operation() {
        let fetcher = SumFetcher {
            total: AtomicU64::new(0),
        };
        fetcher.fetch(3).await.unwrap();
        fetcher.fetch(4).await.unwrap();
        assert_eq!(fetcher.total.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let op = |_: u32| async { Err::<(), _>(FetchError::NotFound("customer 3".to_string())) };
        let result = op.fetch(3).await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_trait_object() {
        let op: Arc<dyn FetchOperation<u8>> = Arc::new(|_: u8| async { Ok::<_, FetchError>(()) });
        assert!(op.fetch(1).await.is_ok());
    }
}
