use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::Result;

/// Gets new access tokens.
#[async_trait]
pub trait TokenProvider: Sync + Send {
    type Token: Sync + Send;

    async fn fetch_token(&self) -> Result<Self::Token>;

    fn is_elapsed(token: &Self::Token) -> bool;
}

/// Holds the current access token and replaces it once it expires
/// or once the api stops accepting it.
pub struct TokenCache<P: TokenProvider> {
    provider: P,
    token: Mutex<Arc<P::Token>>,
}

impl<P: TokenProvider> TokenCache<P> {
    pub async fn new(provider: P) -> Result<Self> {
        let token = provider.fetch_token().await?;
        Ok(TokenCache {
            provider,
            token: Mutex::new(Arc::new(token)),
        })
    }

    pub async fn current(&self) -> Result<Arc<P::Token>> {
        let mut token = self.token.lock().await;
        if P::is_elapsed(&token) {
            log::info!("Access token expired, getting a new one");
            *token = Arc::new(self.provider.fetch_token().await?);
        }
        Ok(token.clone())
    }

    async fn renew(&self) -> Result<Arc<P::Token>> {
        let mut token = self.token.lock().await;
        *token = Arc::new(self.provider.fetch_token().await?);
        Ok(token.clone())
    }

    /// Run `call` with a valid token. When `is_unauthorized` says the
    /// token was rejected, get a new one and run `call` once more.
    /// The outer error is about getting a token, the inner one is `call`'s.
    pub async fn authorized<T, E, F, Fut, U>(
        &self,
        mut call: F,
        is_unauthorized: U,
    ) -> Result<std::result::Result<T, E>>
    where
        F: FnMut(Arc<P::Token>) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        U: Fn(&E) -> bool,
    {
        let token = self.current().await?;
        match call(token).await {
            Err(err) if is_unauthorized(&err) => {
                log::warn!("Access token rejected, getting a new one");
                let token = self.renew().await?;
                Ok(call(token).await)
            }
            res => Ok(res),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::Error;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FakeToken {
        serial: usize,
        elapsed: bool,
    }

    /// Hands out tokens with increasing serials. The first `elapsed`
    /// tokens are already expired.
    #[derive(Default)]
    struct FakeProvider {
        fetched: AtomicUsize,
        elapsed: usize,
        failing: bool,
    }

    #[async_trait]
    impl TokenProvider for FakeProvider {
        type Token = FakeToken;

        async fn fetch_token(&self) -> Result<FakeToken> {
            let serial = self.fetched.fetch_add(1, Ordering::SeqCst);
            if self.failing && serial > 0 {
                return Err(Error::auth("invalid client", "Cannot get token"));
            }
            Ok(FakeToken {
                serial,
                elapsed: serial < self.elapsed,
            })
        }

        fn is_elapsed(token: &FakeToken) -> bool {
            token.elapsed
        }
    }

    #[derive(Debug, PartialEq)]
    enum CallError {
        Unauthorized,
        Other,
    }

    fn unauthorized(err: &CallError) -> bool {
        *err == CallError::Unauthorized
    }

    #[tokio::test]
    async fn test_token_reused() {
        let cache = TokenCache::new(FakeProvider::default()).await.unwrap();
        assert_eq!(cache.current().await.unwrap().serial, 0);
        assert_eq!(cache.current().await.unwrap().serial, 0);
        assert_eq!(cache.provider.fetched.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_elapsed_token_renewed() {
        let provider = FakeProvider {
            elapsed: 1,
            ..FakeProvider::default()
        };
        let cache = TokenCache::new(provider).await.unwrap();
        assert_eq!(cache.current().await.unwrap().serial, 1, "first one expired");
        assert_eq!(cache.current().await.unwrap().serial, 1);
    }

    #[tokio::test]
    async fn test_rejected_token_renewed_and_retried() {
        let cache = TokenCache::new(FakeProvider::default()).await.unwrap();

        let mut seen = Vec::new();
        let res = cache
            .authorized(
                |token| {
                    seen.push(token.serial);
                    let serial = token.serial;
                    async move {
                        if serial == 0 {
                            Err(CallError::Unauthorized)
                        } else {
                            Ok(serial)
                        }
                    }
                },
                unauthorized,
            )
            .await
            .unwrap();

        assert_eq!(res, Ok(1));
        assert_eq!(seen, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_retried_once_only() {
        let cache = TokenCache::new(FakeProvider::default()).await.unwrap();

        let mut calls = 0;
        let res = cache
            .authorized(
                |_token| {
                    calls += 1;
                    async { Err::<(), _>(CallError::Unauthorized) }
                },
                unauthorized,
            )
            .await
            .unwrap();

        assert_eq!(res, Err(CallError::Unauthorized));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_other_errors_not_retried() {
        let cache = TokenCache::new(FakeProvider::default()).await.unwrap();

        let mut calls = 0;
        let res = cache
            .authorized(
                |_token| {
                    calls += 1;
                    async { Err::<(), _>(CallError::Other) }
                },
                unauthorized,
            )
            .await
            .unwrap();

        assert_eq!(res, Err(CallError::Other));
        assert_eq!(calls, 1);
        assert_eq!(cache.provider.fetched.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_renewal_failure_reported() {
        let provider = FakeProvider {
            failing: true,
            ..FakeProvider::default()
        };
        let cache = TokenCache::new(provider).await.unwrap();

        let res = cache
            .authorized(
                |_token| async { Err::<(), _>(CallError::Unauthorized) },
                unauthorized,
            )
            .await;
        assert!(matches!(res, Err(Error::Auth { .. })));
    }
}
