//! Upstream sources resolved from DNS.

use async_trait::async_trait;
use http::request::Parts;
use std::{fmt, future::Future, sync::Arc};

mod cache;
pub use cache::{UpstreamCache, DEFAULT_CAPACITY};

pub mod a;
pub mod srv;

/// Refresh interval used when a source does not configure one.
pub const DEFAULT_REFRESH: std::time::Duration = std::time::Duration::from_secs(60);

/// A backend a reverse proxy may dial.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Upstream {
    /// Network address to dial, as `host:port`.
    pub dial: String,
}

impl Upstream {
    /// Creates an upstream dialing `dial`.
    pub fn new(dial: impl Into<String>) -> Self {
        Self { dial: dial.into() }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dial)
    }
}

/// Errors encountered while resolving upstreams.
#[derive(Debug, thiserror::Error)]
pub enum Error<Lookup: fmt::Debug> {
    /// DNS lookup errors
    #[error("DNS lookup error")]
    Lookup(#[source] Lookup),
    /// The caller's lookup deadline passed before DNS answered
    #[error("DNS lookup timed out")]
    Timeout,
    /// The resolver answered without any usable records
    #[error("no upstreams found for {0}")]
    NoUpstreams(String),
}

/// Errors in an upstream source's configuration.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The SRV protocol label is neither `tcp` nor `udp`
    #[error("invalid proto '{0}'")]
    InvalidProto(String),
}

/// Deadline for DNS lookups made on behalf of a request.
///
/// Insert it into the request's extensions; a refresh still running when it
/// passes fails with [`Error::Timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupDeadline(pub tokio::time::Instant);

/// Expands placeholders in configured names against the current request.
pub trait Replacer: Send + Sync {
    /// Returns `input` with every placeholder replaced.
    fn replace_all(&self, input: &str, request: &Parts) -> String;
}

impl<F> Replacer for F
where
    F: Fn(&str, &Parts) -> String + Send + Sync,
{
    fn replace_all(&self, input: &str, request: &Parts) -> String {
        self(input, request)
    }
}

/// A [`Replacer`] leaving names as configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Replacer for Verbatim {
    fn replace_all(&self, input: &str, _: &Parts) -> String {
        input.to_owned()
    }
}

/// A source of upstreams for a request.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Errors produced by the underlying resolver.
    type Error: fmt::Debug;

    /// Gets the upstreams to use for `request`, in preference order.
    ///
    /// The returned list is shared with the cache and other callers.
    async fn get_upstreams(&self, request: &Parts) -> Result<Arc<[Upstream]>, Error<Self::Error>>;
}

/// Runs `lookup`, failing with [`Error::Timeout`] if the request carries a
/// [`LookupDeadline`] that passes first.
pub(crate) async fn with_deadline<T, E, Fut>(request: &Parts, lookup: Fut) -> Result<T, Error<E>>
where
    E: fmt::Debug,
    Fut: Future<Output = Result<T, Error<E>>>,
{
    match request.extensions.get::<LookupDeadline>() {
        Some(LookupDeadline(deadline)) => tokio::time::timeout_at(*deadline, lookup)
            .await
            .unwrap_or(Err(Error::Timeout)),
        None => lookup.await,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use http::Request;

    pub(crate) fn request() -> Parts {
        Request::new(()).into_parts().0
    }

    #[test]
    fn verbatim_keeps_input() {
        assert_eq!(Verbatim.replace_all("{host}.svc", &request()), "{host}.svc");
    }

    #[test]
    fn closures_are_replacers() {
        let (parts, _) = Request::builder()
            .uri("http://tenant-a.example.com/")
            .body(())
            .unwrap()
            .into_parts();
        let replacer = |input: &str, request: &Parts| {
            input.replace("{host}", request.uri.host().unwrap_or_default())
        };
        assert_eq!(
            replacer.replace_all("{host}.internal", &parts),
            "tenant-a.example.com.internal"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_times_out_lookup() {
        let mut parts = request();
        parts.extensions.insert(LookupDeadline(
            tokio::time::Instant::now() + std::time::Duration::from_secs(1),
        ));
        let result: Result<(), Error<std::io::Error>> = with_deadline(&parts, async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn no_deadline_waits_for_lookup() {
        let result: Result<u8, Error<std::io::Error>> =
            with_deadline(&request(), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
