//! Upstreams from A/AAAA lookups.

use super::{
    with_deadline, Error, Replacer, Upstream, UpstreamCache, UpstreamSource, Verbatim,
    DEFAULT_REFRESH,
};
use crate::{record::join_host_port, resolver::AddrResolver};
use async_trait::async_trait;
use http::request::Parts;
use std::{fmt, sync::Arc, time::Duration};

/// Port used when an [`AConfig`] does not set one.
pub const DEFAULT_PORT: &str = "80";

/// Configuration of an [`AUpstreams`] source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct AConfig {
    /// The domain name to look up.
    pub name: String,

    /// The port to use with the upstreams. Default: 80
    pub port: Option<String>,

    /// The interval at which to refresh the lookup.
    /// Results are cached between lookups. Default: 1m
    pub refresh: Option<Duration>,
}

impl AConfig {
    /// Creates a configuration looking up `name`.
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the port to dial.
    pub fn port(self, port: impl ToString) -> Self {
        Self {
            port: Some(port.to_string()),
            ..self
        }
    }

    /// Sets the refresh interval.
    pub fn refresh(self, refresh: Duration) -> Self {
        Self {
            refresh: Some(refresh),
            ..self
        }
    }
}

/// Provides upstreams from A/AAAA lookups, dialing every address found on
/// the configured port.
///
/// Results are cached and refreshed at the configured refresh interval.
pub struct AUpstreams<Resolver> {
    name: String,
    port: String,
    refresh: Duration,
    resolver: Resolver,
    cache: Arc<UpstreamCache>,
    replacer: Arc<dyn Replacer>,
}

impl<Resolver> AUpstreams<Resolver> {
    /// Creates a source looking up `config` with `resolver`.
    pub fn provision(config: AConfig, resolver: Resolver) -> Self {
        Self {
            name: config.name,
            port: config
                .port
                .filter(|port| !port.is_empty())
                .unwrap_or_else(|| DEFAULT_PORT.to_owned()),
            refresh: config.refresh.unwrap_or(DEFAULT_REFRESH),
            resolver,
            cache: Default::default(),
            replacer: Arc::new(Verbatim),
        }
    }

    /// Sets the cache of the source, to share it with other A/AAAA sources.
    pub fn cache(self, cache: Arc<UpstreamCache>) -> Self {
        Self { cache, ..self }
    }

    /// Sets the replacer expanding the source's name and port.
    pub fn replacer(self, replacer: impl Replacer + 'static) -> Self {
        Self {
            replacer: Arc::new(replacer),
            ..self
        }
    }

    /// Sets the resolver of the source.
    pub fn resolver<R>(self, resolver: R) -> AUpstreams<R> {
        AUpstreams {
            resolver,
            name: self.name,
            port: self.port,
            refresh: self.refresh,
            cache: self.cache,
            replacer: self.replacer,
        }
    }

    /// Gets the refresh interval of the source.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }
}

impl<Resolver> fmt::Display for AUpstreams<Resolver> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<Resolver: fmt::Debug> fmt::Debug for AUpstreams<Resolver> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AUpstreams")
            .field("name", &self.name)
            .field("port", &self.port)
            .field("refresh", &self.refresh)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl<Resolver: AddrResolver> AUpstreams<Resolver> {
    async fn lookup(&self, name: &str, port: &str) -> Result<Vec<Upstream>, Error<Resolver::Error>> {
        let ips = self
            .resolver
            .get_ip_addrs(name)
            .await
            .map_err(Error::Lookup)?;
        if ips.is_empty() {
            return Err(Error::NoUpstreams(name.to_owned()));
        }

        Ok(ips
            .iter()
            .map(|ip| Upstream::new(join_host_port(&ip.to_string(), port)))
            .collect())
    }
}

#[async_trait]
impl<Resolver: AddrResolver> UpstreamSource for AUpstreams<Resolver> {
    type Error = Resolver::Error;

    async fn get_upstreams(&self, request: &Parts) -> Result<Arc<[Upstream]>, Error<Self::Error>> {
        let name = self.replacer.replace_all(&self.name, request);
        let port = self.replacer.replace_all(&self.port, request);

        self.cache
            .get(&name, self.refresh, || {
                #[cfg(feature = "log")]
                tracing::debug!(%name, %port, "refreshing A/AAAA upstreams");
                with_deadline(request, self.lookup(&name, &port))
            })
            .await
    }
}
