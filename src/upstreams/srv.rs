//! Upstreams from SRV lookups.

use super::{
    with_deadline, Error, ProvisionError, Replacer, Upstream, UpstreamCache, UpstreamSource,
    Verbatim, DEFAULT_REFRESH,
};
use crate::{
    resolver::{SrvAnswer, SrvResolver},
    SrvRecord,
};
use async_trait::async_trait;
use http::request::Parts;
use std::{fmt, sync::Arc, time::Duration};

/// Configuration of a [`SrvUpstreams`] source.
///
/// The domain to look up is either given by its parts, forming the standard
/// `_service._proto.name` domain, or given whole in `name` by leaving
/// `service` and `proto` empty. See RFC 2782.
///
/// Every label may contain placeholders, expanded per request by the
/// source's [`Replacer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct SrvConfig {
    /// The interval at which to refresh the SRV lookup.
    /// Results are cached between lookups. Default: 1m
    pub refresh: Option<Duration>,

    /// The service label.
    pub service: String,

    /// The protocol label; either tcp or udp.
    pub proto: String,

    /// The name label; or, if service and proto are empty, the entire domain
    /// name to look up.
    pub name: String,
}

impl SrvConfig {
    /// Creates a configuration for the domain `_service._proto.name`.
    pub fn new(service: impl ToString, proto: impl ToString, name: impl ToString) -> Self {
        Self {
            service: service.to_string(),
            proto: proto.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Creates a configuration looking up `domain` as is.
    pub fn domain(domain: impl ToString) -> Self {
        Self {
            name: domain.to_string(),
            ..Default::default()
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

/// Formats the RFC 2782 representation of the SRV domain.
impl fmt::Display for SrvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&srv_name(&self.service, &self.proto, &self.name))
    }
}

/// Builds the domain to query for SRV records.
fn srv_name(service: &str, proto: &str, name: &str) -> String {
    if service.is_empty() && proto.is_empty() {
        name.to_owned()
    } else {
        format!("_{service}._{proto}.{name}")
    }
}

/// Provides upstreams from SRV lookups.
///
/// Lookups are cached and refreshed at the configured refresh interval.
/// Upstreams keep the order the resolver gives their records in, which is
/// by priority and weight.
pub struct SrvUpstreams<Resolver> {
    service: String,
    proto: String,
    name: String,
    refresh: Duration,
    resolver: Resolver,
    cache: Arc<UpstreamCache>,
    replacer: Arc<dyn Replacer>,
}

impl<Resolver> SrvUpstreams<Resolver> {
    /// Validates `config` and creates a source looking it up with `resolver`.
    pub fn provision(config: SrvConfig, resolver: Resolver) -> Result<Self, ProvisionError> {
        let direct = config.service.is_empty() && config.proto.is_empty();
        if !direct && config.proto != "tcp" && config.proto != "udp" {
            return Err(ProvisionError::InvalidProto(config.proto));
        }

        Ok(Self {
            service: config.service,
            proto: config.proto,
            name: config.name,
            refresh: config.refresh.unwrap_or(DEFAULT_REFRESH),
            resolver,
            cache: Default::default(),
            replacer: Arc::new(Verbatim),
        })
    }

    /// Sets the cache of the source, to share it with other SRV sources.
    pub fn cache(self, cache: Arc<UpstreamCache>) -> Self {
        Self { cache, ..self }
    }

    /// Sets the replacer expanding the source's labels.
    pub fn replacer(self, replacer: impl Replacer + 'static) -> Self {
        Self {
            replacer: Arc::new(replacer),
            ..self
        }
    }

    /// Sets the resolver of the source.
    pub fn resolver<R>(self, resolver: R) -> SrvUpstreams<R> {
        SrvUpstreams {
            resolver,
            service: self.service,
            proto: self.proto,
            name: self.name,
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

impl<Resolver> fmt::Display for SrvUpstreams<Resolver> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&srv_name(&self.service, &self.proto, &self.name))
    }
}

impl<Resolver: fmt::Debug> fmt::Debug for SrvUpstreams<Resolver> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrvUpstreams")
            .field("service", &self.service)
            .field("proto", &self.proto)
            .field("name", &self.name)
            .field("refresh", &self.refresh)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl<Resolver: SrvResolver> SrvUpstreams<Resolver> {
    /// Looks up `srv` and turns its records into upstreams.
    async fn lookup(&self, srv: &str) -> Result<Vec<Upstream>, Error<Resolver::Error>> {
        let SrvAnswer { records, error } = self.resolver.get_srv_records(srv).await;

        if let Some(e) = error {
            // Some records may have been filtered out with the rest still
            // usable; only fail if nothing is left.
            if records.is_empty() {
                return Err(Error::Lookup(e));
            }
            #[cfg(feature = "log")]
            tracing::warn!(error = %e, srv, "SRV records filtered");
        }
        if records.is_empty() {
            return Err(Error::NoUpstreams(srv.to_owned()));
        }

        Ok(records
            .iter()
            .map(|record| {
                #[cfg(feature = "log")]
                tracing::debug!(
                    host = %record.target(),
                    port = record.port(),
                    priority = record.priority(),
                    weight = record.weight(),
                    "discovered SRV record"
                );
                Upstream::new(record.dial_address())
            })
            .collect())
    }
}

#[async_trait]
impl<Resolver: SrvResolver> UpstreamSource for SrvUpstreams<Resolver> {
    type Error = Resolver::Error;

    async fn get_upstreams(&self, request: &Parts) -> Result<Arc<[Upstream]>, Error<Self::Error>> {
        let service = self.replacer.replace_all(&self.service, request);
        let proto = self.replacer.replace_all(&self.proto, request);
        let name = self.replacer.replace_all(&self.name, request);
        let srv = srv_name(&service, &proto, &name);

        self.cache
            .get(&srv, self.refresh, || {
                #[cfg(feature = "log")]
                tracing::debug!(%service, %proto, %name, "refreshing SRV upstreams");
                with_deadline(request, self.lookup(&srv))
            })
            .await
    }
}
