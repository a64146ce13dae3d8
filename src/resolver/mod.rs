//! DNS resolvers.

use crate::record::SrvRecord;
use async_trait::async_trait;
use std::{net::IpAddr, sync::Arc};

#[cfg(feature = "hickory")]
pub mod hickory;

#[cfg(test)]
pub(crate) mod mock;

/// The outcome of a SRV lookup.
///
/// A resolver may drop some records (for instance ones with invalid targets)
/// and still return the rest. In that case `records` holds the usable subset
/// and `error` describes what was dropped.
#[derive(Debug)]
pub struct SrvAnswer<Record, Error> {
    /// Usable records, in the order the resolver produced them.
    pub records: Vec<Record>,
    /// Error reported alongside `records`, if any.
    pub error: Option<Error>,
}

impl<Record, Error> SrvAnswer<Record, Error> {
    /// An answer with no error attached.
    pub fn complete(records: Vec<Record>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    /// An answer that failed outright.
    pub fn failed(error: Error) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
        }
    }
}

/// Represents the ability to act as a SRV resolver.
#[async_trait]
pub trait SrvResolver: Send + Sync {
    /// SRV record representation produced by the resolver.
    type Record: SrvRecord + Send;

    /// Errors encountered during SRV resolution.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up the records for an RFC 2782 name such as
    /// `_http._tcp.example.com`.
    ///
    /// Records must be returned lowest priority first; callers keep the
    /// order as is.
    async fn get_srv_records(&self, srv: &str) -> SrvAnswer<Self::Record, Self::Error>;
}

/// Represents the ability to resolve a name into IP addresses (A and AAAA).
#[async_trait]
pub trait AddrResolver: Send + Sync {
    /// Errors encountered during address resolution.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up the addresses of `name`, in the order the resolver returns them.
    async fn get_ip_addrs(&self, name: &str) -> Result<Vec<IpAddr>, Self::Error>;
}

#[async_trait]
impl<T: SrvResolver> SrvResolver for Arc<T> {
    type Record = T::Record;
    type Error = T::Error;

    async fn get_srv_records(&self, srv: &str) -> SrvAnswer<Self::Record, Self::Error> {
        (**self).get_srv_records(srv).await
    }
}

#[async_trait]
impl<T: AddrResolver> AddrResolver for Arc<T> {
    type Error = T::Error;

    async fn get_ip_addrs(&self, name: &str) -> Result<Vec<IpAddr>, Self::Error> {
        (**self).get_ip_addrs(name).await
    }
}
