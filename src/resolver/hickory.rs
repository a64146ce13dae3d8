//! DNS resolvers backed by [`hickory_resolver`].

use super::{AddrResolver, SrvAnswer, SrvResolver};
use crate::SrvRecord;
use async_trait::async_trait;
use hickory_resolver::{
    name_server::ConnectionProvider, proto::rr::rdata::SRV, Name, ResolveError, Resolver,
};
use std::net::IpAddr;

/// Errors produced by the hickory SRV resolver.
#[derive(Debug, thiserror::Error)]
pub enum HickoryError {
    /// The lookup itself failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Some records pointed at the root domain, which per RFC 2782 means the
    /// service is not available at that target.
    #[error("filtered {0} SRV record(s) with a root target")]
    Filtered(usize),
}

#[async_trait]
impl<P> SrvResolver for Resolver<P>
where
    P: ConnectionProvider,
{
    type Record = SRV;
    type Error = HickoryError;

    async fn get_srv_records(&self, srv: &str) -> SrvAnswer<Self::Record, Self::Error> {
        let lookup = match self.srv_lookup(srv).await {
            Ok(lookup) => lookup,
            Err(e) => return SrvAnswer::failed(e.into()),
        };

        let (mut records, unavailable): (Vec<SRV>, Vec<SRV>) =
            lookup.into_iter().partition(|record| !record.target().is_root());

        let mut rng = rand::rng();
        records.sort_by_cached_key(|record| SrvRecord::sort_key(record, &mut rng));

        SrvAnswer {
            records,
            error: (!unavailable.is_empty()).then(|| HickoryError::Filtered(unavailable.len())),
        }
    }
}

#[async_trait]
impl<P> AddrResolver for Resolver<P>
where
    P: ConnectionProvider,
{
    type Error = ResolveError;

    async fn get_ip_addrs(&self, name: &str) -> Result<Vec<IpAddr>, Self::Error> {
        Ok(self.lookup_ip(name).await?.iter().collect())
    }
}

impl SrvRecord for SRV {
    type Target = Name;

    fn target(&self) -> &Self::Target {
        self.target()
    }

    fn port(&self) -> u16 {
        self.port()
    }

    fn priority(&self) -> u16 {
        self.priority()
    }

    fn weight(&self) -> u16 {
        self.weight()
    }
}
