#![deny(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

/*!
Dynamic upstreams for reverse proxies, resolved from DNS.

# Introduction

A reverse proxy often knows its backends only by name. This crate turns such
a name into the list of addresses to dial, either from SRV records, as
defined in [RFC 2782](https://tools.ietf.org/html/rfc2782), or from A/AAAA
records.

For instance, a DNS server might respond with the following SRV records for
`_http._tcp.example.com`:

```text
_http._tcp.example.com. 60 IN SRV 10 100 8080 a.example.com.
_http._tcp.example.com. 60 IN SRV 20 100 8081 b.example.com.
```

[`SrvUpstreams`] configured with service `http`, proto `tcp` and name
`example.com` produces the upstreams `a.example.com.:8080` and
`b.example.com.:8081`, in that order. [`AUpstreams`] does the same from the
addresses of a name, dialing each of them on a configured port.

Both are [`UpstreamSource`]s, asked for upstreams once per proxied request.
Results are kept in an [`UpstreamCache`] and only looked up again once they
are older than the source's refresh interval, so DNS latency stays off the
request path. Concurrent requests finding the same entry stale cause a
single lookup.

# Resolvers and Names

Lookups go through the [`SrvResolver`] and [`AddrResolver`] traits. The
provided backend is enabled by the following feature:

- `hickory` (via [`hickory_resolver::Resolver`])

Configured names may contain placeholders, expanded against each request by
a [`Replacer`] before lookup and before being used as cache keys.

[`SrvResolver`]: resolver::SrvResolver
[`AddrResolver`]: resolver::AddrResolver
[`SrvUpstreams`]: upstreams::srv::SrvUpstreams
[`AUpstreams`]: upstreams::a::AUpstreams
[`Replacer`]: upstreams::Replacer
*/

pub mod upstreams;
pub use upstreams::{Error, ProvisionError, Upstream, UpstreamCache, UpstreamSource};

mod record;
pub use record::{join_host_port, SrvRecord};

pub mod resolver;
