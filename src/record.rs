//! SRV records.

use rand::Rng;
use std::{cmp::Reverse, fmt::Display};

/// Representation of types that contain the fields of a SRV record.
pub trait SrvRecord {
    /// Type representing the SRV record's target. Must implement `Display` so
    /// it can be joined with the port into a dial address.
    type Target: Display + ?Sized;

    /// Gets a SRV record's target.
    fn target(&self) -> &Self::Target;

    /// Gets a SRV record's port.
    fn port(&self) -> u16;

    /// Gets a SRV record's priority.
    fn priority(&self) -> u16;

    /// Gets a SRV record's weight.
    fn weight(&self) -> u16;

    /// Joins a SRV record's target and port into a `host:port` dial address.
    fn dial_address(&self) -> String {
        join_host_port(&self.target().to_string(), &self.port().to_string())
    }

    /// Generates a key to sort a SRV record by priority and weight per RFC 2782.
    fn sort_key(&self, rng: impl Rng) -> (u16, Reverse<u32>) {
        sort_key(self.priority(), self.weight(), rng)
    }
}

/// Generates a key to sort a SRV record by priority and weight per RFC 2782.
pub(crate) fn sort_key(priority: u16, weight: u16, mut rng: impl Rng) -> (u16, Reverse<u32>) {
    // Sort ascending by priority, then descending (hence `Reverse`) by randomized weight
    let rand = rng.random::<u16>() as u32;
    (priority, Reverse(weight as u32 * rand))
}

/// Combines a host and a port into an address of the form `host:port`.
///
/// Hosts containing a colon (IPv6 literals) are enclosed in square brackets,
/// giving `[host]:port`.
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        target: &'static str,
        port: u16,
        priority: u16,
    }

    impl SrvRecord for Record {
        type Target = str;

        fn target(&self) -> &str {
            self.target
        }

        fn port(&self) -> u16 {
            self.port
        }

        fn priority(&self) -> u16 {
            self.priority
        }

        fn weight(&self) -> u16 {
            0
        }
    }

    #[test]
    fn joins_names_and_ipv4() {
        assert_eq!(join_host_port("example.com", "80"), "example.com:80");
        assert_eq!(join_host_port("10.0.0.1", "9000"), "10.0.0.1:9000");
    }

    #[test]
    fn brackets_ipv6() {
        assert_eq!(join_host_port("::1", "443"), "[::1]:443");
        assert_eq!(join_host_port("fe80::1%eth0", "80"), "[fe80::1%eth0]:80");
    }

    #[test]
    fn dial_address_joins_target_once() {
        let record = Record {
            target: "a.example.com",
            port: 8080,
            priority: 10,
        };
        assert_eq!(record.dial_address(), "a.example.com:8080");
    }

    #[test]
    fn sort_key_orders_by_priority_first() {
        let mut rng = rand::rng();
        let low = Record {
            target: "a.example.com",
            port: 1,
            priority: 1,
        };
        let high = Record {
            target: "b.example.com",
            port: 1,
            priority: 2,
        };
        for _ in 0..32 {
            assert!(low.sort_key(&mut rng) < high.sort_key(&mut rng));
        }
    }
}
