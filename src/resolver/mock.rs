//! Scripted resolver for tests.

use super::{AddrResolver, SrvAnswer, SrvResolver};
use crate::SrvRecord;
use async_trait::async_trait;
use std::{net::IpAddr, sync::Mutex, time::Duration};

#[derive(Debug, Clone)]
pub(crate) struct MockRecord {
    pub target: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
}

impl MockRecord {
    pub fn new(target: &str, port: u16, priority: u16) -> Self {
        Self {
            target: target.to_owned(),
            port,
            priority,
            weight: 0,
        }
    }
}

impl SrvRecord for MockRecord {
    type Target = str;

    fn target(&self) -> &str {
        &self.target
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn priority(&self) -> u16 {
        self.priority
    }

    fn weight(&self) -> u16 {
        self.weight
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct MockError(pub &'static str);

/// Answers every query from its current script and records the names asked for.
#[derive(Debug, Default)]
pub(crate) struct MockResolver {
    records: Mutex<Vec<MockRecord>>,
    addrs: Mutex<Vec<IpAddr>>,
    error: Mutex<Option<MockError>>,
    queries: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockResolver {
    pub fn with_records(records: Vec<MockRecord>) -> Self {
        let resolver = Self::default();
        resolver.set_records(records);
        resolver
    }

    pub fn with_addrs(addrs: &[&str]) -> Self {
        let resolver = Self::default();
        resolver.set_addrs(addrs);
        resolver
    }

    pub fn delay(self, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..self
        }
    }

    pub fn set_records(&self, records: Vec<MockRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_addrs(&self, addrs: &[&str]) {
        *self.addrs.lock().unwrap() = addrs.iter().map(|addr| addr.parse().unwrap()).collect();
    }

    pub fn set_error(&self, error: Option<&'static str>) {
        *self.error.lock().unwrap() = error.map(MockError);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    async fn answer(&self, name: &str) {
        self.queries.lock().unwrap().push(name.to_owned());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SrvResolver for MockResolver {
    type Record = MockRecord;
    type Error = MockError;

    async fn get_srv_records(&self, srv: &str) -> SrvAnswer<Self::Record, Self::Error> {
        self.answer(srv).await;
        SrvAnswer {
            records: self.records.lock().unwrap().clone(),
            error: self.error.lock().unwrap().clone(),
        }
    }
}

#[async_trait]
impl AddrResolver for MockResolver {
    type Error = MockError;

    async fn get_ip_addrs(&self, name: &str) -> Result<Vec<IpAddr>, Self::Error> {
        self.answer(name).await;
        match self.error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(self.addrs.lock().unwrap().clone()),
        }
    }
}
