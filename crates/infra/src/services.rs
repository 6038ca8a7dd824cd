//! Composition root for the in-process services.

use std::sync::Arc;
use std::time::Duration;

use crate::engines::{InboundEngine, OutboundEngine};
use crate::feed::ChangeFeed;
use crate::ledger::Ledger;
use crate::locks::DEFAULT_LOCK_TIMEOUT;
use crate::reporting::Reporting;
use stockyard_directory::Directory;

/// Every service wired to the same directory, ledger and change feed.
#[derive(Debug, Clone)]
pub struct Services {
    pub directory: Arc<Directory>,
    pub ledger: Arc<Ledger>,
    pub inbound: Arc<InboundEngine>,
    pub outbound: Arc<OutboundEngine>,
    pub reporting: Arc<Reporting>,
    pub feed: ChangeFeed,
}

impl Services {
    pub fn new(lock_timeout: Duration) -> Self {
        let feed = ChangeFeed::new();
        let directory = Arc::new(Directory::new());
        let ledger = Arc::new(Ledger::new(lock_timeout, feed.clone()));
        let inbound = Arc::new(InboundEngine::new(
            directory.clone(),
            ledger.clone(),
            feed.clone(),
            lock_timeout,
        ));
        let outbound = Arc::new(OutboundEngine::new(
            directory.clone(),
            ledger.clone(),
            feed.clone(),
            lock_timeout,
        ));
        let reporting = Arc::new(Reporting::new(
            directory.clone(),
            ledger.clone(),
            inbound.clone(),
            outbound.clone(),
        ));
        Self {
            directory,
            ledger,
            inbound,
            outbound,
            reporting,
            feed,
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}
