//! Data model and access trait for the ganesha management interface.
//!
//! Everything here is a point-in-time snapshot: exports, clients, and their
//! I/O counters are fetched fresh on every scrape and discarded afterwards.
//! The daemon owns counter monotonicity; this crate never accumulates.

pub mod dbus;

use crate::error::Result;

/// One filesystem path exported by the daemon.
#[derive(Debug, Clone)]
pub struct Export {
    pub export_id: u16,
    pub path: String,
    /// Decoded for completeness; only the v4.1 flag drives collection.
    #[allow(dead_code)]
    pub nfsv40: bool,
    pub nfsv41: bool,
    #[allow(dead_code)]
    pub nfsv42: bool,
}

/// One remote peer currently connected to the daemon.
#[derive(Debug, Clone)]
pub struct Client {
    /// Used verbatim as the `clientip` label value, no normalization.
    pub address: String,
    /// Decoded for completeness; only the v4.1 flag drives collection.
    #[allow(dead_code)]
    pub nfsv40: bool,
    pub nfsv41: bool,
    #[allow(dead_code)]
    pub nfsv42: bool,
}

/// I/O counters for one direction (read or write).
///
/// `latency` and `queue_wait` are cumulative nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub requested: u64,
    pub transferred: u64,
    pub total: u64,
    pub errors: u64,
    pub latency: u64,
    pub queue_wait: u64,
}

/// Per-entity I/O counter snapshot. `Default` is the all-zero record used
/// for enumerated entities that do not have the protocol version active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicStats {
    pub read: IoCounters,
    pub write: IoCounters,
}

/// The seam to the daemon's management interface.
///
/// Implementations are shared read-only across concurrent scrapes; every
/// operation is synchronous, read-only on the daemon, and may fail.
pub trait StatsSource: Send + Sync {
    fn exports(&self) -> Result<Vec<Export>>;

    fn clients(&self) -> Result<Vec<Client>>;

    fn export_v41_io(&self, export_id: u16) -> Result<BasicStats>;

    fn client_v41_io(&self, client_address: &str) -> Result<BasicStats>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::Error;

    /// In-memory stats source for collector and handler tests.
    #[derive(Default)]
    pub struct MockSource {
        pub exports: Vec<Export>,
        pub clients: Vec<Client>,
        pub stats: BasicStats,
        pub fail_enumerate: bool,
        pub fail_io: bool,
    }

    impl MockSource {
        pub fn failing() -> Self {
            Self {
                fail_enumerate: true,
                ..Self::default()
            }
        }
    }

    impl StatsSource for MockSource {
        fn exports(&self) -> Result<Vec<Export>> {
            if self.fail_enumerate {
                return Err(Error::Ganesha("export enumeration failed".into()));
            }
            Ok(self.exports.clone())
        }

        fn clients(&self) -> Result<Vec<Client>> {
            if self.fail_enumerate {
                return Err(Error::Ganesha("client enumeration failed".into()));
            }
            Ok(self.clients.clone())
        }

        fn export_v41_io(&self, _export_id: u16) -> Result<BasicStats> {
            if self.fail_io {
                return Err(Error::Ganesha("stat fetch failed".into()));
            }
            Ok(self.stats)
        }

        fn client_v41_io(&self, _client_address: &str) -> Result<BasicStats> {
            if self.fail_io {
                return Err(Error::Ganesha("stat fetch failed".into()));
            }
            Ok(self.stats)
        }
    }
}
