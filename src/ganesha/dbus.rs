//! Blocking D-Bus client for the `org.ganesha.nfsd` management interface.
//!
//! The connection is opened once and reused for the process lifetime. There
//! is no pooling, retry, or reconnect: a severed connection surfaces as a
//! collection fault on the next scrape.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use dbus::blocking::Connection;
use dbus::blocking::Proxy;

use crate::error::{Error, Result};
use crate::ganesha::{BasicStats, Client, Export, IoCounters, StatsSource};

const BUS_NAME: &str = "org.ganesha.nfsd";
const EXPORT_MGR_PATH: &str = "/org/ganesha/nfsd/ExportMgr";
const EXPORT_MGR_INTERFACE: &str = "org.ganesha.nfsd.exportmgr";
const EXPORT_STATS_INTERFACE: &str = "org.ganesha.nfsd.exportstats";
const CLIENT_MGR_PATH: &str = "/org/ganesha/nfsd/ClientMgr";
const CLIENT_MGR_INTERFACE: &str = "org.ganesha.nfsd.clientmgr";
const CLIENT_STATS_INTERFACE: &str = "org.ganesha.nfsd.clientstats";

// libdbus caps call timeouts at i32::MAX milliseconds; use that cap so a
// slow daemon stalls the scrape rather than producing a local timeout.
const CALL_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Ganesha timestamp struct `(tt)`. Not consumed, only decoded.
type Timestamp = (u64, u64);

/// `ShowExports` row: id, path, per-protocol activity flags, last-time.
type ExportRow = (
    u16,
    String,
    bool, // NFSv3
    bool, // MNT
    bool, // NLM4
    bool, // RQUOTA
    bool, // NFSv4.0
    bool, // NFSv4.1
    bool, // NFSv4.2
    bool, // 9P
    Timestamp,
);

/// `ShowClients` row: address, per-protocol activity flags, last-time.
type ClientRow = (
    String,
    bool, // NFSv3
    bool, // MNT
    bool, // NLM4
    bool, // RQUOTA
    bool, // NFSv4.0
    bool, // NFSv4.1
    bool, // NFSv4.2
    bool, // 9P
    Timestamp,
);

/// Read/write counter block `(tttttt)` as returned by `GetNFSv41IO`.
type IoRow = (u64, u64, u64, u64, u64, u64);

/// `StatsSource` backed by the system bus.
pub struct DbusStatsSource {
    // The libdbus channel is not Sync; serialize calls across scrapes.
    connection: Mutex<Connection>,
}

impl DbusStatsSource {
    /// Connect to the system bus. Called once at startup.
    pub fn connect() -> Result<Self> {
        let connection = Connection::new_system()?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn with_proxy<T>(
        &self,
        path: &'static str,
        call: impl FnOnce(Proxy<'_, &Connection>) -> Result<T>,
    ) -> Result<T> {
        let connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        call(connection.with_proxy(BUS_NAME, path, CALL_TIMEOUT))
    }
}

impl StatsSource for DbusStatsSource {
    fn exports(&self) -> Result<Vec<Export>> {
        let (_, rows): (Timestamp, Vec<ExportRow>) = self.with_proxy(EXPORT_MGR_PATH, |proxy| {
            proxy
                .method_call(EXPORT_MGR_INTERFACE, "ShowExports", ())
                .map_err(Error::from)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| Export {
                export_id: row.0,
                path: row.1,
                nfsv40: row.6,
                nfsv41: row.7,
                nfsv42: row.8,
            })
            .collect())
    }

    fn clients(&self) -> Result<Vec<Client>> {
        let (_, rows): (Timestamp, Vec<ClientRow>) = self.with_proxy(CLIENT_MGR_PATH, |proxy| {
            proxy
                .method_call(CLIENT_MGR_INTERFACE, "ShowClients", ())
                .map_err(Error::from)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| Client {
                address: row.0,
                nfsv40: row.5,
                nfsv41: row.6,
                nfsv42: row.7,
            })
            .collect())
    }

    fn export_v41_io(&self, export_id: u16) -> Result<BasicStats> {
        let reply = self.with_proxy(EXPORT_MGR_PATH, |proxy| {
            proxy
                .method_call(EXPORT_STATS_INTERFACE, "GetNFSv41IO", (export_id,))
                .map_err(Error::from)
        })?;
        stats_from_reply(reply)
    }

    fn client_v41_io(&self, client_address: &str) -> Result<BasicStats> {
        let reply = self.with_proxy(CLIENT_MGR_PATH, |proxy| {
            proxy
                .method_call(CLIENT_STATS_INTERFACE, "GetNFSv41IO", (client_address,))
                .map_err(Error::from)
        })?;
        stats_from_reply(reply)
    }
}

/// `GetNFSv41IO` replies lead with a status flag and message; a false
/// status means the daemon could not produce the counters.
fn stats_from_reply(
    (status, message, _time, read, write): (bool, String, Timestamp, IoRow, IoRow),
) -> Result<BasicStats> {
    if !status {
        return Err(Error::Ganesha(message));
    }
    Ok(BasicStats {
        read: counters_from_row(read),
        write: counters_from_row(write),
    })
}

fn counters_from_row((requested, transferred, total, errors, latency, queue_wait): IoRow) -> IoCounters {
    IoCounters {
        requested,
        transferred,
        total,
        errors,
        latency,
        queue_wait,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_status_maps_to_ganesha_error() {
        let reply = (
            false,
            "export does not exist".to_string(),
            (0, 0),
            (0, 0, 0, 0, 0, 0),
            (0, 0, 0, 0, 0, 0),
        );
        let error = stats_from_reply(reply).unwrap_err();
        assert!(matches!(error, Error::Ganesha(message) if message == "export does not exist"));
    }

    #[test]
    fn counters_decode_in_declaration_order() {
        let reply = (
            true,
            String::new(),
            (0, 0),
            (1, 2, 3, 4, 5, 6),
            (7, 8, 9, 10, 11, 12),
        );
        let stats = stats_from_reply(reply).unwrap();
        assert_eq!(stats.read.requested, 1);
        assert_eq!(stats.read.queue_wait, 6);
        assert_eq!(stats.write.requested, 7);
        assert_eq!(stats.write.queue_wait, 12);
    }
}
