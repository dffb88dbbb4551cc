//! Crate-wide error type.
//!
//! Collection faults are never recovered inside a collector; they travel as
//! `Err` values up to the scrape handler, which translates them into a JSON
//! error response for that one scrape.

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The D-Bus call to the ganesha daemon failed at the transport level.
    #[error("dbus call to ganesha failed: {0}")]
    Dbus(#[from] dbus::Error),

    /// Ganesha answered the call but flagged the reply as failed.
    #[error("ganesha reported an error: {0}")]
    Ganesha(String),

    /// Registry or exposition-encoding failure from the prometheus crate.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics exposition is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
