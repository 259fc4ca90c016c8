use reqwest::StatusCode;

use crate::util::discovery::Device;

/// All error types that can occur while discovering or controlling lights.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The discovery transport could not be initialized.
    #[error("failed to set up mDNS discovery: {0}")]
    TransportSetup(String),

    /// The browse loop failed while running. Any results collected before
    /// the failure are discarded.
    #[error("discovery browse failed: {0}")]
    TransportRun(String),

    /// A required light name matched none of the accessories discovered
    /// before the deadline.
    #[error("no light found for requirement '{0}'")]
    RequirementNotMet(String),

    /// Resolution produced an empty target set.
    #[error("found no matching lights")]
    NoMatchingDevices,

    /// An explicit `host:port` identifier had an unparseable port.
    #[error("failed to parse port from light address '{identifier}'")]
    MalformedAddress { identifier: String },

    /// An HTTP exchange with a light failed.
    #[error("request to light ({device}) failed: {source}")]
    Http {
        device: String,
        #[source]
        source: reqwest::Error,
    },

    /// A light answered with a non-success status code.
    #[error("light ({device}) answered with status {status}")]
    UnexpectedStatus { device: String, status: StatusCode },
}

impl Error {
    /// Create a new HTTP error for the given device
    pub fn http(device: &Device, source: reqwest::Error) -> Self {
        Error::Http {
            device: device.label(),
            source,
        }
    }

    /// Create a new unexpected status error for the given device
    pub fn unexpected_status(device: &Device, status: StatusCode) -> Self {
        Error::UnexpectedStatus {
            device: device.label(),
            status,
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
