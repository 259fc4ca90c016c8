//! # Keylight Control Library
//!
//! `keylight-control-lib` is a Rust library for discovering and controlling
//! Elgato Key Light accessories. It locates accessories advertising the
//! `_elg._tcp` service on the local network, and reads or atomically
//! rewrites their power, brightness, and temperature state over the
//! accessories' small HTTP control protocol.
//!
//! This library is designed to be used by command-line tools or other
//! client applications that need to drive Key Light hardware.
//!
//! ## Features
//!
//! - Bounded-time, cancellable mDNS discovery with a name-matching policy
//!   that stops early once every requested light has been found
//! - Direct `host:port` addressing that bypasses the discovery window
//! - Read-modify-write light control with multi-device stop-on-first-error
//!   semantics
//!
//! ## Example
//!
//! Here is a simple example of how to use the library to discover Key
//! Lights on your network:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use keylight_control_lib::errors::Error;
//! use keylight_control_lib::operations;
//! use keylight_control_lib::util::discovery::{Discovery, MdnsDiscovery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let new_discovery = || -> Result<Box<dyn Discovery>, Error> {
//!         Ok(Box::new(MdnsDiscovery::new()?))
//!     };
//!
//!     // Discover accessories with a 5-second window
//!     let devices = operations::discover_lights(new_discovery, Duration::from_secs(5)).await?;
//!
//!     for device in devices {
//!         println!("Found accessory: {device}");
//!     }
//!
//!     Ok(())
//! }
//! ```

// The `control_interface` module provides the HTTP interface for
// communicating with a single accessory. It includes methods for fetching
// and replacing light groups, and for querying accessory metadata and
// settings.
pub mod control_interface;

// The `errors` module defines the error taxonomy shared across the
// library: transport setup/run failures, unmet discovery requirements,
// malformed addresses, and control-protocol failures.
pub mod errors;

// The `operations` module composes discovery, address resolution, and the
// control interface into the user-facing discover, describe, and switch
// operations.
pub mod operations;

// The `util` module provides the discovery transport seam and coordinator,
// and the classification of caller-supplied light identifiers.
pub mod util;
