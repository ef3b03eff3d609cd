//! tormgr - manage a local Tor client.
//!
//! Reconciles the `SocksPort` / `ExitNodes` directives of the torrc, gates
//! every mutating action on Tor being installed, drives the Tor service
//! through systemd, and schedules periodic identity rotation through cron.

pub mod action;
pub mod config;
pub mod countries;
pub mod error;
pub mod exec;
pub mod exit_ip;
pub mod manager;
pub mod packages;
pub mod presence;
pub mod probe;
pub mod schedule;
pub mod service;
pub mod torrc;
pub mod utils;

pub use action::Action;
pub use config::Settings;
pub use error::{Result, TorError};
pub use manager::{ConfigChange, Summary, TorManager};
