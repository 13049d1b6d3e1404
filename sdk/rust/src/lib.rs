//! Client for the net-failover control API.

pub mod client;

pub use client::{FailoverClient, ForceGatewayResponse, InterfaceStatus};
