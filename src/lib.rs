//! Network failover control plane library.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod exec;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod resilience;
pub mod route;
pub mod selector;

pub use config::schema::FailoverConfig;
pub use coordinator::{Coordinator, CoordinatorHandle};
pub use error::{FailoverError, RouteError};
pub use lifecycle::{Daemon, Shutdown};
