//! Messages accepted by the coordinator loop.

use tokio::sync::oneshot;

use crate::coordinator::state::{InterfaceStatus, Phase};
use crate::error::FailoverError;
use crate::route::RoutingEntry;
use crate::selector::OverrideRequest;

/// A request into the serialized control loop. Each carries its reply channel.
#[derive(Debug)]
pub enum Command {
    GetDefaultGw {
        reply: oneshot::Sender<Option<String>>,
    },
    GetIfStatus {
        reply: oneshot::Sender<Vec<InterfaceStatus>>,
    },
    ForceNewGateway {
        request: OverrideRequest,
        reply: oneshot::Sender<Result<(), FailoverError>>,
    },
    GetPhase {
        reply: oneshot::Sender<Phase>,
    },
    GetRoutes {
        reply: oneshot::Sender<Vec<RoutingEntry>>,
    },
}
