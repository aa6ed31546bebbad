//! In-process transport over unbounded channels.
//!
//! Useful for tests and for running a host and its remotes inside one
//! process. Inboxes are drained with `try_recv`, so no async runtime is
//! needed.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::sync::{Envelope, PeerId, Transport};

/// Peer id used for the host end of a [`link`]
pub const HOST_PEER: PeerId = PeerId(0);

/// A message together with who sent it
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub sender: PeerId,
    pub envelope: Envelope,
}

/// [`Transport`] that posts deliveries into the receivers' channels
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    id: PeerId,
    host: Option<UnboundedSender<Delivery>>,
    remotes: HashMap<PeerId, UnboundedSender<Delivery>>,
}

impl ChannelTransport {
    pub fn id(&self) -> PeerId {
        self.id
    }

    fn post(&self, tx: Option<&UnboundedSender<Delivery>>, target: PeerId, envelope: Envelope) {
        let Some(tx) = tx else {
            warn!(target: "modkit::transport", "{} has no route to {}", self.id, target);
            return;
        };
        let delivery = Delivery {
            sender: self.id,
            envelope,
        };
        if tx.send(delivery).is_err() {
            warn!(target: "modkit::transport", "{} is disconnected", target);
        }
    }
}

impl Transport for ChannelTransport {
    fn send_to_host(&mut self, envelope: Envelope) {
        self.post(self.host.as_ref(), HOST_PEER, envelope);
    }

    fn send_to_remote(&mut self, target: PeerId, envelope: Envelope) {
        self.post(self.remotes.get(&target), target, envelope);
    }
}

/// One participant's view of the link: how to send, and what arrived
#[derive(Debug)]
pub struct Endpoint {
    pub transport: ChannelTransport,
    inbox: UnboundedReceiver<Delivery>,
}

impl Endpoint {
    pub fn id(&self) -> PeerId {
        self.transport.id
    }

    /// Take every delivery that has arrived so far
    pub fn drain(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        while let Ok(delivery) = self.inbox.try_recv() {
            deliveries.push(delivery);
        }
        deliveries
    }
}

/// Connect a host to remotes with the given ids.
///
/// Returns the host endpoint and one endpoint per remote, in the same order
/// as `remote_ids`. Remotes can only reach the host; the host can reach every
/// remote.
pub fn link(remote_ids: &[PeerId]) -> (Endpoint, Vec<Endpoint>) {
    let (host_tx, host_rx) = mpsc::unbounded_channel();

    let mut host_routes = HashMap::new();
    let mut remotes = Vec::with_capacity(remote_ids.len());
    for &id in remote_ids {
        let (tx, rx) = mpsc::unbounded_channel();
        host_routes.insert(id, tx);
        remotes.push(Endpoint {
            transport: ChannelTransport {
                id,
                host: Some(host_tx.clone()),
                remotes: HashMap::new(),
            },
            inbox: rx,
        });
    }

    let host = Endpoint {
        transport: ChannelTransport {
            id: HOST_PEER,
            host: None,
            remotes: host_routes,
        },
        inbox: host_rx,
    };

    (host, remotes)
}
