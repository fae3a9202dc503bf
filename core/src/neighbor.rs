// Copyright 2025 routesim Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Neighbor endpoints: one datagram channel per configured neighbor,
//! named by the endpoint string. A reader task per neighbor decodes
//! frames and forwards them to the router loop over a channel, so
//! arrival order per neighbor is preserved.

use crate::msg::Envelope;
use crate::policy::NeighborRelation;
use crate::{debug, error};
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::UnixDatagram;
use tokio::sync::mpsc;

/// Upper bound on a single JSON frame.
pub const MAX_FRAME_SIZE: usize = 65536;

/// Events delivered from neighbor reader tasks to the router loop.
#[derive(Debug)]
pub enum NeighborEvent {
    Frame { from: Ipv4Addr, frame: Envelope },
    Closed { from: Ipv4Addr },
}

pub struct Neighbor {
    pub endpoint: Ipv4Addr,
    pub relation: NeighborRelation,
    sock: Arc<UnixDatagram>,
}

impl Neighbor {
    /// Connect to the simulator-provided channel named by the endpoint.
    pub fn open(endpoint: Ipv4Addr, relation: NeighborRelation) -> io::Result<Self> {
        let sock = UnixDatagram::unbound()?;
        sock.connect(endpoint.to_string())?;
        Ok(Neighbor::from_socket(endpoint, relation, sock))
    }

    /// Wrap an already-connected datagram socket. Used by tests, which
    /// drive the router over `UnixDatagram::pair()`.
    pub fn from_socket(
        endpoint: Ipv4Addr,
        relation: NeighborRelation,
        sock: UnixDatagram,
    ) -> Self {
        Neighbor {
            endpoint,
            relation,
            sock: Arc::new(sock),
        }
    }

    /// Non-blocking frame send. The simulator guarantees neighbor writes
    /// do not block meaningfully; failures are logged and the frame is
    /// dropped.
    pub fn send(&self, frame: &Envelope) {
        let bytes = match frame.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("failed to encode frame", "neighbor" => self.endpoint.to_string(), "error" => e.to_string());
                return;
            }
        };
        if let Err(e) = self.sock.try_send(&bytes) {
            error!("failed to send frame", "neighbor" => self.endpoint.to_string(), "error" => e.to_string());
        }
    }

    /// Spawn the reader task for this neighbor. Malformed frames are
    /// dropped here; a zero-length read or a receive error reports the
    /// channel as closed and ends the task.
    pub fn spawn_reader(&self, events: mpsc::UnboundedSender<NeighborEvent>) {
        let sock = Arc::clone(&self.sock);
        let from = self.endpoint;

        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_FRAME_SIZE];
            loop {
                match sock.recv(&mut buf).await {
                    Ok(0) => {
                        let _ = events.send(NeighborEvent::Closed { from });
                        break;
                    }
                    Ok(n) => match Envelope::from_bytes(&buf[..n]) {
                        Ok(frame) => {
                            if events.send(NeighborEvent::Frame { from, frame }).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!("dropping malformed frame", "neighbor" => from.to_string(), "error" => e.to_string());
                        }
                    },
                    Err(e) => {
                        error!("receive error on neighbor channel", "neighbor" => from.to_string(), "error" => e.to_string());
                        let _ = events.send(NeighborEvent::Closed { from });
                        break;
                    }
                }
            }
        });
    }
}
