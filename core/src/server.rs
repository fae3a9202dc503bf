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

use crate::config::Config;
use crate::msg::{Body, Envelope, PrefixBody, TableRow, UpdateBody};
use crate::neighbor::{Neighbor, NeighborEvent};
use crate::net::{local_facing, Ipv4Net};
use crate::policy::{transit_allowed, NeighborRelation};
use crate::rib::{best_route, Rib, RouteEntry};
use crate::{debug, info};
use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use tokio::sync::mpsc;

/// Frame counters kept per neighbor, reported when the loop ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeighborStats {
    pub frames_in: u64,
    pub frames_out: u64,
}

/// The router control plane: owns the RIB, the announcement and
/// revocation history, and every neighbor endpoint. A single event loop
/// drains neighbor events and runs each handler to completion, so a
/// neighbor can never observe a partially applied update.
pub struct Router {
    asn: u32,
    neighbors: HashMap<Ipv4Addr, Neighbor>,
    rib: Rib,
    announcements: Vec<(Ipv4Addr, UpdateBody)>,
    revocations: Vec<(Ipv4Addr, Vec<PrefixBody>)>,
    stats: HashMap<Ipv4Addr, NeighborStats>,
    event_tx: mpsc::UnboundedSender<NeighborEvent>,
    event_rx: mpsc::UnboundedReceiver<NeighborEvent>,
}

impl Router {
    /// Open every configured neighbor channel and assemble the router.
    pub fn new(config: Config) -> io::Result<Self> {
        let mut neighbors = Vec::with_capacity(config.neighbors.len());
        for cfg in &config.neighbors {
            neighbors.push(Neighbor::open(cfg.endpoint, cfg.relation)?);
        }
        Ok(Router::with_neighbors(config.asn, neighbors))
    }

    /// Assemble a router from pre-built neighbor endpoints. Tests use
    /// this with socket pairs.
    pub fn with_neighbors(asn: u32, list: Vec<Neighbor>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let stats = list
            .iter()
            .map(|n| (n.endpoint, NeighborStats::default()))
            .collect();
        let neighbors = list.into_iter().map(|n| (n.endpoint, n)).collect();

        Router {
            asn,
            neighbors,
            rib: Rib::new(),
            announcements: Vec::new(),
            revocations: Vec::new(),
            stats,
            event_tx,
            event_rx,
        }
    }

    pub fn rib(&self) -> &Rib {
        &self.rib
    }

    /// Number of recorded announcements and revocations.
    pub fn history_len(&self) -> (usize, usize) {
        (self.announcements.len(), self.revocations.len())
    }

    /// Run until a neighbor channel closes or errors. All state changes
    /// from one frame are applied, and its propagation sent, before the
    /// next frame is dispatched.
    pub async fn run(mut self) {
        for neighbor in self.neighbors.values() {
            neighbor.spawn_reader(self.event_tx.clone());
        }
        info!("router started", "asn" => self.asn, "neighbors" => self.neighbors.len());

        while let Some(event) = self.event_rx.recv().await {
            match event {
                NeighborEvent::Frame { from, frame } => self.handle_frame(from, frame),
                NeighborEvent::Closed { from } => {
                    info!("neighbor channel closed, shutting down", "neighbor" => from.to_string());
                    break;
                }
            }
        }

        for (endpoint, stats) in &self.stats {
            info!("neighbor statistics",
                "neighbor" => endpoint.to_string(),
                "frames_in" => stats.frames_in,
                "frames_out" => stats.frames_out
            );
        }
        info!("router stopped",
            "routes" => self.rib.len(),
            "announcements" => self.announcements.len(),
            "revocations" => self.revocations.len()
        );
    }

    fn handle_frame(&mut self, from: Ipv4Addr, frame: Envelope) {
        if let Some(stats) = self.stats.get_mut(&from) {
            stats.frames_in += 1;
        }

        let Envelope { src, dst, body } = frame;
        match body {
            Body::Update(update) => self.handle_update(from, update),
            Body::Revoke(prefixes) => self.handle_revoke(from, prefixes),
            Body::Data(payload) => self.handle_data(from, src, dst, payload),
            Body::Dump {} => self.handle_dump(from, src),
            Body::Table(_) | Body::NoRoute {} => {
                debug!("ignoring frame", "neighbor" => from.to_string());
            }
        }
    }

    fn handle_update(&mut self, from: Ipv4Addr, update: UpdateBody) {
        info!("update received",
            "neighbor" => from.to_string(),
            "network" => update.network.to_string(),
            "netmask" => update.netmask.to_string()
        );

        self.announcements.push((from, update.clone()));
        self.rib.insert(RouteEntry::from_announcement(from, &update));

        let mut exported = update;
        exported.as_path.insert(0, self.asn);
        for target in self.export_targets(from) {
            let frame = Envelope::new(
                local_facing(target),
                target,
                Body::Update(exported.clone()),
            );
            self.send_frame(target, frame);
        }
    }

    fn handle_revoke(&mut self, from: Ipv4Addr, prefixes: Vec<PrefixBody>) {
        info!("revocation received",
            "neighbor" => from.to_string(),
            "count" => prefixes.len()
        );

        self.revocations.push((from, prefixes.clone()));
        for withdrawn in &prefixes {
            let prefix = Ipv4Net::from_netmask(withdrawn.network, withdrawn.netmask);
            self.rib.withdraw(prefix, from);
        }

        for target in self.export_targets(from) {
            let frame =
                Envelope::new(local_facing(target), target, Body::Revoke(prefixes.clone()));
            self.send_frame(target, frame);
        }
    }

    fn handle_data(
        &mut self,
        from: Ipv4Addr,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        payload: serde_json::Value,
    ) {
        let viable = best_route(self.rib.entries(), dst)
            .map(|entry| entry.next_hop)
            .filter(|next_hop| self.forwarding_allowed(from, *next_hop));

        match viable {
            Some(next_hop) => {
                debug!("forwarding data",
                    "dst" => dst.to_string(),
                    "next_hop" => next_hop.to_string()
                );
                self.send_frame(next_hop, Envelope::new(src, dst, Body::Data(payload)));
            }
            None => {
                debug!("no viable route", "dst" => dst.to_string(), "from" => from.to_string());
                self.send_frame(from, Envelope::new(local_facing(from), src, Body::NoRoute {}));
            }
        }
    }

    fn handle_dump(&mut self, from: Ipv4Addr, requester: Ipv4Addr) {
        let rows = self
            .rib
            .snapshot()
            .into_iter()
            .map(|(prefix, peer)| TableRow {
                network: prefix.address,
                netmask: prefix.netmask(),
                peer,
            })
            .collect();

        self.send_frame(from, Envelope::new(local_facing(from), requester, Body::Table(rows)));
    }

    /// Neighbors a frame received from `from` is propagated to: everyone
    /// except the source, provided one side of the hop is a customer.
    fn export_targets(&self, from: Ipv4Addr) -> Vec<Ipv4Addr> {
        let Some(src_relation) = self.relation_of(from) else {
            return Vec::new();
        };
        self.neighbors
            .values()
            .filter(|n| n.endpoint != from && transit_allowed(src_relation, n.relation))
            .map(|n| n.endpoint)
            .collect()
    }

    /// The relationship filter for data traffic: either the source or
    /// the chosen next hop must be a customer.
    fn forwarding_allowed(&self, from: Ipv4Addr, next_hop: Ipv4Addr) -> bool {
        match (self.relation_of(from), self.relation_of(next_hop)) {
            (Some(src), Some(dst)) => transit_allowed(src, dst),
            _ => false,
        }
    }

    fn relation_of(&self, endpoint: Ipv4Addr) -> Option<NeighborRelation> {
        self.neighbors.get(&endpoint).map(|n| n.relation)
    }

    fn send_frame(&mut self, endpoint: Ipv4Addr, frame: Envelope) {
        if let Some(neighbor) = self.neighbors.get(&endpoint) {
            neighbor.send(&frame);
            if let Some(stats) = self.stats.get_mut(&endpoint) {
                stats.frames_out += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::Body;
    use crate::neighbor::MAX_FRAME_SIZE;
    use crate::rib::Origin;
    use tokio::net::UnixDatagram;
    use tokio::time::{timeout, Duration};

    struct TestNeighbor {
        endpoint: Ipv4Addr,
        remote: UnixDatagram,
    }

    impl TestNeighbor {
        async fn recv(&self) -> Envelope {
            let mut buf = vec![0u8; MAX_FRAME_SIZE];
            let n = timeout(Duration::from_secs(1), self.remote.recv(&mut buf))
                .await
                .expect("timed out waiting for frame")
                .unwrap();
            Envelope::from_bytes(&buf[..n]).unwrap()
        }

        fn try_recv(&self) -> Option<Envelope> {
            let mut buf = vec![0u8; MAX_FRAME_SIZE];
            match self.remote.try_recv(&mut buf) {
                Ok(n) => Some(Envelope::from_bytes(&buf[..n]).unwrap()),
                Err(_) => None,
            }
        }
    }

    fn make_router(specs: &[(&str, NeighborRelation)]) -> (Router, Vec<TestNeighbor>) {
        let mut neighbors = Vec::new();
        let mut remotes = Vec::new();
        for (endpoint, relation) in specs {
            let endpoint: Ipv4Addr = endpoint.parse().unwrap();
            let (ours, theirs) = UnixDatagram::pair().unwrap();
            neighbors.push(Neighbor::from_socket(endpoint, *relation, ours));
            remotes.push(TestNeighbor {
                endpoint,
                remote: theirs,
            });
        }
        (Router::with_neighbors(7, neighbors), remotes)
    }

    fn update_body() -> UpdateBody {
        UpdateBody {
            network: Ipv4Addr::new(192, 168, 0, 0),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            localpref: 100,
            as_path: vec![1],
            origin: Origin::Igp,
            self_origin: false,
        }
    }

    #[tokio::test]
    async fn test_update_propagates_with_prepended_asn() {
        let (mut router, remotes) = make_router(&[
            ("192.168.0.2", NeighborRelation::Customer),
            ("172.16.0.2", NeighborRelation::Peer),
        ]);

        router.handle_update(remotes[0].endpoint, update_body());

        assert_eq!(router.rib.len(), 1);
        assert_eq!(router.history_len(), (1, 0));

        let frame = remotes[1].recv().await;
        assert_eq!(frame.src, Ipv4Addr::new(172, 16, 0, 1));
        assert_eq!(frame.dst, remotes[1].endpoint);
        match frame.body {
            Body::Update(ref update) => assert_eq!(update.as_path, vec![7, 1]),
            ref other => panic!("expected update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_from_peer_not_sent_to_peer() {
        let (mut router, remotes) = make_router(&[
            ("192.168.0.2", NeighborRelation::Peer),
            ("172.16.0.2", NeighborRelation::Peer),
            ("10.0.0.2", NeighborRelation::Customer),
        ]);

        router.handle_update(remotes[0].endpoint, update_body());

        // the route is stored even though the peer gets nothing
        assert_eq!(router.rib.len(), 1);
        assert!(remotes[1].try_recv().is_none());
        // customers always hear about it
        let frame = remotes[2].recv().await;
        assert!(matches!(frame.body, Body::Update(_)));
    }

    #[tokio::test]
    async fn test_revoke_withdraws_and_propagates() {
        let (mut router, remotes) = make_router(&[
            ("192.168.0.2", NeighborRelation::Customer),
            ("172.16.0.2", NeighborRelation::Customer),
        ]);

        router.handle_update(remotes[0].endpoint, update_body());
        let _ = remotes[1].recv().await;

        router.handle_revoke(
            remotes[0].endpoint,
            vec![PrefixBody {
                network: Ipv4Addr::new(192, 168, 0, 0),
                netmask: Ipv4Addr::new(255, 255, 255, 0),
            }],
        );

        assert!(router.rib.is_empty());
        assert_eq!(router.history_len(), (1, 1));
        let frame = remotes[1].recv().await;
        assert!(matches!(frame.body, Body::Revoke(_)));
    }

    #[tokio::test]
    async fn test_data_without_route_gets_no_route_reply() {
        let (mut router, remotes) =
            make_router(&[("192.168.0.2", NeighborRelation::Customer)]);

        let packet_src = Ipv4Addr::new(192, 168, 0, 25);
        router.handle_data(
            remotes[0].endpoint,
            packet_src,
            Ipv4Addr::new(8, 8, 8, 8),
            serde_json::json!({"payload": 1}),
        );

        let frame = remotes[0].recv().await;
        assert_eq!(frame.src, Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(frame.dst, packet_src);
        assert_eq!(frame.body, Body::NoRoute {});
    }

    #[tokio::test]
    async fn test_data_between_peers_is_refused() {
        let (mut router, remotes) = make_router(&[
            ("192.168.0.2", NeighborRelation::Peer),
            ("172.16.0.2", NeighborRelation::Peer),
        ]);

        // route learned from the second peer
        router.handle_update(remotes[1].endpoint, update_body());

        let packet_src = Ipv4Addr::new(192, 168, 0, 25);
        router.handle_data(
            remotes[0].endpoint,
            packet_src,
            Ipv4Addr::new(192, 168, 0, 77),
            serde_json::json!({}),
        );

        // peer-to-peer transit is forbidden: no forward, only a refusal
        assert!(remotes[1].try_recv().is_none());
        let frame = remotes[0].recv().await;
        assert_eq!(frame.body, Body::NoRoute {});
    }

    #[tokio::test]
    async fn test_dump_returns_table() {
        let (mut router, remotes) = make_router(&[
            ("192.168.0.2", NeighborRelation::Customer),
            ("172.16.0.2", NeighborRelation::Peer),
        ]);

        router.handle_update(remotes[1].endpoint, update_body());

        let requester = Ipv4Addr::new(192, 168, 0, 25);
        router.handle_dump(remotes[0].endpoint, requester);

        let frame = remotes[0].recv().await;
        assert_eq!(frame.src, Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(frame.dst, requester);
        match frame.body {
            Body::Table(ref rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].network, Ipv4Addr::new(192, 168, 0, 0));
                assert_eq!(rows[0].netmask, Ipv4Addr::new(255, 255, 255, 0));
                assert_eq!(rows[0].peer, remotes[1].endpoint);
            }
            ref other => panic!("expected table, got {:?}", other),
        }
    }
}
