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

use crate::msg::UpdateBody;
use crate::net::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// How a route entered the routing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    Igp,
    Egp,
    Unk,
}

impl Origin {
    /// Selection rank: IGP beats EGP beats UNK. Lower is better.
    pub fn rank(self) -> u8 {
        match self {
            Origin::Igp => 0,
            Origin::Egp => 1,
            Origin::Unk => 2,
        }
    }
}

/// Path attributes carried by an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathAttrs {
    pub local_pref: u32,
    pub self_origin: bool,
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

/// A single RIB row: a destination prefix and the neighbor it was
/// announced by, plus the announced path attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteEntry {
    pub prefix: Ipv4Net,
    pub next_hop: Ipv4Addr,
    pub attrs: PathAttrs,
}

impl RouteEntry {
    /// Build a RIB row from an announcement received on neighbor `from`.
    pub fn from_announcement(from: Ipv4Addr, update: &UpdateBody) -> Self {
        RouteEntry {
            prefix: Ipv4Net::from_netmask(update.network, update.netmask),
            next_hop: from,
            attrs: PathAttrs {
                local_pref: update.localpref,
                self_origin: update.self_origin,
                as_path: update.as_path.clone(),
                origin: update.origin,
            },
        }
    }
}
