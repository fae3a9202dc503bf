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

pub mod config;
pub mod log;
pub mod msg;
pub mod neighbor;
pub mod net;
pub mod policy;
pub mod rib;
pub mod server;

#[cfg(test)]
pub(crate) mod test_helpers {
    use crate::net::Ipv4Net;
    use crate::rib::{Origin, PathAttrs, RouteEntry};
    use std::net::Ipv4Addr;

    pub fn create_test_attrs() -> PathAttrs {
        PathAttrs {
            local_pref: 100,
            self_origin: false,
            as_path: vec![100, 200],
            origin: Origin::Igp,
        }
    }

    pub fn create_test_entry(next_hop: Ipv4Addr) -> RouteEntry {
        RouteEntry {
            prefix: Ipv4Net::new(Ipv4Addr::new(10, 0, 0, 0), 24),
            next_hop,
            attrs: create_test_attrs(),
        }
    }

    pub fn create_test_entry_with(
        next_hop: Ipv4Addr,
        f: impl FnOnce(&mut RouteEntry),
    ) -> RouteEntry {
        let mut entry = create_test_entry(next_hop);
        f(&mut entry);
        entry
    }

    pub fn create_test_prefix_n(i: u8) -> Ipv4Net {
        Ipv4Net::new(Ipv4Addr::new(10, 0, i, 0), 24)
    }
}
