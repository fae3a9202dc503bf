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

use crate::rib::RouteEntry;
use std::cmp::Ordering;
use std::net::Ipv4Addr;

/// Compare two candidate entries for preference.
/// Returns `Ordering::Greater` if `a` is the better route.
///
/// Stages, in order: longer prefix, higher local_pref, self-origin,
/// shorter AS path, better origin class (IGP over EGP over UNK), lower
/// next-hop address. The last stage compares full 32-bit addresses, so
/// two distinct candidates never compare equal.
pub fn prefer(a: &RouteEntry, b: &RouteEntry) -> Ordering {
    match a.prefix.prefix_length.cmp(&b.prefix.prefix_length) {
        Ordering::Greater => return Ordering::Greater,
        Ordering::Less => return Ordering::Less,
        Ordering::Equal => {}
    }

    match a.attrs.local_pref.cmp(&b.attrs.local_pref) {
        Ordering::Greater => return Ordering::Greater,
        Ordering::Less => return Ordering::Less,
        Ordering::Equal => {}
    }

    match (a.attrs.self_origin, b.attrs.self_origin) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }

    match b.attrs.as_path.len().cmp(&a.attrs.as_path.len()) {
        Ordering::Greater => return Ordering::Greater,
        Ordering::Less => return Ordering::Less,
        Ordering::Equal => {}
    }

    match b.attrs.origin.rank().cmp(&a.attrs.origin.rank()) {
        Ordering::Greater => return Ordering::Greater,
        Ordering::Less => return Ordering::Less,
        Ordering::Equal => {}
    }

    b.next_hop.cmp(&a.next_hop)
}

/// Pick the single best route for destination `dst`, or `None` when no
/// entry covers it. The relationship filter is applied by the caller.
pub fn best_route<'a>(entries: &'a [RouteEntry], dst: Ipv4Addr) -> Option<&'a RouteEntry> {
    entries
        .iter()
        .filter(|e| e.prefix.covers(dst))
        .max_by(|a, b| prefer(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Ipv4Net;
    use crate::rib::Origin;
    use crate::test_helpers::*;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_no_covering_entry() {
        let entries = vec![create_test_entry(ip("172.16.0.2"))];
        assert!(best_route(&entries, ip("8.8.8.8")).is_none());
        assert!(best_route(&[], ip("8.8.8.8")).is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let coarse = create_test_entry_with(ip("172.16.0.2"), |e| {
            e.prefix = Ipv4Net::new(ip("10.0.0.0"), 8);
        });
        let fine = create_test_entry_with(ip("172.17.0.2"), |e| {
            e.prefix = Ipv4Net::new(ip("10.1.0.0"), 16);
            // worse on every later stage; prefix length must still win
            e.attrs.local_pref = 1;
            e.attrs.as_path = vec![1, 2, 3, 4];
            e.attrs.origin = Origin::Unk;
        });

        let entries = vec![coarse, fine];
        let best = best_route(&entries, ip("10.1.2.3")).unwrap();
        assert_eq!(best.next_hop, ip("172.17.0.2"));
    }

    #[test]
    fn test_highest_local_pref_wins() {
        let low = create_test_entry_with(ip("172.16.0.2"), |e| e.attrs.local_pref = 100);
        let high = create_test_entry_with(ip("172.17.0.2"), |e| e.attrs.local_pref = 200);

        let entries = vec![low, high];
        let best = best_route(&entries, ip("10.0.0.1")).unwrap();
        assert_eq!(best.next_hop, ip("172.17.0.2"));
    }

    #[test]
    fn test_self_origin_preferred() {
        let learned = create_test_entry(ip("172.16.0.2"));
        let own = create_test_entry_with(ip("172.17.0.2"), |e| e.attrs.self_origin = true);

        let entries = vec![learned, own];
        let best = best_route(&entries, ip("10.0.0.1")).unwrap();
        assert_eq!(best.next_hop, ip("172.17.0.2"));
    }

    #[test]
    fn test_shortest_as_path_wins() {
        let long = create_test_entry_with(ip("172.16.0.2"), |e| {
            e.attrs.as_path = vec![1, 2, 3];
        });
        let short = create_test_entry_with(ip("172.17.0.2"), |e| {
            e.attrs.as_path = vec![1];
        });

        let entries = vec![long, short];
        let best = best_route(&entries, ip("10.0.0.1")).unwrap();
        assert_eq!(best.next_hop, ip("172.17.0.2"));
    }

    #[test]
    fn test_origin_class_order() {
        let egp = create_test_entry_with(ip("172.16.0.2"), |e| e.attrs.origin = Origin::Egp);
        let igp = create_test_entry_with(ip("172.17.0.2"), |e| e.attrs.origin = Origin::Igp);
        let unk = create_test_entry_with(ip("172.18.0.2"), |e| e.attrs.origin = Origin::Unk);

        let entries = vec![egp, igp, unk];
        let best = best_route(&entries, ip("10.0.0.1")).unwrap();
        assert_eq!(best.next_hop, ip("172.17.0.2"));

        let entries: Vec<_> = entries
            .into_iter()
            .filter(|e| e.attrs.origin != Origin::Igp)
            .collect();
        let best = best_route(&entries, ip("10.0.0.1")).unwrap();
        assert_eq!(best.next_hop, ip("172.16.0.2"));
    }

    #[test]
    fn test_lowest_next_hop_breaks_ties() {
        // differs only past the first octet; full 32-bit comparison decides
        let a = create_test_entry(ip("172.16.9.2"));
        let b = create_test_entry(ip("172.16.0.250"));

        let entries = vec![a, b];
        let best = best_route(&entries, ip("10.0.0.1")).unwrap();
        assert_eq!(best.next_hop, ip("172.16.0.250"));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let entries = vec![
            create_test_entry(ip("172.16.0.2")),
            create_test_entry(ip("172.17.0.2")),
            create_test_entry_with(ip("172.18.0.2"), |e| e.attrs.local_pref = 50),
        ];

        let first = best_route(&entries, ip("10.0.0.1")).cloned();
        for _ in 0..10 {
            assert_eq!(best_route(&entries, ip("10.0.0.1")).cloned(), first);
        }
    }
}
