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

use crate::net::Ipv4Net;
use crate::rib::RouteEntry;
use std::net::Ipv4Addr;

/// A merge recorded for later undo. Carries full copies of both
/// constituents; table rows never point into the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRecord {
    /// Constituent with the numerically lower network address.
    pub low: RouteEntry,
    /// Its sibling.
    pub high: RouteEntry,
}

impl AggregationRecord {
    /// The prefix of the merged entry this record produced.
    pub fn parent_prefix(&self) -> Ipv4Net {
        self.low.prefix.parent()
    }

    pub fn next_hop(&self) -> Ipv4Addr {
        self.low.next_hop
    }
}

/// The routing table: an ordered list of entries plus the append-only
/// aggregation ledger that lets withdrawals undo earlier merges.
#[derive(Debug, Default)]
pub struct Rib {
    entries: Vec<RouteEntry>,
    ledger: Vec<AggregationRecord>,
}

impl Rib {
    pub fn new() -> Self {
        Rib {
            entries: Vec::new(),
            ledger: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    fn contains(&self, prefix: Ipv4Net, next_hop: Ipv4Addr) -> bool {
        self.entries
            .iter()
            .any(|e| e.prefix == prefix && e.next_hop == next_hop)
    }

    /// Add an announced route. A repeat announcement for the same
    /// `(prefix, next_hop)` overwrites the existing row. Afterwards the
    /// table is coalesced to a fixed point.
    pub fn insert(&mut self, entry: RouteEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.prefix == entry.prefix && e.next_hop == entry.next_hop)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.coalesce();
    }

    /// Remove the route for `prefix` announced by `from`, first undoing
    /// any recorded merges that absorbed it.
    pub fn withdraw(&mut self, prefix: Ipv4Net, from: Ipv4Addr) {
        self.disaggregate(prefix, from);
        self.entries
            .retain(|e| !(e.prefix == prefix && e.next_hop == from));
    }

    /// The current table as `(prefix, next_hop)` pairs, in table order.
    pub fn snapshot(&self) -> Vec<(Ipv4Net, Ipv4Addr)> {
        self.entries.iter().map(|e| (e.prefix, e.next_hop)).collect()
    }

    /// Merge sibling entries until no further merge applies. Two entries
    /// merge iff their prefixes are adjacent siblings, they share a
    /// next_hop, and all path attributes are equal. The merged entry
    /// keeps the lower network and widens its mask by one bit.
    fn coalesce(&mut self) {
        while let Some((i, j)) = self.find_mergeable() {
            let (low_idx, high_idx) = if self.entries[i].prefix.address
                < self.entries[j].prefix.address
            {
                (i, j)
            } else {
                (j, i)
            };
            let low = self.entries[low_idx].clone();
            let high = self.entries[high_idx].clone();

            self.ledger.push(AggregationRecord {
                low: low.clone(),
                high,
            });
            self.entries[low_idx].prefix = low.prefix.parent();
            self.entries.remove(high_idx);
        }
    }

    fn find_mergeable(&self) -> Option<(usize, usize)> {
        for i in 0..self.entries.len() {
            for j in (i + 1)..self.entries.len() {
                let (a, b) = (&self.entries[i], &self.entries[j]);
                if a.prefix.adjacent(&b.prefix)
                    && a.next_hop == b.next_hop
                    && a.attrs == b.attrs
                {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Unwind ledger records, newest first, until the exact row
    /// `(prefix, from)` is back in the table or no applicable record
    /// remains. Each step removes a merged parent row and restores the
    /// two recorded constituents; restoring does not re-trigger
    /// coalescing.
    fn disaggregate(&mut self, prefix: Ipv4Net, from: Ipv4Addr) {
        while !self.contains(prefix, from) {
            let found = self.ledger.iter().rev().find(|record| {
                record.next_hop() == from
                    && record.parent_prefix().covers(prefix.address)
                    && self.contains(record.parent_prefix(), from)
            });
            let Some(record) = found.cloned() else {
                break;
            };

            let parent = record.parent_prefix();
            self.entries
                .retain(|e| !(e.prefix == parent && e.next_hop == from));
            self.entries.push(record.low);
            self.entries.push(record.high);
        }
    }
}
