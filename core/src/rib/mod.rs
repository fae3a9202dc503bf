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

//! Routing Information Base (RIB) module
//!
//! - `entry`: RIB rows and their path attributes
//! - `table`: the table itself plus the aggregation ledger
//! - `select`: the best-route decision cascade

mod entry;
mod select;
mod table;

// Re-exports
pub use entry::{Origin, PathAttrs, RouteEntry};
pub use select::{best_route, prefer};
pub use table::{AggregationRecord, Rib};
