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

//! Wire messages exchanged with neighbors.
//!
//! Every frame is a single UTF-8 JSON object with a common envelope:
//! `{"src": ..., "dst": ..., "type": ..., "msg": ...}`. The message kind
//! is a closed sum; an unknown `type` on the wire is a decode failure and
//! the frame is dropped by the caller.

use crate::rib::Origin;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    #[serde(flatten)]
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "msg")]
pub enum Body {
    #[serde(rename = "update")]
    Update(UpdateBody),
    #[serde(rename = "revoke")]
    Revoke(Vec<PrefixBody>),
    /// Opaque payload, forwarded verbatim.
    #[serde(rename = "data")]
    Data(serde_json::Value),
    #[serde(rename = "dump")]
    Dump {},
    #[serde(rename = "table")]
    Table(Vec<TableRow>),
    #[serde(rename = "no route")]
    NoRoute {},
}

/// Body of a route announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBody {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub localpref: u32,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub origin: Origin,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
}

/// One withdrawn prefix in a revocation body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixBody {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

/// One row of a `table` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub peer: Ipv4Addr,
}

impl Envelope {
    pub fn new(src: Ipv4Addr, dst: Ipv4Addr, body: Body) -> Self {
        Envelope { src, dst, body }
    }

    /// Encode as one JSON frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode one JSON frame. Malformed JSON and unknown message types
    /// both surface here as errors.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
