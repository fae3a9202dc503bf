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

use clap::Parser;
use routesim::config::Config;
use routesim::log::{self, LogLevel};
use routesim::server::Router;
use routesim::{error, info};

#[derive(Parser)]
#[command(name = "routesimd")]
#[command(about = "Simulated interdomain router", version)]
struct Args {
    /// Local autonomous system number
    asn: u32,

    /// Neighbor channels as <endpoint>-<relation>, relation one of
    /// cust, peer, prov (e.g. 192.168.0.2-cust)
    #[arg(required = true)]
    neighbors: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match std::env::var("ROUTESIM_LOG") {
        Ok(value) => LogLevel::from_str(&value)?,
        Err(_) => LogLevel::Info,
    };
    log::init(level);

    let config = Config::new(args.asn, &args.neighbors).map_err(|e| {
        error!("invalid configuration", "error" => e.to_string());
        e
    })?;

    info!("starting router",
        "asn" => config.asn,
        "neighbors" => config.neighbors.len()
    );

    let router = Router::new(config)?;
    router.run().await;

    Ok(())
}
