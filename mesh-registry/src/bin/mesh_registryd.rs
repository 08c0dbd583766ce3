//! `mesh-registryd`: the standalone Registry API binary.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mesh_config::RegistryArgs;
use mesh_store::{SledStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = RegistryArgs::parse();
    mesh_telemetry::init_subscriber(args.debug);

    let store: Arc<dyn Store> = Arc::new(SledStore::open(&args.store_path)?);
    let addr = format!("{}:{}", args.bind_host, args.bind_port).parse()?;

    mesh_registry::run(addr, store, Duration::from_secs(args.shutdown_grace_seconds)).await
}
