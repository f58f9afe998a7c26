//! Target process entry point, grounded on `ob-gateway`'s `bin/gateway.rs`
//! for the CLI/config/logging shape, trimmed to the join-only path: a
//! target never bootstraps a cluster by itself (§2 "Gateways hold no
//! object data; targets hold data but no authoritative cluster metadata"
//! — the first node in any cluster is necessarily a proxy).

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use ob_cluster::meta::MetaStore;
use ob_cluster::{Bmd, Rmd, Smap};
use ob_core::config::Config;
use ob_core::node::{DaemonId, NetInfo, Role, Snode};
use ob_target::server::{create_router, run_http};
use ob_target::state::TargetState;
use ob_target::storage_engine::LocalStorage;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ob-target")]
#[command(about = "Target control handlers: metasync receive, bucket-init, storage-engine forwarding")]
struct Cli {
    #[arg(short, long)]
    config: Option<String>,

    /// Gateway URL to join against (required: targets never self-bootstrap).
    #[arg(long = "discover")]
    discovery_url: String,

    #[arg(long, env = "AIS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry().with(fmt::layer().with_target(true)).with(filter).init();

    let config = Arc::new(Config::load(Role::Target, cli.config.as_deref())?);

    let self_id = load_or_generate_daemon_id(&config)?;
    tracing::info!(daemon_id = self_id.as_str(), "starting target");

    let self_snode = build_self_snode(&config, self_id.clone());

    let storage = LocalStorage::new(&config.paths.config_dir.join("data"));
    storage.init().await?;

    let joined_smap = join_cluster(&cli.discovery_url, &self_snode).await?;

    let bmd = MetaStore::new(
        MetaStore::<Bmd>::load_or_default(config.paths.bmd_file(), Bmd::new(joined_smap.uuid.clone()))?,
        config.paths.bmd_file(),
    );
    let rmd = MetaStore::new(
        MetaStore::<Rmd>::load_or_default(config.paths.rmd_file(), Rmd::new(joined_smap.uuid.clone()))?,
        config.paths.rmd_file(),
    );

    let state = TargetState {
        config: config.clone(),
        self_id,
        smap: Arc::new(MetaStore::new(joined_smap, config.paths.smap_file())),
        bmd: Arc::new(bmd),
        rmd: Arc::new(rmd),
        storage: Arc::new(storage),
    };

    let bind_addr: SocketAddr = format!("{}:{}", config.network.bind_address, config.network.control_port).parse()?;
    let router = create_router(state);
    run_http(router, bind_addr).await?;
    Ok(())
}

fn load_or_generate_daemon_id(config: &Config) -> anyhow::Result<DaemonId> {
    if let Some(id) = &config.node.daemon_id_override {
        return Ok(DaemonId::validate(id)?);
    }
    let id_file = config.paths.target_id_file();
    if id_file.exists() {
        let raw = std::fs::read_to_string(&id_file)?;
        return Ok(DaemonId::validate(raw.trim())?);
    }
    let id = DaemonId::generate();
    if let Some(parent) = id_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&id_file, id.as_str())?;
    Ok(id)
}

fn build_self_snode(config: &Config, self_id: DaemonId) -> Snode {
    let host = config.network.host_ip.clone().unwrap_or_else(|| config.network.bind_address.clone());
    Snode::new(
        self_id,
        Role::Target,
        NetInfo::new(host.clone(), config.network.public_port),
        NetInfo::new(host.clone(), config.network.control_port),
        NetInfo::new(host, config.network.host_port.unwrap_or(config.network.data_port)),
    )
}

/// Fetches the discovery peer's Smap, resolves its primary, and PUTs self
/// onto the primary's `/v1/cluster` (§4.3 "join"), mirroring the gateway's
/// join path minus the bootstrap-as-primary branch.
async fn join_cluster(discovery_url: &str, self_snode: &Snode) -> anyhow::Result<Smap> {
    let client = reqwest::Client::new();
    let remote_smap: Smap = client
        .get(format!("{discovery_url}/v1/daemon?what=smap"))
        .send()
        .await?
        .json()
        .await?;
    let Some(primary) = remote_smap.primary() else {
        anyhow::bail!("discovery peer {discovery_url} reports no primary");
    };

    let response = client
        .put(format!("{}/v1/cluster", primary.control_net.url("http")))
        .json(self_snode)
        .send()
        .await?;
    if !response.status().is_success() {
        anyhow::bail!("join request to {discovery_url} failed with status {}", response.status());
    }
    Ok(response.json().await?)
}
