//! Gateway process entry point. The teacher ships `hafiz-cli` as the one
//! binary wrapping `S3Server::run`; this workspace splits per-crate
//! binaries instead (§12 workspace layout), so `ob-gateway` carries its own
//! `main`, grounded on `hafiz-cli/src/main.rs`'s CLI/config/logging shape.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use ob_cluster::ic::InformationCenter;
use ob_cluster::meta::MetaStore;
use ob_cluster::metasync::Metasyncer;
use ob_cluster::paged_list::PagedListCoordinator;
use ob_cluster::reverse_proxy::ReverseProxyCache;
use ob_cluster::{Bmd, Rmd, Smap, Transport, TransportConfig};
use ob_core::config::Config;
use ob_core::node::{DaemonId, NetInfo, Role, Snode};
use ob_gateway::server::{create_router, run_http, spawn_background_tasks};
use ob_gateway::state::AppState;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ob-gateway")]
#[command(about = "Control-plane gateway: request router, IC, metasync, S3 facade")]
struct Cli {
    /// TOML config file path (§6.2).
    #[arg(short, long)]
    config: Option<String>,

    /// Node role for this process.
    #[arg(long, default_value = "proxy")]
    role: String,

    /// One or more already-running gateway URLs to join against. Omit to
    /// bootstrap a brand-new single-node cluster.
    #[arg(long = "discover")]
    discovery_urls: Vec<String>,

    #[arg(long, env = "AIS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let role = match cli.role.as_str() {
        "target" => Role::Target,
        _ => Role::Proxy,
    };

    let mut config = Config::load(role, cli.config.as_deref())?;
    if !cli.discovery_urls.is_empty() {
        config.cluster.discovery_urls = cli.discovery_urls;
    }
    let config = Arc::new(config);

    let self_id = load_or_generate_daemon_id(&config)?;
    tracing::info!(daemon_id = self_id.as_str(), role = role.as_str(), "starting gateway");

    let self_snode = build_self_snode(&config, self_id.clone());

    let bmd = MetaStore::new(
        MetaStore::<Bmd>::load_or_default(config.paths.bmd_file(), Bmd::new(String::new()))?,
        config.paths.bmd_file(),
    );
    let rmd = MetaStore::new(
        MetaStore::<Rmd>::load_or_default(config.paths.rmd_file(), Rmd::new(String::new()))?,
        config.paths.rmd_file(),
    );

    let transport = Arc::new(Transport::new(TransportConfig {
        timeout: Duration::from_secs(config.metasync.cplane_op_timeout_secs),
        connect_timeout: Duration::from_secs(10),
        max_retries: config.metasync.max_retries,
        retry_base_delay: Duration::from_millis(config.metasync.retry_base_delay_ms),
    })?);

    let (smap, is_primary) = bootstrap_or_join(&config, &self_snode, transport.as_ref()).await?;

    let ic = Arc::new(InformationCenter::new(self_id.clone(), Duration::from_secs(config.ic.nl_gc_age_secs)));
    let metasyncer = Arc::new(Metasyncer::new(transport.clone()));

    let state = AppState {
        config: config.clone(),
        self_id: self_id.clone(),
        self_snode: Arc::new(parking_lot::RwLock::new(Some(self_snode))),
        smap: Arc::new(MetaStore::new(smap, config.paths.smap_file())),
        bmd: Arc::new(bmd),
        rmd: Arc::new(rmd),
        ic,
        metasyncer,
        transport,
        reverse_proxy: Arc::new(ReverseProxyCache::new()),
        paged_list: Arc::new(parking_lot::Mutex::new(PagedListCoordinator::new())),
        authorizer: Arc::new(ob_auth::AllowAll),
        is_primary: Arc::new(AtomicBool::new(is_primary)),
        started_at: Instant::now(),
        joined: Arc::new(AtomicBool::new(true)),
    };

    spawn_background_tasks(Arc::new(state.clone()));

    let bind_addr: SocketAddr = format!("{}:{}", config.network.bind_address, config.network.control_port).parse()?;
    let router = create_router(state);
    run_http(router, bind_addr).await?;
    Ok(())
}

fn load_or_generate_daemon_id(config: &Config) -> anyhow::Result<DaemonId> {
    if let Some(id) = &config.node.daemon_id_override {
        return Ok(DaemonId::validate(id)?);
    }
    let id_file = match config.node.role {
        Role::Proxy => config.paths.proxy_id_file(),
        Role::Target => config.paths.target_id_file(),
    };
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
        config.node.role,
        NetInfo::new(host.clone(), config.network.public_port),
        NetInfo::new(host.clone(), config.network.control_port),
        NetInfo::new(host, config.network.host_port.unwrap_or(config.network.data_port)),
    )
}

/// Either bootstraps a brand-new single-node cluster (no discovery URLs
/// configured) or joins an existing one by fetching its Smap and PUTting
/// self onto `/v1/cluster` at the primary (§4.3 "join").
async fn bootstrap_or_join(config: &Config, self_snode: &Snode, transport: &Transport) -> anyhow::Result<(Smap, bool)> {
    if config.cluster.discovery_urls.is_empty() {
        let mut smap = Smap::new(ob_core::utils::generate_job_uuid(), self_snode.id.as_str().to_string());
        smap.version = 1;
        match self_snode.role {
            Role::Proxy => {
                smap.proxies.insert(self_snode.id.as_str().to_string(), self_snode.clone());
            }
            Role::Target => {
                smap.targets.insert(self_snode.id.as_str().to_string(), self_snode.clone());
            }
        }
        smap.restaff_ic(config.cluster.ic_size);
        return Ok((smap, true));
    }

    let discovery = &config.cluster.discovery_urls[0];
    let remote_smap: Smap = transport.get(&format!("{discovery}/v1/daemon?what=smap")).await?;
    let Some(primary) = remote_smap.primary() else {
        anyhow::bail!("discovery peer {discovery} reports no primary");
    };

    let client = reqwest::Client::new();
    let response = client
        .put(format!("{}/v1/cluster", primary.control_net.url("http")))
        .json(self_snode)
        .send()
        .await?;
    if !response.status().is_success() {
        anyhow::bail!("join request to {discovery} failed with status {}", response.status());
    }
    let joined_smap: Smap = response.json().await?;
    Ok((joined_smap, false))
}
