use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use local_ip_address::local_ip;
use plots::db::PlotDb;
use tokio::{net::TcpListener, sync::broadcast};
use tracing_subscriber::EnvFilter;

use crate::{
    broadcast_msg::BroadcastMsg,
    client_db::ClientDb,
    config::Config,
    console_cmd::ConsoleCmd,
    console_input::console_input_thread,
    memory_world::MemoryWorld,
};

mod broadcast_msg;
mod client_db;
mod config;
mod console_cmd;
mod console_input;
mod memory_world;

const CONFIG_PATH: &str = "plots.toml";
/// How long connections get to finish what they are doing once the server stops.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load_or_init(Path::new(CONFIG_PATH))?;
    let settings = Arc::new(config.plots.clone());
    let db = Arc::new(PlotDb::open(&config.server.db_path).context("could not open plot database")?);
    let world = Arc::new(MemoryWorld::new(&settings));
    world.pregenerate(config.server.pregenerate_radius).await?;

    let port = config.server.port;
    let addr = SocketAddr::new(IpAddr::from(Ipv4Addr::UNSPECIFIED), port);
    let listener = TcpListener::bind(addr).await.with_context(|| format!("could not bind port {port}"))?;
    match local_ip() {
        Ok(my_local_ip) => tracing::info!("server started at ip: {my_local_ip}:{port}"),
        Err(e) => tracing::warn!("server started on port {port}, local ip unknown: {e}"),
    }

    let mut client_db = ClientDb::new(settings, db.clone(), world);
    let (tx, _) = broadcast::channel::<BroadcastMsg>(100);
    let mut console_receiver = console_input_thread();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((socket, addr)) => client_db.new_client(socket, addr, tx.clone()),
                    Err(e) => tracing::warn!("error while accepting client: {e}"),
                }
            }
            Some(console_str) = console_receiver.recv() => {
                match ConsoleCmd::parse(console_str.trim()) {
                    Ok(ConsoleCmd::Stop) => break,
                    Ok(cmd) => run_console_cmd(cmd, &client_db, &tx),
                    Err(err) => println!("err: {err}"),
                }
            }
        }
    }

    tracing::info!("stopping server");
    if tx.send(BroadcastMsg::Shutdown).is_err() {
        tracing::debug!("no clients to notify of shutdown");
    }
    client_db.drain(SHUTDOWN_TIMEOUT).await;
    db.close().context("could not close plot database")?;
    Ok(())
}

fn run_console_cmd(cmd: ConsoleCmd, client_db: &ClientDb, tx: &broadcast::Sender<BroadcastMsg>) {
    let shared = &client_db.shared;
    match cmd {
        ConsoleCmd::Sessions => {
            let sessions = shared.registry.sessions();
            println!("{} players online", sessions.len());
            for session in sessions {
                let actor = session.actor();
                println!("  {} ({}) owns {} plots", actor.name, actor.id, session.plot_positions().len());
            }
        }
        ConsoleCmd::Plots => match shared.db.claimed_plots() {
            Ok(plots) => {
                println!("{} plots claimed", plots.len());
                for (pos, plot) in plots {
                    println!("  ({}, {}) {} [{}]", pos.x, pos.z, plot.owner_name, plot.colour.display_name());
                }
            }
            Err(e) => println!("err: {e}"),
        },
        ConsoleCmd::Kick(name) => match shared.registry.find_by_name(&name) {
            Some(session) => {
                if tx.send(BroadcastMsg::Kick(session.actor().id)).is_err() {
                    println!("err: could not reach {name}");
                }
            }
            None => println!("err: no player named {name} is online"),
        },
        ConsoleCmd::Say(text) => {
            if tx.send(BroadcastMsg::Announce(text)).is_err() {
                println!("nobody is online");
            }
        }
        ConsoleCmd::Stop => {}
    }
}
