use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use msgs::{client_server_msg::ClientServerMsg, server_client_msg::ServerClientMsg};
use plots::{
    block::Block,
    command::{Command, CommandContext},
    db::PlotDb,
    pos::BlockPos,
    session::{Actor, Session, SessionRegistry},
    settings::Settings,
    world::BlockWorld,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::broadcast,
    task::JoinHandle,
};

use crate::{broadcast_msg::BroadcastMsg, memory_world::MemoryWorld};

/// State shared by all connections.
pub struct Shared {
    pub settings: Arc<Settings>,
    pub db: Arc<PlotDb>,
    pub registry: SessionRegistry,
    pub world: Arc<MemoryWorld>,
}

pub struct ClientDb {
    pub session_id_counter: u32,
    pub shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

impl ClientDb {
    pub fn new(settings: Arc<Settings>, db: Arc<PlotDb>, world: Arc<MemoryWorld>) -> ClientDb {
        ClientDb {
            session_id_counter: 0,
            shared: Arc::new(Shared {
                settings,
                db,
                registry: SessionRegistry::new(),
                world,
            }),
            tasks: Vec::new(),
        }
    }

    pub fn new_client(&mut self, socket: TcpStream, addr: SocketAddr, tx: broadcast::Sender<BroadcastMsg>) {
        let session_id = self.session_id_counter;
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(spawn_client_process(socket, tx, session_id, addr, self.shared.clone()));
        self.session_id_counter += 1;
        tracing::info!(session_id, %addr, "accepted client");
    }

    /// Waits for every connection task to end, giving up after `timeout`. Connections are told to
    /// end through a shutdown broadcast first.
    pub async fn drain(&mut self, timeout: Duration) {
        let tasks = std::mem::take(&mut self.tasks);
        let count = tasks.len();
        let all = async {
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::warn!("client task failed: {e}");
                }
            }
        };
        if tokio::time::timeout(timeout, all).await.is_err() {
            tracing::warn!(count, "connections still open after {timeout:?}");
        }
    }
}

pub fn spawn_client_process(socket: TcpStream, tx: broadcast::Sender<BroadcastMsg>, session_id: u32, addr: SocketAddr, shared: Arc<Shared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match client_process(socket, tx, session_id, shared).await {
            Ok(()) => tracing::info!(session_id, %addr, "client disconnected"),
            Err(e) => tracing::warn!(session_id, %addr, "disconnecting client: {e:#}"),
        }
    })
}

async fn send(socket: &mut TcpStream, msg: &ServerClientMsg) -> anyhow::Result<()> {
    let mut output_buffer = Vec::new();
    msg.pack(&mut output_buffer)?;
    socket.write_all(&output_buffer).await.context("error while writing to socket")
}

/// Reads until the client says who it is. Returns `None` if the client leaves first.
async fn wait_for_join(socket: &mut TcpStream, input_buffer: &mut Vec<u8>) -> anyhow::Result<Option<Actor>> {
    let mut static_buffer = [0; 1024];
    loop {
        if let Some((cursor, msg)) = ClientServerMsg::dequeue_and_decode(input_buffer) {
            let msg = msg?;
            input_buffer.drain(..cursor);
            match msg {
                ClientServerMsg::Join { id, name } => return Ok(Some(Actor { id, name })),
                ClientServerMsg::Disconnect => return Ok(None),
                msg => bail!("expected join, got {msg:?}"),
            }
        }
        let len = socket.read(&mut static_buffer).await.context("error while reading from socket")?;
        if len == 0 {
            return Ok(None);
        }
        input_buffer.extend(&static_buffer[..len]);
    }
}

async fn client_process(mut socket: TcpStream, tx: broadcast::Sender<BroadcastMsg>, session_id: u32, shared: Arc<Shared>) -> anyhow::Result<()> {
    let mut input_buffer = Vec::new();
    let mut rx = tx.subscribe();

    let Some(actor) = wait_for_join(&mut socket, &mut input_buffer).await? else { return Ok(()) };
    let session = shared.registry.register(actor, shared.settings.clone(), shared.db.clone())?;

    let mut client = Client {
        position: BlockPos::new(2, shared.settings.road_height(), 2),
        socket,
        session,
        shared,
    };
    let result = client.run(&mut rx, session_id, input_buffer).await;
    client.shared.registry.unregister_session(&client.session);
    result
}

struct Client {
    socket: TcpStream,
    session: Arc<Session>,
    shared: Arc<Shared>,
    /// Last known position of the player.
    position: BlockPos,
}

impl Client {
    async fn run(&mut self, rx: &mut broadcast::Receiver<BroadcastMsg>, session_id: u32, mut input_buffer: Vec<u8>) -> anyhow::Result<()> {
        let mut static_buffer = [0; 1024];
        send(&mut self.socket, &ServerClientMsg::AssignSessionId(session_id)).await?;

        // Messages sent along with the join.
        if !self.handle_buffered(&mut input_buffer).await? {
            return Ok(());
        }

        loop {
            tokio::select! {
                biased;
                result = rx.recv() => {
                    let broadcast_msg = match result {
                        Ok(msg) => msg,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(session_id, skipped, "console messages skipped");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => return Ok(()),
                    };

                    match broadcast_msg {
                        BroadcastMsg::Kick(id) => {
                            if id == self.session.actor().id {
                                send(&mut self.socket, &ServerClientMsg::Error("You were kicked from the server.".to_string())).await?;
                                return Ok(());
                            }
                        }
                        BroadcastMsg::Announce(text) => {
                            send(&mut self.socket, &ServerClientMsg::Output(text)).await?;
                        }
                        BroadcastMsg::Shutdown => {
                            send(&mut self.socket, &ServerClientMsg::Error("The server is shutting down.".to_string())).await?;
                            return Ok(());
                        }
                    }
                }
                result = self.socket.read(&mut static_buffer) => {
                    let len = result.context("error while reading from socket")?;
                    if len == 0 {
                        return Ok(());
                    }
                    input_buffer.extend(&static_buffer[..len]);
                    if !self.handle_buffered(&mut input_buffer).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles every complete message in the buffer. Returns false once the client disconnects.
    async fn handle_buffered(&mut self, input_buffer: &mut Vec<u8>) -> anyhow::Result<bool> {
        while let Some((cursor, msg)) = ClientServerMsg::dequeue_and_decode(input_buffer) {
            let msg = msg?;
            input_buffer.drain(..cursor);
            if !self.handle(msg).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Runs `f` on a blocking thread. Events read the plot store and may generate chunks.
    async fn blocking<T: Send + 'static>(&self, f: impl FnOnce(&Session, &Shared) -> T + Send + 'static) -> anyhow::Result<T> {
        let (session, shared) = (self.session.clone(), self.shared.clone());
        tokio::task::spawn_blocking(move || f(&session, &shared)).await.context("event task failed")
    }

    async fn handle(&mut self, msg: ClientServerMsg) -> anyhow::Result<bool> {
        match msg {
            ClientServerMsg::Disconnect => return Ok(false),
            ClientServerMsg::Join { .. } => {
                tracing::warn!(player = %self.session.actor().name, "ignoring second join");
            }
            ClientServerMsg::Move(pos) => {
                let old_pos = self.position;
                let tip = self.blocking(move |session, _| session.handle_move(pos, old_pos)).await?;
                if let Some(tip) = tip {
                    send(&mut self.socket, &ServerClientMsg::Tip(tip)).await?;
                }
                self.position = pos;
            }
            ClientServerMsg::BreakBlock(pos) => {
                let decision = self
                    .blocking(move |session, shared| {
                        let world = shared.world.as_ref();
                        let decision = session.handle_block_break(world, pos);
                        if decision.is_allowed() {
                            world.set_block(pos, Block::Air);
                        }
                        decision
                    })
                    .await?;
                send(&mut self.socket, &ServerClientMsg::EventResult(decision)).await?;
            }
            ClientServerMsg::PlaceBlock(pos, block) => {
                let decision = self
                    .blocking(move |session, shared| {
                        let world = shared.world.as_ref();
                        let decision = session.handle_block_place(world, pos);
                        if decision.is_allowed() {
                            world.set_block(pos, block);
                        }
                        decision
                    })
                    .await?;
                send(&mut self.socket, &ServerClientMsg::EventResult(decision)).await?;
            }
            ClientServerMsg::UseItemOnBlock { pos, face, held_is_block } => {
                let decision = self
                    .blocking(move |session, shared| session.handle_item_use_on_block(shared.world.as_ref(), pos, face, held_is_block))
                    .await?;
                send(&mut self.socket, &ServerClientMsg::EventResult(decision)).await?;
            }
            ClientServerMsg::Command(text) => {
                self.run_command(text).await?;
            }
        }
        Ok(true)
    }

    /// Commands may rewrite whole plots, so they run on a blocking thread too.
    async fn run_command(&mut self, text: String) -> anyhow::Result<()> {
        let position = self.position;
        let result = self
            .blocking(move |session, shared| {
                let ctx = CommandContext {
                    session,
                    position,
                    world: shared.world.as_ref(),
                    registry: &shared.registry,
                };
                Command::parse(&text).and_then(|cmd| cmd.run(&ctx))
            })
            .await?;

        match result {
            Ok(output) => {
                send(&mut self.socket, &ServerClientMsg::Output(output.message)).await?;
                if let Some([x, y, z]) = output.teleport {
                    self.position = BlockPos::new(x.floor() as i32, y.floor() as i32, z.floor() as i32);
                    send(&mut self.socket, &ServerClientMsg::Teleport([x, y, z])).await?;
                }
            }
            Err(e) => {
                tracing::debug!(player = %self.session.actor().name, "command failed: {e}");
                send(&mut self.socket, &ServerClientMsg::Error(e.to_string())).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use plots::session::Decision;
    use tokio::net::TcpListener;
    use uuid::Uuid;

    use super::*;

    struct TestClient {
        stream: TcpStream,
        input_buffer: Vec<u8>,
    }

    impl TestClient {
        async fn send(&mut self, msg: ClientServerMsg) {
            let mut output_buffer = Vec::new();
            msg.pack(&mut output_buffer).unwrap();
            self.stream.write_all(&output_buffer).await.unwrap();
        }

        async fn recv(&mut self) -> ServerClientMsg {
            let mut static_buffer = [0; 1024];
            loop {
                if let Some((cursor, msg)) = ServerClientMsg::dequeue_and_decode(&self.input_buffer) {
                    self.input_buffer.drain(..cursor);
                    return msg.unwrap();
                }
                let len = self.stream.read(&mut static_buffer).await.unwrap();
                assert!(len > 0, "server closed the connection");
                self.input_buffer.extend(&static_buffer[..len]);
            }
        }
    }

    async fn start() -> (tempfile::TempDir, TestClient, broadcast::Sender<BroadcastMsg>, ClientDb) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(Settings { plot_width: 32, ..Settings::default() });
        let db = Arc::new(PlotDb::open(dir.path().join("plots")).unwrap());
        let world = Arc::new(MemoryWorld::new(&settings));
        let mut client_db = ClientDb::new(settings, db, world);

        let listener = TcpListener::bind(SocketAddr::new(IpAddr::from(Ipv4Addr::LOCALHOST), 0)).await.unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (socket, addr) = listener.accept().await.unwrap();
        let (tx, _) = broadcast::channel(100);
        client_db.new_client(socket, addr, tx.clone());

        (dir, TestClient { stream, input_buffer: Vec::new() }, tx, client_db)
    }

    #[tokio::test]
    async fn claim_then_build() {
        let (_dir, mut client, _tx, client_db) = start().await;
        let shared = client_db.shared.clone();
        client.send(ClientServerMsg::Join { id: Uuid::new_v4(), name: "Steve".to_string() }).await;
        assert_eq!(client.recv().await, ServerClientMsg::AssignSessionId(0));

        let inside = BlockPos::new(10, 23, 10);
        client.send(ClientServerMsg::PlaceBlock(inside, Block::Stone)).await;
        assert_eq!(client.recv().await, ServerClientMsg::EventResult(Decision::Deny));

        client.send(ClientServerMsg::Move(inside)).await;
        assert!(matches!(client.recv().await, ServerClientMsg::Tip(tip) if tip.contains("free")));

        client.send(ClientServerMsg::Command("/p claim".to_string())).await;
        assert!(matches!(client.recv().await, ServerClientMsg::Output(text) if text.contains("(1/16)")));

        client.send(ClientServerMsg::PlaceBlock(inside, Block::Stone)).await;
        assert_eq!(client.recv().await, ServerClientMsg::EventResult(Decision::Allow));
        assert_eq!(shared.world.block(inside), Block::Stone);

        client.send(ClientServerMsg::Command("/p tp 2".to_string())).await;
        assert!(matches!(client.recv().await, ServerClientMsg::Error(text) if text.starts_with("Unknown plot")));

        client.send(ClientServerMsg::Command("/p tp 1".to_string())).await;
        assert!(matches!(client.recv().await, ServerClientMsg::Output(_)));
        assert_eq!(client.recv().await, ServerClientMsg::Teleport([2.5, 24.5, 2.5]));
    }

    #[tokio::test]
    async fn kicked_players_are_unregistered() {
        let (_dir, mut client, tx, client_db) = start().await;
        let shared = client_db.shared.clone();
        let id = Uuid::new_v4();
        client.send(ClientServerMsg::Join { id, name: "Alex".to_string() }).await;
        assert_eq!(client.recv().await, ServerClientMsg::AssignSessionId(0));
        assert!(shared.registry.lookup(id).is_some());

        tx.send(BroadcastMsg::Kick(id)).unwrap();
        assert!(matches!(client.recv().await, ServerClientMsg::Error(_)));

        let mut static_buffer = [0; 16];
        assert_eq!(client.stream.read(&mut static_buffer).await.unwrap(), 0);
        assert!(shared.registry.lookup(id).is_none());
    }

    #[tokio::test]
    async fn draining_waits_for_connections_to_end() {
        let (_dir, mut client, tx, mut client_db) = start().await;
        let id = Uuid::new_v4();
        client.send(ClientServerMsg::Join { id, name: "Alex".to_string() }).await;
        assert_eq!(client.recv().await, ServerClientMsg::AssignSessionId(0));
        client.send(ClientServerMsg::Command("/p claim".to_string())).await;

        tx.send(BroadcastMsg::Shutdown).unwrap();
        client_db.drain(Duration::from_secs(5)).await;
        assert!(client_db.tasks.is_empty());
        assert!(client_db.shared.registry.lookup(id).is_none());
        client_db.shared.db.close().unwrap();
    }
}
