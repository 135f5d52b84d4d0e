use anyhow::Context;
use console_cmd::ConsoleCmd;
use console_input::console_input_thread;
use msgs::{client_server_msg::ClientServerMsg, server_client_msg::ServerClientMsg};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{tcp::OwnedReadHalf, TcpStream},
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod console_cmd;
mod console_input;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:19132".to_string());
    let name = args.next().unwrap_or_else(|| "Steve".to_string());

    let stream = TcpStream::connect(&addr).await.with_context(|| format!("could not connect to {addr}"))?;
    let (read_half, mut write_half) = stream.into_split();
    tracing::info!(%addr, %name, "connected");

    let mut output_buffer = Vec::new();
    ClientServerMsg::Join { id: Uuid::new_v4(), name }.pack(&mut output_buffer)?;
    write_half.write_all(&output_buffer).await?;

    let reader = tokio::spawn(read_server_msgs(read_half));
    let mut console_receiver = console_input_thread();

    while let Some(console_str) = console_receiver.recv().await {
        let msg = match ConsoleCmd::parse(console_str.trim()) {
            Ok(ConsoleCmd::Send(msg)) => msg,
            Ok(ConsoleCmd::Quit) => break,
            Err(err) => {
                println!("err: {err}");
                continue;
            }
        };
        if reader.is_finished() {
            break;
        }
        let mut output_buffer = Vec::new();
        msg.pack(&mut output_buffer)?;
        write_half.write_all(&output_buffer).await.context("error while writing to server")?;
    }

    let mut output_buffer = Vec::new();
    ClientServerMsg::Disconnect.pack(&mut output_buffer)?;
    if let Err(e) = write_half.write_all(&output_buffer).await {
        tracing::debug!("could not send disconnect: {e}");
    }
    Ok(())
}

/// Prints every message from the server until the connection closes.
async fn read_server_msgs(mut read_half: OwnedReadHalf) {
    let mut static_buffer = [0; 1024];
    let mut input_buffer = Vec::new();
    loop {
        let len = match read_half.read(&mut static_buffer).await {
            Ok(0) => {
                println!("server closed the connection");
                return;
            }
            Ok(len) => len,
            Err(e) => {
                println!("error while reading from server: {e}");
                return;
            }
        };
        input_buffer.extend(&static_buffer[..len]);

        while let Some((cursor, msg)) = ServerClientMsg::dequeue_and_decode(&input_buffer) {
            match msg {
                Ok(ServerClientMsg::Tip(text)) => println!("tip: {text}"),
                Ok(ServerClientMsg::Output(text)) => println!("{text}"),
                Ok(ServerClientMsg::Error(text)) => println!("error: {text}"),
                Ok(msg) => println!("{msg:?}"),
                Err(e) => println!("error while decode msg: {e}"),
            }
            input_buffer.drain(..cursor);
        }
    }
}
