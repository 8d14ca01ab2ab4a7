use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::client::{Client, ClientRegistry};
use crate::protocol::responses::{
    READY, SERVICE_UNAVAILABLE, STORAGE_EXCEEDED, SYNTAX_ERROR, TRANSFER_COMPLETE_LINE,
    format_response,
};
use crate::protocol::{Command, CommandStatus, Reply, handle_command, parse_command};
use crate::server::ServerContext;

/// Writes a reply, followed by the completion line for data replies.
async fn send_reply<W>(writer: &mut W, reply: &Reply) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match reply {
        Reply::Line(line) => writer.write_all(line.as_bytes()).await?,
        Reply::Data { header, body } => {
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(body).await?;
            writer.write_all(TRANSFER_COMPLETE_LINE.as_bytes()).await?;
        }
    }
    writer.flush().await
}

async fn send_line<W>(writer: &mut W, code: u16, message: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    send_reply(writer, &Reply::Line(format_response(code, message))).await
}

/// Handles a client session using Tokio async runtime.
///
/// - Greets the client and reads command lines with a length cap.
/// - Reads the raw payload announced by upload and edit commands.
/// - Dispatches commands on the blocking pool, since storage is synchronous.
/// - Keeps `registry` in step with the session's login state.
pub async fn handle_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    registry: Arc<Mutex<ClientRegistry>>,
    context: Arc<ServerContext>,
) {
    if let Err(e) = run_session(stream, client_addr, &registry, context).await {
        warn!("Session with {} ended with error: {}", client_addr, e);
    }

    if let Some(username) = registry.lock().await.remove(&client_addr) {
        info!("Released session slot of {} ({})", username, client_addr);
    }
    info!("Client {} disconnected", client_addr);
}

async fn run_session(
    stream: TcpStream,
    client_addr: SocketAddr,
    registry: &Mutex<ClientRegistry>,
    context: Arc<ServerContext>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::new();
    let max_command_length = context.startup.max_command_length;

    send_line(&mut write_half, READY, "Welcome to RAX File Server").await?;

    let mut client = Client::new(client_addr);

    loop {
        line.clear();
        let n = (&mut reader)
            .take(max_command_length as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if n == 0 {
            info!("Connection closed by client {}", client_addr);
            return Ok(());
        }

        // Without a newline inside the cap there is no way to find the next command
        if line.len() > max_command_length && !line.ends_with(b"\n") {
            send_line(&mut write_half, SYNTAX_ERROR, "Command too long").await?;
            return Ok(());
        }

        let text = String::from_utf8_lossy(&line);
        let command = parse_command(&text);
        if let Command::PASS(_) = command {
            info!("Received from {}: PASS ****", client_addr);
        } else {
            info!("Received from {}: {:?}", client_addr, command);
        }

        let payload = match command.payload_size() {
            Some(size) => {
                let max = context.runtime.read().await.max_upload_size_bytes();
                if size > max {
                    warn!(
                        "Rejecting {} byte payload from {} (limit {})",
                        size, client_addr, max
                    );
                    let message = format!("Payload exceeds {max} bytes");
                    send_line(&mut write_half, STORAGE_EXCEEDED, &message).await?;
                    return Ok(());
                }
                let mut bytes = vec![0u8; size as usize];
                reader.read_exact(&mut bytes).await?;
                Some(bytes)
            }
            None => None,
        };

        let was_logged_in = client.is_logged_in();
        let ctx = Arc::clone(&context);
        let dispatched = tokio::task::spawn_blocking(move || {
            let result = handle_command(&mut client, command, payload, &ctx);
            (client, result)
        })
        .await;

        let result = match dispatched {
            Ok((returned, result)) => {
                client = returned;
                result
            }
            Err(e) => {
                error!("Command handler for {} failed: {}", client_addr, e);
                return Err(std::io::Error::other(e));
            }
        };

        let username = client.identity().map(|identity| identity.username.clone());
        match (was_logged_in, username) {
            (false, Some(username)) => {
                let max_clients = context.runtime.read().await.max_clients;
                let mut clients = registry.lock().await;
                if !clients.try_register(client_addr, &username, max_clients) {
                    warn!(
                        "Refusing login of {} from {}: {} sessions active",
                        username,
                        client_addr,
                        clients.len()
                    );
                    drop(clients);
                    send_line(&mut write_half, SERVICE_UNAVAILABLE, "Too many clients").await?;
                    return Ok(());
                }
                info!(
                    "Authenticated client: {} ({}/{} clients)",
                    client_addr,
                    clients.len(),
                    max_clients
                );
            }
            (true, None) => {
                registry.lock().await.remove(&client_addr);
            }
            _ => {}
        }

        send_reply(&mut write_half, &result.reply).await?;

        match result.status {
            CommandStatus::CloseConnection => {
                info!("Client {} requested to quit", client_addr);
                return Ok(());
            }
            CommandStatus::Failure(reason) => {
                info!("Command from {} failed: {}", client_addr, reason);
            }
            CommandStatus::Success => {}
        }
    }
}
