//! Per-connection protocol handling.
//!
//! Each accepted connection gets one reader loop (this task) and one
//! writer task. Neither ever touches engine state directly — they only
//! exchange [`Command`]s and [`Message`]s over channels. This is the
//! boundary where untrusted client bytes become validated, typed
//! intents.

use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use crate::game::codec::{self, Message};
use crate::game::engine::{Command, CommandSender};
use crate::game::registry::{PlayerId, Reservation};
use crate::logutil::escape_log;
use crate::validation::validate_nickname;

/// Handle one accepted TCP connection end to end: request a slot from
/// the engine, read the nickname bootstrap, then relay client intents
/// and engine events until the connection closes.
pub async fn handle_connection(stream: TcpStream, peer: std::net::SocketAddr, cmd_tx: CommandSender) {
    let _ = stream.set_nodelay(true);

    let (reply_tx, reply_rx) = oneshot::channel();
    if cmd_tx.send(Command::Connect { reply: reply_tx }).is_err() {
        warn!("event=engine_gone | peer={}", peer);
        return;
    }
    let reservation = match reply_rx.await {
        Ok(r) => r,
        Err(_) => {
            warn!("event=engine_gone | peer={}", peer);
            return;
        }
    };
    let (id, outbox_rx) = match reservation {
        Reservation::Granted { id, outbox_rx } => (id, outbox_rx),
        Reservation::Full => {
            info!("event=reject | peer={} | reason=capacity", peer);
            return;
        }
    };

    let (mut read_half, write_half) = stream.into_split();
    tokio::spawn(writer_loop(write_half, outbox_rx, id));

    match codec::read_nickname(&mut read_half).await {
        Ok(name) => {
            let name = match validate_nickname(&name) {
                Ok(()) => name,
                Err(e) => {
                    debug!("event=bad_nickname | id={} | reason={}", id.0, e);
                    String::from("guest")
                }
            };
            info!("event=join | id={} | name={}", id.0, escape_log(&name));
            let _ = cmd_tx.send(Command::SetName { id, name });
        }
        Err(_) => {
            let _ = cmd_tx.send(Command::Disconnect { id });
            return;
        }
    }

    ingress_loop(read_half, id, &cmd_tx).await;
    let _ = cmd_tx.send(Command::Disconnect { id });
}

async fn ingress_loop<R: AsyncReadExt + Unpin>(mut read_half: R, id: PlayerId, cmd_tx: &CommandSender) {
    loop {
        match codec::read_message(&mut read_half).await {
            Ok(Message::Bet { value }) => {
                if cmd_tx.send(Command::Bet { id, value }).is_err() {
                    return;
                }
            }
            Ok(Message::Cashout) => {
                if cmd_tx.send(Command::Cashout { id }).is_err() {
                    return;
                }
            }
            Ok(Message::Bye) => {
                debug!("event=client_bye | id={}", id.0);
                return;
            }
            Ok(other) => {
                debug!("event=unexpected_client_msg | id={} | msg={:?}", id.0, other);
            }
            Err(e) => {
                debug!("event=disconnect | id={} | reason={}", id.0, e);
                return;
            }
        }
    }
}

async fn writer_loop(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut outbox_rx: mpsc::Receiver<Message>,
    id: PlayerId,
) {
    while let Some(msg) = outbox_rx.recv().await {
        if let Err(e) = codec::write_message(&mut write_half, &msg).await {
            debug!("event=write_failed | id={} | reason={}", id.0, e);
            return;
        }
    }
    let _ = write_half.shutdown().await;
}
