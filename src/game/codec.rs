//! Wire protocol for the round engine.
//!
//! Every message after the initial nickname bootstrap is framed as a
//! `u32` big-endian byte length followed by that many bytes of
//! `bincode`-encoded [`Message`]. This replaces the original design's
//! reliance on both peers sharing one compiler's in-memory struct
//! layout with an explicit, portable encode/decode step.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Maximum nickname length, in bytes, including no terminator.
pub const NICKNAME_MAX_LEN: usize = 13;

/// Upper bound on a single encoded frame. Generous for this protocol's
/// small fixed-shape messages; guards against a hostile or corrupt
/// length prefix causing an unbounded allocation.
const MAX_FRAME_LEN: u32 = 4096;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("connection closed")]
    Eof,
    #[error("frame length {0} exceeds maximum {MAX_FRAME_LEN}")]
    FrameTooLarge(u32),
    #[error("malformed frame: {0}")]
    Decode(#[from] Box<bincode::ErrorKind>),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every event exchanged between a session and the engine once the
/// nickname bootstrap has completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Betting window opened or a late joiner's snapshot of it.
    Start {
        time_remaining: f32,
        player_profit: f32,
        house_profit: f32,
    },
    /// Betting window closed; flight is about to begin.
    Closed { house_profit: f32 },
    /// Current multiplier during flight, sent only to players still in play.
    Multiplier { value: f32 },
    /// The round's explosion point.
    Explode { value: f32 },
    /// A cashout settlement, targeted at the cashing-out player.
    Payout { value: f32, player_profit: f32 },
    /// A loss settlement for a player who did not cash out in time.
    ProfitPlayer { player_profit: f32 },
    /// House balance update broadcast at the end of a round.
    ProfitHouse { house_profit: f32 },
    /// Client quitting, or (unused today) a server-initiated shutdown.
    Bye,
    /// Client placing a stake for the current betting window.
    Bet { value: f32 },
    /// Client attempting to cash out during flight.
    Cashout,
}

/// Read the nickname bootstrap: up to [`NICKNAME_MAX_LEN`] raw bytes,
/// NUL-terminated. Mirrors the original protocol's single-`recv`
/// expectation — one read is expected to carry the whole name.
pub async fn read_nickname<R: AsyncReadExt + Unpin>(r: &mut R) -> Result<String, CodecError> {
    let mut buf = [0u8; NICKNAME_MAX_LEN];
    let n = r.read(&mut buf).await?;
    if n == 0 {
        return Err(CodecError::Eof);
    }
    let end = buf[..n].iter().position(|&b| b == 0).unwrap_or(n);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Read one length-prefixed, bincode-encoded [`Message`].
pub async fn read_message<R: AsyncReadExt + Unpin>(r: &mut R) -> Result<Message, CodecError> {
    let len = match r.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(CodecError::Eof),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge(len));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf).await?;
    let msg: Message = bincode::deserialize(&buf)?;
    Ok(msg)
}

/// Write one length-prefixed, bincode-encoded [`Message`].
pub async fn write_message<W: AsyncWriteExt + Unpin>(
    w: &mut W,
    msg: &Message,
) -> Result<(), CodecError> {
    let bytes = bincode::serialize(msg)?;
    w.write_u32(bytes.len() as u32).await?;
    w.write_all(&bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_every_variant() {
        let samples = vec![
            Message::Start {
                time_remaining: 7.0,
                player_profit: 0.0,
                house_profit: 0.0,
            },
            Message::Closed { house_profit: 12.5 },
            Message::Multiplier { value: 1.42 },
            Message::Explode { value: 2.71 },
            Message::Payout {
                value: 120.0,
                player_profit: 20.0,
            },
            Message::ProfitPlayer { player_profit: -50.0 },
            Message::ProfitHouse { house_profit: 35.0 },
            Message::Bye,
            Message::Bet { value: 25.0 },
            Message::Cashout,
        ];

        for msg in samples {
            let mut buf = Vec::new();
            write_message(&mut buf, &msg).await.unwrap();
            let mut cursor = std::io::Cursor::new(buf);
            let decoded = read_message(&mut cursor).await.unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[tokio::test]
    async fn nickname_stops_at_nul() {
        let mut input = b"alice\0\0\0\0\0\0\0\0".to_vec();
        input.truncate(NICKNAME_MAX_LEN);
        let mut cursor = std::io::Cursor::new(input);
        let name = read_nickname(&mut cursor).await.unwrap();
        assert_eq!(name, "alice");
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge(_)));
    }
}
