//! End-to-end tests against a real loopback TCP server, covering the
//! concrete scenarios from the round-engine design: a winning cashout,
//! a losing explosion, and capacity rejection.

use std::time::Duration;

use liftoff::config::{Config, RoundConfig};
use liftoff::game::codec::{read_message, write_message, Message};
use liftoff::game::{AddressFamily, GameServer};
use tokio::net::TcpStream;
use tokio::time::timeout;

fn fast_round_config(capacity: usize) -> Config {
    let mut config = Config::default();
    config.round = RoundConfig {
        capacity,
        betting_secs: 1,
        pause_secs: 1,
        tick_ms: 5,
        multiplier_increment: 0.5,
        explosion_formula: "additive".to_string(),
    };
    config
}

async fn spawn_server(config: Config, port: u16) {
    let server = GameServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(AddressFamily::V4, port).await;
    });
    // give the listener a moment to bind before the test dials in
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn connect_and_bootstrap(port: u16, nickname: &str) -> TcpStream {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let mut name_bytes = [0u8; 13];
    let bytes = nickname.as_bytes();
    name_bytes[..bytes.len()].copy_from_slice(bytes);
    use tokio::io::AsyncWriteExt;
    stream.write_all(&name_bytes).await.unwrap();
    stream
}

#[tokio::test]
async fn single_player_cashes_out_for_a_profit() {
    let port = 17001;
    spawn_server(fast_round_config(10), port).await;
    let mut stream = connect_and_bootstrap(port, "alice").await;

    // Welcome snapshot.
    let welcome = timeout(Duration::from_secs(2), read_message(&mut stream))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(welcome, Message::Start { .. }));

    write_message(&mut stream, &Message::Bet { value: 100.0 })
        .await
        .unwrap();

    // Wait for betting to close.
    loop {
        let msg = timeout(Duration::from_secs(2), read_message(&mut stream))
            .await
            .unwrap()
            .unwrap();
        if matches!(msg, Message::Closed { .. }) {
            break;
        }
    }

    write_message(&mut stream, &Message::Cashout).await.unwrap();

    let mut saw_payout = false;
    for _ in 0..200 {
        let msg = timeout(Duration::from_secs(2), read_message(&mut stream))
            .await
            .unwrap()
            .unwrap();
        match msg {
            Message::Payout { player_profit, .. } => {
                assert!(player_profit > 0.0);
                saw_payout = true;
                break;
            }
            Message::Explode { .. } => break,
            _ => continue,
        }
    }
    assert!(saw_payout, "expected a Payout message after cashing out");
}

#[tokio::test]
async fn player_who_never_cashes_out_loses_the_stake() {
    let port = 17002;
    spawn_server(fast_round_config(10), port).await;
    let mut stream = connect_and_bootstrap(port, "bob").await;

    let _welcome = timeout(Duration::from_secs(2), read_message(&mut stream))
        .await
        .unwrap()
        .unwrap();

    write_message(&mut stream, &Message::Bet { value: 50.0 })
        .await
        .unwrap();

    let mut saw_loss = false;
    for _ in 0..400 {
        let msg = timeout(Duration::from_secs(2), read_message(&mut stream))
            .await
            .unwrap()
            .unwrap();
        if let Message::ProfitPlayer { player_profit } = msg {
            assert!(player_profit < 0.0);
            saw_loss = true;
            break;
        }
    }
    assert!(saw_loss, "expected a ProfitPlayer loss after explosion");
}

#[tokio::test]
async fn eleventh_connection_is_rejected_at_capacity() {
    let port = 17003;
    spawn_server(fast_round_config(1), port).await;

    let _first = connect_and_bootstrap(port, "first").await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut second = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    use tokio::io::AsyncReadExt;
    let mut buf = [0u8; 1];
    let n = timeout(Duration::from_secs(2), second.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0, "rejected connection should observe immediate close");
}
