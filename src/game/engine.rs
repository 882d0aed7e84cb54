//! The round engine.
//!
//! This is the single actor that owns every piece of mutable game
//! state — the player registry, the round/flight state machine, and
//! the ledger. Session tasks never touch that state directly; they
//! send [`Command`]s over an `mpsc` channel and the engine applies
//! them one at a time, interleaved with its own phase timer. There is
//! exactly one writer, so there is no lock to order.

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};

use crate::game::codec::Message;
use crate::game::explosion::ExplosionModel;
use crate::game::registry::{PlayerId, Registry, Reservation};
use crate::metrics;

/// Tuning constants pulled in from [`crate::config::RoundConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RoundTiming {
    pub betting_secs: u32,
    pub pause_secs: u32,
    pub tick_ms: u64,
    pub multiplier_increment: f32,
}

impl Default for RoundTiming {
    fn default() -> Self {
        RoundTiming {
            betting_secs: 10,
            pause_secs: 5,
            tick_ms: 100,
            multiplier_increment: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Betting,
    Flight,
    Pause,
}

pub enum Command {
    Connect {
        reply: oneshot::Sender<Reservation>,
    },
    SetName {
        id: PlayerId,
        name: String,
    },
    Bet {
        id: PlayerId,
        value: f32,
    },
    Cashout {
        id: PlayerId,
    },
    Disconnect {
        id: PlayerId,
    },
}

pub type CommandSender = mpsc::UnboundedSender<Command>;

pub struct Engine {
    registry: Registry,
    phase: Phase,
    round_id: u64,
    time_remaining: f32,
    current_multiplier: f32,
    explosion_multiplier: f32,
    house_profit: f32,
    explosion_model: Box<dyn ExplosionModel>,
    timing: RoundTiming,
}

impl Engine {
    pub fn new(capacity: usize, explosion_model: Box<dyn ExplosionModel>, timing: RoundTiming) -> Self {
        Engine {
            registry: Registry::new(capacity),
            phase: Phase::Pause,
            round_id: 0,
            time_remaining: 0.0,
            current_multiplier: 1.0,
            explosion_multiplier: 0.0,
            house_profit: 0.0,
            explosion_model,
            timing,
        }
    }

    /// Drive the round state machine forever. Consumes `self` and the
    /// command channel; intended to be the body of a single
    /// long-lived `tokio::spawn`.
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            self.enter_betting();
            self.run_betting_phase(&mut cmd_rx).await;

            self.enter_flight();
            self.run_flight_phase(&mut cmd_rx).await;

            self.settle_round();
            self.run_pause_phase(&mut cmd_rx).await;
        }
    }

    // ---- phase transitions -------------------------------------------------

    fn enter_betting(&mut self) {
        self.phase = Phase::Betting;
        self.round_id += 1;
        self.current_multiplier = 1.0;
        self.explosion_multiplier = 0.0;
        self.time_remaining = self.timing.betting_secs as f32;
        self.registry.reset_all_for_round();
        metrics::record_round_started();
        info!(
            "event=start | id=* | round={} | N={} | time_remaining={}",
            self.round_id,
            self.registry.occupied(),
            self.time_remaining
        );
        self.broadcast_start();
    }

    fn enter_flight(&mut self) {
        self.phase = Phase::Flight;
        let n = self.registry.iter().filter(|s| s.has_bet).count() as u32;
        let v: f32 = self.registry.iter().filter(|s| s.has_bet).map(|s| s.bet_value).sum();
        self.explosion_multiplier = self.explosion_model.compute(n, v);
        info!(
            "event=closed | id=* | round={} | N={} | V={} | me={}",
            self.round_id, n, v, self.explosion_multiplier
        );
        self.broadcast(Message::Closed {
            house_profit: self.house_profit,
        });
    }

    fn settle_round(&mut self) {
        self.phase = Phase::Pause;
        info!(
            "event=explode | id=* | round={} | me={}",
            self.round_id, self.explosion_multiplier
        );
        self.broadcast(Message::Explode {
            value: self.explosion_multiplier,
        });

        let mut losers = Vec::new();
        for slot in self.registry.iter() {
            if slot.has_bet && !slot.has_cashed_out {
                losers.push((slot.id, slot.bet_value));
            }
        }
        for (id, stake) in losers {
            if let Some(slot) = self.registry.find_mut(id) {
                slot.current_profit -= stake;
                self.house_profit += stake;
                info!(
                    "event=profit_player | id={} | bet={} | player_profit={}",
                    id.0, stake, slot.current_profit
                );
                let _ = slot.outbox.try_send(Message::ProfitPlayer {
                    player_profit: slot.current_profit,
                });
            }
            metrics::record_round_loss();
        }
        info!(
            "event=profit_house | id=* | house_profit={}",
            self.house_profit
        );
        self.broadcast(Message::ProfitHouse {
            house_profit: self.house_profit,
        });
        self.registry.reap_pending_releases();
    }

    // ---- phase runners -------------------------------------------------

    async fn run_betting_phase(&mut self, cmd_rx: &mut mpsc::UnboundedReceiver<Command>) {
        let mut ticks = tokio::time::interval(Duration::from_secs(1));
        ticks.tick().await; // first tick fires immediately; consume it
        while self.time_remaining > 0.0 {
            tokio::select! {
                _ = ticks.tick() => {
                    self.time_remaining -= 1.0;
                }
                maybe_cmd = cmd_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => return,
                    }
                }
            }
        }
    }

    async fn run_flight_phase(&mut self, cmd_rx: &mut mpsc::UnboundedReceiver<Command>) {
        let mut ticks = tokio::time::interval(Duration::from_millis(self.timing.tick_ms));
        ticks.tick().await;
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    self.current_multiplier += self.timing.multiplier_increment;
                    if self.current_multiplier >= self.explosion_multiplier {
                        self.current_multiplier = self.explosion_multiplier;
                        return;
                    }
                    self.broadcast_multiplier();
                }
                maybe_cmd = cmd_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => return,
                    }
                }
            }
        }
    }

    async fn run_pause_phase(&mut self, cmd_rx: &mut mpsc::UnboundedReceiver<Command>) {
        let deadline = Instant::now() + Duration::from_secs(self.timing.pause_secs as u64);
        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return,
                maybe_cmd = cmd_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => return,
                    }
                }
            }
        }
    }

    // ---- command handling -------------------------------------------------

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { reply } => {
                let reservation = self.registry.acquire();
                if let Reservation::Granted { id, .. } = &reservation {
                    info!("event=connect | id={} | N={}", id.0, self.registry.occupied());
                    self.send_welcome(*id);
                } else {
                    warn!("event=reject | id=* | reason=capacity | N={}", self.registry.occupied());
                }
                let _ = reply.send(reservation);
            }
            Command::SetName { id, name } => {
                debug!("event=nickname | id={} | name={}", id.0, crate::logutil::escape_log(&name));
                self.registry.set_name(id, name);
            }
            Command::Bet { id, value } => self.apply_bet(id, value),
            Command::Cashout { id } => self.apply_cashout(id),
            Command::Disconnect { id } => {
                info!("event=bye | id={}", id.0);
                self.registry
                    .release(id, self.phase == Phase::Flight);
            }
        }
    }

    fn apply_bet(&mut self, id: PlayerId, value: f32) {
        if self.phase != Phase::Betting || value <= 0.0 {
            return;
        }
        if let Some(slot) = self.registry.find_mut(id) {
            if slot.has_bet {
                return;
            }
            slot.has_bet = true;
            slot.bet_value = value;
            info!("event=bet | id={} | bet={}", id.0, value);
            metrics::record_bet_placed();
        }
    }

    fn apply_cashout(&mut self, id: PlayerId) {
        if self.phase != Phase::Flight {
            return;
        }
        let Some(slot) = self.registry.find_mut(id) else {
            return;
        };
        if !slot.has_bet || slot.has_cashed_out {
            return;
        }
        slot.has_cashed_out = true;
        let winnings = slot.bet_value * self.current_multiplier;
        let profit_delta = winnings - slot.bet_value;
        slot.current_profit += profit_delta;
        self.house_profit -= profit_delta;
        info!(
            "event=payout | id={} | m={} | payout={} | player_profit={}",
            id.0, self.current_multiplier, winnings, slot.current_profit
        );
        let _ = slot.outbox.try_send(Message::Payout {
            value: self.current_multiplier,
            player_profit: slot.current_profit,
        });
        metrics::record_round_win();
    }

    // ---- fan-out -------------------------------------------------

    fn send_welcome(&mut self, id: PlayerId) {
        let phase_msg = match self.phase {
            Phase::Betting => Message::Start {
                time_remaining: self.time_remaining,
                player_profit: 0.0,
                house_profit: self.house_profit,
            },
            Phase::Flight | Phase::Pause => Message::Closed {
                house_profit: self.house_profit,
            },
        };
        if let Some(slot) = self.registry.find_mut(id) {
            let _ = slot.outbox.try_send(phase_msg);
        }
    }

    fn broadcast_start(&mut self) {
        let house_profit = self.house_profit;
        let time_remaining = self.time_remaining;
        for slot in self.registry.iter_mut() {
            let msg = Message::Start {
                time_remaining,
                player_profit: slot.current_profit,
                house_profit,
            };
            if slot.outbox.try_send(msg).is_err() {
                warn!("event=drop | id={} | msg=start", slot.id.0);
            }
        }
    }

    fn broadcast_multiplier(&mut self) {
        let value = self.current_multiplier;
        for slot in self.registry.iter_mut() {
            if slot.has_bet && !slot.has_cashed_out {
                // Multiplier ticks are the only class allowed to drop
                // silently under backpressure; a wedged client simply
                // misses intermediate ticks, not lifecycle events.
                let _ = slot.outbox.try_send(Message::Multiplier { value });
            }
        }
    }

    fn broadcast(&mut self, msg: Message) {
        for slot in self.registry.iter_mut() {
            if slot.outbox.try_send(msg.clone()).is_err() {
                warn!("event=drop | id={} | msg={:?}", slot.id.0, msg);
            }
        }
    }
}
