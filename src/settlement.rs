//! Settlement coordinator: the only write path into the ledger.
//!
//! One settlement = validate, lease the wallet, check the balance, resolve
//! the game, commit everything atomically, release. Failures before the
//! commit leave the wallet untouched; an aborted commit discards the whole
//! unit. Deposits and withdrawals run through the same lease-and-commit
//! discipline.

use crate::config::CasinoConfig;
use crate::errors::{SettlementError, SettlementResult, StoreError, TimeoutPhase};
use crate::games::types::{GameParams, GameType, MoneyType, Outcome, OutcomeDetail, RoundResult};
use crate::games::resolve;
use crate::ledger::{
    Balances, EntryType, GameSession, GameStats, LedgerEntry, RequestMetadata, WalletKey,
};
use crate::ledger_store::{LedgerStore, Page, WriteSet};
use crate::metrics::SettlementMonitor;
use crate::rng::RngProvider;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// One play, as submitted by a caller.
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub player: String,
    pub money: MoneyType,
    pub game: GameType,
    pub bet_amount: Decimal,
    pub params: GameParams,
    pub metadata: RequestMetadata,
}

/// What the caller gets back from a settled play.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayReceipt {
    pub session_id: Uuid,
    pub result: RoundResult,
    pub win_amount: Decimal,
    pub new_balance: Decimal,
    pub detail: OutcomeDetail,
}

pub struct SettlementCoordinator<P: RngProvider> {
    store: Arc<LedgerStore>,
    rng: P,
    config: CasinoConfig,
    monitor: Arc<SettlementMonitor>,
}

impl<P: RngProvider> SettlementCoordinator<P> {
    pub fn new(store: Arc<LedgerStore>, rng: P, config: CasinoConfig) -> Self {
        Self {
            store,
            rng,
            config,
            monitor: Arc::new(SettlementMonitor::new()),
        }
    }

    pub fn monitor(&self) -> &SettlementMonitor {
        &self.monitor
    }

    /// Settle one play end to end.
    pub async fn settle(&self, request: PlayRequest) -> SettlementResult<PlayReceipt> {
        check_player(&request.player)?;
        self.check_bet_bounds(request.bet_amount)?;

        let wallet = WalletKey::new(request.player.clone(), request.money);
        let _lease = self
            .store
            .lease(&wallet, self.config.lease_timeout())
            .await?;

        let balance = self.store.wallet_balance(&wallet)?;
        if balance < request.bet_amount {
            self.monitor.record_rejection();
            return Err(SettlementError::InsufficientBalance {
                balance,
                required: request.bet_amount,
            });
        }

        let outcome = {
            let mut rng = self.rng.round_rng();
            resolve(request.game, &request.params, request.bet_amount, &mut rng)?
        };

        let (session, write_set) = self.build_round_writes(&wallet, &request, balance, &outcome)?;
        let new_balance = write_set.new_balance;
        self.commit(write_set).await?;

        self.monitor
            .record_round(outcome.result, request.bet_amount, outcome.win_amount);
        info!(
            player = %request.player,
            game = %request.game,
            result = %outcome.result,
            bet = %request.bet_amount,
            won = %outcome.win_amount,
            "Settled play"
        );

        Ok(PlayReceipt {
            session_id: session,
            result: outcome.result,
            win_amount: outcome.win_amount,
            new_balance,
            detail: outcome.detail,
        })
    }

    /// Credit a wallet. Creates it on first use.
    pub async fn deposit(
        &self,
        player: &str,
        money: MoneyType,
        amount: Decimal,
        metadata: RequestMetadata,
    ) -> SettlementResult<Decimal> {
        check_player(player)?;
        self.check_transfer_bounds(amount)?;

        let wallet = WalletKey::new(player, money);
        let _lease = self
            .store
            .lease(&wallet, self.config.lease_timeout())
            .await?;

        let balance = self.store.wallet_balance(&wallet)?;
        let entry = LedgerEntry::new(&wallet, EntryType::Deposit, amount, balance, None, metadata);
        let new_balance = entry.balance_after;
        self.commit(WriteSet {
            wallet,
            new_balance,
            entries: vec![entry],
            session: None,
            stats: None,
        })
        .await?;

        info!(player, money = %money, %amount, "Deposit committed");
        Ok(new_balance)
    }

    /// Debit a wallet. Fails without touching it when funds are short.
    pub async fn withdraw(
        &self,
        player: &str,
        money: MoneyType,
        amount: Decimal,
        metadata: RequestMetadata,
    ) -> SettlementResult<Decimal> {
        check_player(player)?;
        self.check_transfer_bounds(amount)?;

        let wallet = WalletKey::new(player, money);
        let _lease = self
            .store
            .lease(&wallet, self.config.lease_timeout())
            .await?;

        let balance = self.store.wallet_balance(&wallet)?;
        if balance < amount {
            return Err(SettlementError::InsufficientBalance {
                balance,
                required: amount,
            });
        }

        let entry = LedgerEntry::new(
            &wallet,
            EntryType::Withdrawal,
            amount,
            balance,
            None,
            metadata,
        );
        let new_balance = entry.balance_after;
        self.commit(WriteSet {
            wallet,
            new_balance,
            entries: vec![entry],
            session: None,
            stats: None,
        })
        .await?;

        info!(player, money = %money, %amount, "Withdrawal committed");
        Ok(new_balance)
    }

    pub fn balances(&self, player: &str) -> SettlementResult<Balances> {
        check_player(player)?;
        Ok(self.store.balances(player)?)
    }

    pub fn entry_history(
        &self,
        player: &str,
        money: MoneyType,
        cursor: Option<&str>,
        limit: usize,
    ) -> SettlementResult<Page<LedgerEntry>> {
        check_player(player)?;
        let wallet = WalletKey::new(player, money);
        Ok(self.store.entry_history(&wallet, cursor, limit)?)
    }

    pub fn session_history(
        &self,
        player: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> SettlementResult<Page<GameSession>> {
        check_player(player)?;
        Ok(self.store.session_history(player, cursor, limit)?)
    }

    pub fn game_stats(
        &self,
        player: &str,
        money: MoneyType,
        game: GameType,
    ) -> SettlementResult<GameStats> {
        check_player(player)?;
        let wallet = WalletKey::new(player, money);
        Ok(self.store.game_stats(&wallet, game)?)
    }

    fn check_bet_bounds(&self, amount: Decimal) -> SettlementResult<()> {
        let limits = &self.config.limits;
        if amount < limits.min_bet || amount > limits.max_bet {
            self.monitor.record_rejection();
            return Err(SettlementError::InvalidBet {
                amount,
                min: limits.min_bet,
                max: limits.max_bet,
            });
        }
        Ok(())
    }

    fn check_transfer_bounds(&self, amount: Decimal) -> SettlementResult<()> {
        let limits = &self.config.limits;
        if amount <= Decimal::ZERO || amount > limits.max_transfer {
            return Err(SettlementError::InvalidBet {
                amount,
                min: Decimal::ZERO,
                max: limits.max_transfer,
            });
        }
        Ok(())
    }

    /// Everything one settled round writes: debit entry, credit entry when
    /// the round paid out, session record, refreshed aggregates.
    fn build_round_writes(
        &self,
        wallet: &WalletKey,
        request: &PlayRequest,
        balance: Decimal,
        outcome: &Outcome,
    ) -> SettlementResult<(Uuid, WriteSet)> {
        let bet_entry = LedgerEntry::new(
            wallet,
            EntryType::Bet,
            request.bet_amount,
            balance,
            Some(request.game),
            request.metadata.clone(),
        );
        let mut entries = vec![bet_entry];
        let mut new_balance = balance - request.bet_amount;

        if outcome.win_amount > Decimal::ZERO {
            let win_entry = LedgerEntry::new(
                wallet,
                EntryType::Win,
                outcome.win_amount,
                new_balance,
                Some(request.game),
                request.metadata.clone(),
            );
            new_balance = win_entry.balance_after;
            entries.push(win_entry);
        }

        let session = GameSession {
            id: Uuid::new_v4(),
            player: request.player.clone(),
            game: request.game,
            money: request.money,
            bet_amount: request.bet_amount,
            win_amount: outcome.win_amount,
            result: outcome.result,
            detail: outcome.detail.clone(),
            created_at: Utc::now(),
            metadata: request.metadata.clone(),
        };
        let session_id = session.id;

        let mut stats = self.store.game_stats(wallet, request.game)?;
        stats.record(request.bet_amount, outcome.win_amount);

        Ok((
            session_id,
            WriteSet {
                wallet: wallet.clone(),
                new_balance,
                entries,
                session: Some(session),
                stats: Some((request.game, stats)),
            },
        ))
    }

    /// Atomic batch write on the blocking pool, bounded by the commit
    /// timeout.
    ///
    /// `Timeout` is only returned when the batch write provably never
    /// started; the unit is then discarded and the wallet stays untouched.
    /// If the write is already in flight when the deadline passes, the call
    /// waits for its actual fate instead of reporting a state it cannot
    /// guarantee. Either way, the wallet lease (held by the caller) is not
    /// released until the outcome is known.
    async fn commit(&self, set: WriteSet) -> SettlementResult<()> {
        let store = self.store.clone();
        let wait = self.config.commit_timeout();
        let fate = Arc::new(AtomicU8::new(COMMIT_PENDING));

        let task_fate = fate.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            if task_fate
                .compare_exchange(
                    COMMIT_PENDING,
                    COMMIT_STARTED,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                // The coordinator gave up before the write began.
                return Ok(());
            }
            store.commit_atomic(set)
        });

        match tokio::time::timeout(wait, &mut task).await {
            Ok(join) => finish_commit(join),
            Err(_) => {
                if fate
                    .compare_exchange(
                        COMMIT_PENDING,
                        COMMIT_ABANDONED,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    warn!(waited_ms = wait.as_millis() as u64, "Commit abandoned before it started");
                    Err(SettlementError::Timeout {
                        phase: TimeoutPhase::Commit,
                        waited_ms: wait.as_millis() as u64,
                    })
                } else {
                    // The batch write is already running; its result is the
                    // only truthful answer.
                    finish_commit(task.await)
                }
            }
        }
    }
}

/// Player ids are spliced into storage key prefixes, so the key separator
/// must never appear in one.
fn check_player(player: &str) -> SettlementResult<()> {
    if player.is_empty() || player.contains(':') {
        return Err(SettlementError::InvalidParameters(format!(
            "invalid player id {:?}",
            player
        )));
    }
    Ok(())
}

const COMMIT_PENDING: u8 = 0;
const COMMIT_STARTED: u8 = 1;
const COMMIT_ABANDONED: u8 = 2;

fn finish_commit(
    join: Result<Result<(), StoreError>, tokio::task::JoinError>,
) -> SettlementResult<()> {
    match join {
        Ok(result) => Ok(result?),
        Err(join_err) => {
            warn!(error = %join_err, "Commit task failed");
            Err(SettlementError::PersistenceFailure(join_err.to_string()))
        }
    }
}
