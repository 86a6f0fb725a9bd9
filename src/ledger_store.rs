//! Persistent ledger built on a `KvBackend`.
//!
//! Key layout (all keys ASCII, ordered lexicographically):
//!
//! ```text
//! w:{player}:{money}                      -> wallet balance
//! e:{player}:{money}:{~ts}:{~seq}:{uuid}  -> ledger entry
//! s:{player}:{~ts}:{~seq}:{uuid}          -> game session
//! g:{player}:{money}:{game}               -> per-game aggregates
//! ```
//!
//! `{~ts}` is the creation time in milliseconds subtracted from `u64::MAX`
//! and rendered as fixed-width hex, so an ascending scan returns newest
//! records first. `{~seq}` is an in-process write sequence, inverted the
//! same way, which breaks ties between records created in the same
//! millisecond; across a restart ordering falls back to the timestamp.
//! Pagination cursors are the hex-encoded last key of the previous page
//! and are opaque to callers.
//!
//! Writers must hold the wallet lease for every wallet they touch; the
//! store itself only guarantees that `commit_atomic` is all-or-nothing.

use crate::errors::{SettlementError, SettlementResult, StoreError, TimeoutPhase};
use crate::games::types::{GameType, MoneyType};
use crate::ledger::{Balances, GameSession, GameStats, LedgerEntry, WalletKey};
use crate::store::KvBackend;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// One page of a history listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present when the listing may have more items.
    pub next_cursor: Option<String>,
}

/// Everything one settlement persists, committed as a single unit.
#[derive(Debug)]
pub struct WriteSet {
    pub wallet: WalletKey,
    pub new_balance: Decimal,
    pub entries: Vec<LedgerEntry>,
    pub session: Option<GameSession>,
    pub stats: Option<(GameType, GameStats)>,
}

pub struct LedgerStore {
    kv: Arc<dyn KvBackend>,
    leases: DashMap<WalletKey, Arc<Mutex<()>>>,
    seq: AtomicU64,
}

impl LedgerStore {
    pub fn new(kv: Arc<dyn KvBackend>) -> Self {
        Self {
            kv,
            leases: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    /// Exclusive access to one wallet, bounded by `wait`. Released on drop.
    pub async fn lease(
        &self,
        wallet: &WalletKey,
        wait: Duration,
    ) -> SettlementResult<OwnedMutexGuard<()>> {
        let lock = self
            .leases
            .entry(wallet.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(wait, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                debug!(wallet = %wallet, "Wallet lease timed out");
                Err(SettlementError::Timeout {
                    phase: TimeoutPhase::Lease,
                    waited_ms: wait.as_millis() as u64,
                })
            }
        }
    }

    /// Authoritative balance. A wallet that has never been written is zero.
    pub fn wallet_balance(&self, wallet: &WalletKey) -> Result<Decimal, StoreError> {
        match self.kv.get(wallet_key(wallet).as_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Decimal::ZERO),
        }
    }

    pub fn balances(&self, player: &str) -> Result<Balances, StoreError> {
        Ok(Balances {
            test_money: self.wallet_balance(&WalletKey::new(player, MoneyType::Test))?,
            real_money: self.wallet_balance(&WalletKey::new(player, MoneyType::Real))?,
        })
    }

    /// Apply one settlement's writes in a single atomic batch.
    ///
    /// The caller must hold the wallet's lease and must have derived
    /// `new_balance` from `wallet_balance` under that lease.
    pub fn commit_atomic(&self, set: WriteSet) -> Result<(), StoreError> {
        let mut writes: Vec<(Vec<u8>, Vec<u8>)> =
            Vec::with_capacity(2 + set.entries.len() + set.session.is_some() as usize);

        writes.push((
            wallet_key(&set.wallet).into_bytes(),
            serde_json::to_vec(&set.new_balance)?,
        ));
        for entry in &set.entries {
            writes.push((entry_key(entry, self.next_seq()), serde_json::to_vec(entry)?));
        }
        if let Some(session) = &set.session {
            writes.push((
                session_key(session, self.next_seq()),
                serde_json::to_vec(session)?,
            ));
        }
        if let Some((game, stats)) = &set.stats {
            writes.push((
                stats_key(&set.wallet, *game).into_bytes(),
                serde_json::to_vec(stats)?,
            ));
        }

        self.kv.batch_write(writes)
    }

    /// Ledger entries for one wallet, newest first.
    pub fn entry_history(
        &self,
        wallet: &WalletKey,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<LedgerEntry>, StoreError> {
        let prefix = format!("e:{}:", wallet.storage_suffix());
        self.scan_page(&prefix, cursor, limit)
    }

    /// Settled plays for one player across both money types, newest first.
    pub fn session_history(
        &self,
        player: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<GameSession>, StoreError> {
        let prefix = format!("s:{}:", player);
        self.scan_page(&prefix, cursor, limit)
    }

    /// Lifetime aggregates for one wallet and game. Zero when never played.
    ///
    /// Keyed per wallet so the wallet lease covers the read-modify-write.
    pub fn game_stats(&self, wallet: &WalletKey, game: GameType) -> Result<GameStats, StoreError> {
        match self.kv.get(stats_key(wallet, game).as_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(GameStats::default()),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn scan_page<T: serde::de::DeserializeOwned>(
        &self,
        prefix: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<T>, StoreError> {
        let after = cursor
            .map(|c| hex::decode(c).map_err(|_| StoreError::CorruptedData("bad cursor".into())))
            .transpose()?;

        let rows = self
            .kv
            .scan_prefix(prefix.as_bytes(), after.as_deref(), limit)?;

        let next_cursor = if rows.len() == limit {
            rows.last().map(|(k, _)| hex::encode(k))
        } else {
            None
        };
        let items = rows
            .into_iter()
            .map(|(_, v)| serde_json::from_slice(&v).map_err(StoreError::from))
            .collect::<Result<Vec<T>, _>>()?;

        Ok(Page { items, next_cursor })
    }
}

fn wallet_key(wallet: &WalletKey) -> String {
    format!("w:{}", wallet.storage_suffix())
}

fn stats_key(wallet: &WalletKey, game: GameType) -> String {
    format!("g:{}:{}", wallet.storage_suffix(), game)
}

/// Milliseconds-since-epoch inverted so newer keys sort first.
fn inverted_ts(millis: i64) -> String {
    format!("{:016x}", u64::MAX - millis as u64)
}

/// Write sequence inverted the same way; breaks same-millisecond ties.
fn inverted_seq(seq: u64) -> String {
    format!("{:016x}", u64::MAX - seq)
}

fn entry_key(entry: &LedgerEntry, seq: u64) -> Vec<u8> {
    format!(
        "e:{}:{}:{}:{}:{}",
        entry.player,
        entry.money,
        inverted_ts(entry.created_at.timestamp_millis()),
        inverted_seq(seq),
        entry.id.simple()
    )
    .into_bytes()
}

fn session_key(session: &GameSession, seq: u64) -> Vec<u8> {
    format!(
        "s:{}:{}:{}:{}",
        session.player,
        inverted_ts(session.created_at.timestamp_millis()),
        inverted_seq(seq),
        session.id.simple()
    )
    .into_bytes()
}
