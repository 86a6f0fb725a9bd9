//! Ledger domain types: wallets, ledger entries, game sessions.
//!
//! Every balance movement is recorded as an immutable `LedgerEntry` that
//! snapshots the balance before and after. A wallet's balance must always
//! equal the replay of its entries, which is what `replay_balance` checks.

use crate::games::types::{GameType, MoneyType, OutcomeDetail, RoundResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one wallet: a player holds one wallet per money type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletKey {
    pub player: String,
    pub money: MoneyType,
}

impl WalletKey {
    pub fn new(player: impl Into<String>, money: MoneyType) -> Self {
        Self {
            player: player.into(),
            money,
        }
    }

    /// Storage key suffix, stable across restarts.
    pub fn storage_suffix(&self) -> String {
        format!("{}:{}", self.player, self.money)
    }
}

impl fmt::Display for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.player, self.money)
    }
}

/// Both balances of a player, one per money type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub test_money: Decimal,
    pub real_money: Decimal,
}

impl Balances {
    pub const ZERO: Balances = Balances {
        test_money: Decimal::ZERO,
        real_money: Decimal::ZERO,
    };

    pub fn of(&self, money: MoneyType) -> Decimal {
        match money {
            MoneyType::Test => self.test_money,
            MoneyType::Real => self.real_money,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Bet,
    Win,
    Deposit,
    Withdrawal,
}

impl EntryType {
    /// Whether this entry credits the wallet. Bets and withdrawals debit.
    pub fn is_credit(&self) -> bool {
        matches!(self, EntryType::Win | EntryType::Deposit)
    }
}

/// Caller-supplied request context carried into the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// One immutable balance movement. `amount` is always non-negative; the
/// direction comes from `entry_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub player: String,
    pub entry_type: EntryType,
    pub money: MoneyType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameType>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: RequestMetadata,
}

impl LedgerEntry {
    pub fn new(
        wallet: &WalletKey,
        entry_type: EntryType,
        amount: Decimal,
        balance_before: Decimal,
        game: Option<GameType>,
        metadata: RequestMetadata,
    ) -> Self {
        let balance_after = balance_before + signed(entry_type, amount);
        Self {
            id: Uuid::new_v4(),
            player: wallet.player.clone(),
            entry_type,
            money: wallet.money,
            amount,
            balance_before,
            balance_after,
            game,
            created_at: Utc::now(),
            metadata,
        }
    }

    /// The entry's effect on the balance, signed.
    pub fn signed_delta(&self) -> Decimal {
        signed(self.entry_type, self.amount)
    }

    /// Internal consistency: the snapshots must agree with the delta.
    pub fn verify(&self) -> bool {
        self.amount >= Decimal::ZERO
            && self.balance_after == self.balance_before + self.signed_delta()
    }
}

fn signed(entry_type: EntryType, amount: Decimal) -> Decimal {
    if entry_type.is_credit() {
        amount
    } else {
        -amount
    }
}

/// Replay a wallet's history oldest-first and return the final balance.
pub fn replay_balance(entries: &[LedgerEntry]) -> Decimal {
    entries.iter().map(LedgerEntry::signed_delta).sum()
}

/// One settled play, stored for history and audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: Uuid,
    pub player: String,
    pub game: GameType,
    pub money: MoneyType,
    pub bet_amount: Decimal,
    pub win_amount: Decimal,
    pub result: RoundResult,
    pub detail: OutcomeDetail,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: RequestMetadata,
}

/// Per-player, per-game lifetime aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub games_played: u64,
    pub total_bet: Decimal,
    pub total_won: Decimal,
}

impl GameStats {
    pub fn record(&mut self, bet: Decimal, won: Decimal) {
        self.games_played += 1;
        self.total_bet += bet;
        self.total_won += won;
    }

    pub fn net_profit(&self) -> Decimal {
        self.total_won - self.total_bet
    }
}
