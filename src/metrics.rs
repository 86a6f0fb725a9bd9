//! Settlement counters, cheap enough to sit on the hot path.
//!
//! Monetary totals are tracked in integer micro-units so they can live in
//! atomics; they convert back to `Decimal` on read.

use crate::games::types::RoundResult;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

const MICROS_PER_UNIT: u64 = 1_000_000;

#[derive(Default)]
pub struct SettlementMonitor {
    wins: AtomicU64,
    losses: AtomicU64,
    pushes: AtomicU64,
    rejections: AtomicU64,
    wagered_micros: AtomicU64,
    paid_micros: AtomicU64,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub rounds: u64,
    pub wins: u64,
    pub losses: u64,
    pub pushes: u64,
    pub rejections: u64,
    pub total_wagered: Decimal,
    pub total_paid: Decimal,
}

impl MonitorSnapshot {
    /// Return-to-player ratio; `None` before any stake was taken.
    pub fn rtp(&self) -> Option<Decimal> {
        if self.total_wagered.is_zero() {
            None
        } else {
            Some(self.total_paid / self.total_wagered)
        }
    }
}

impl SettlementMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_round(&self, result: RoundResult, bet: Decimal, win_amount: Decimal) {
        let counter = match result {
            RoundResult::Win => &self.wins,
            RoundResult::Loss => &self.losses,
            RoundResult::Push => &self.pushes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.wagered_micros
            .fetch_add(to_micros(bet), Ordering::Relaxed);
        self.paid_micros
            .fetch_add(to_micros(win_amount), Ordering::Relaxed);
    }

    /// A request refused before any wallet access.
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let wins = self.wins.load(Ordering::Relaxed);
        let losses = self.losses.load(Ordering::Relaxed);
        let pushes = self.pushes.load(Ordering::Relaxed);
        MonitorSnapshot {
            rounds: wins + losses + pushes,
            wins,
            losses,
            pushes,
            rejections: self.rejections.load(Ordering::Relaxed),
            total_wagered: from_micros(self.wagered_micros.load(Ordering::Relaxed)),
            total_paid: from_micros(self.paid_micros.load(Ordering::Relaxed)),
        }
    }
}

fn to_micros(amount: Decimal) -> u64 {
    (amount * Decimal::from(MICROS_PER_UNIT))
        .trunc()
        .to_u64()
        .unwrap_or(0)
}

fn from_micros(micros: u64) -> Decimal {
    Decimal::from(micros) / Decimal::from(MICROS_PER_UNIT)
}
