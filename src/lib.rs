//! Croupier: a multi-game wagering settlement core.
//!
//! The crate is organized around one write path. A `SettlementCoordinator`
//! takes a play request, resolves it through the game engine with RNG from
//! a pluggable provider, and commits the stake movement, payout, session
//! record and aggregates to the `LedgerStore` as one atomic unit under an
//! exclusive per-wallet lease. Balances are always reconstructible by
//! replaying the ledger.
//!
//! ```no_run
//! use croupier::config::CasinoConfig;
//! use croupier::games::{GameParams, GameType, MoneyType, RouletteBet};
//! use croupier::ledger::RequestMetadata;
//! use croupier::ledger_store::LedgerStore;
//! use croupier::rng::EntropyProvider;
//! use croupier::settlement::{PlayRequest, SettlementCoordinator};
//! use croupier::store::RocksStore;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CasinoConfig::production();
//! let store = Arc::new(LedgerStore::new(Arc::new(RocksStore::open(&config.storage)?)));
//! let coordinator = SettlementCoordinator::new(store, EntropyProvider, config);
//!
//! coordinator
//!     .deposit("alice", MoneyType::Test, dec!(100), RequestMetadata::default())
//!     .await?;
//! let receipt = coordinator
//!     .settle(PlayRequest {
//!         player: "alice".to_string(),
//!         money: MoneyType::Test,
//!         game: GameType::Roulette,
//!         bet_amount: dec!(10),
//!         params: GameParams::Roulette { bet: RouletteBet::Number(17) },
//!         metadata: RequestMetadata::default(),
//!     })
//!     .await?;
//! println!("{:?} -> balance {}", receipt.result, receipt.new_balance);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod games;
pub mod ledger;
pub mod ledger_store;
pub mod metrics;
pub mod rng;
pub mod settlement;
pub mod store;

pub use config::CasinoConfig;
pub use errors::{SettlementError, SettlementResult};
pub use settlement::{PlayReceipt, PlayRequest, SettlementCoordinator};
