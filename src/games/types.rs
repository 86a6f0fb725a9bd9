use crate::errors::SettlementError;
use crate::games::cards::Card;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Blackjack,
    Roulette,
    Baccarat,
    Slots,
    Poker,
    SicBo,
    DragonTiger,
    Craps,
    Bingo,
    Keno,
}

impl GameType {
    pub const ALL: [GameType; 10] = [
        GameType::Blackjack,
        GameType::Roulette,
        GameType::Baccarat,
        GameType::Slots,
        GameType::Poker,
        GameType::SicBo,
        GameType::DragonTiger,
        GameType::Craps,
        GameType::Bingo,
        GameType::Keno,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Blackjack => "blackjack",
            GameType::Roulette => "roulette",
            GameType::Baccarat => "baccarat",
            GameType::Slots => "slots",
            GameType::Poker => "poker",
            GameType::SicBo => "sicbo",
            GameType::DragonTiger => "dragontiger",
            GameType::Craps => "craps",
            GameType::Bingo => "bingo",
            GameType::Keno => "keno",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GameType {
    type Err = SettlementError;

    /// Unknown tags are rejected here, at the boundary, never deeper in
    /// resolution.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| SettlementError::UnknownGameType(s.to_string()))
    }
}

/// The two independent balances every player holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoneyType {
    /// Practice balance, not redeemable.
    Test,
    /// Redeemable balance.
    Real,
}

impl MoneyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoneyType::Test => "TEST",
            MoneyType::Real => "REAL",
        }
    }
}

impl fmt::Display for MoneyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How one play resolved against the stake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundResult {
    Win,
    Loss,
    /// Stake returned, no net gain or loss.
    Push,
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoundResult::Win => "WIN",
            RoundResult::Loss => "LOSS",
            RoundResult::Push => "PUSH",
        };
        f.write_str(s)
    }
}

/// Roulette bet selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "bet_type", content = "value", rename_all = "lowercase")]
pub enum RouletteBet {
    /// Exact number in 0..=36.
    Number(u8),
    Red,
    Black,
    Even,
    Odd,
}

/// Baccarat side selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BaccaratBet {
    Player,
    Banker,
    Tie,
}

/// Sic Bo bet selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "bet_type", content = "value", rename_all = "lowercase")]
pub enum SicBoBet {
    /// Exact three-dice total. Takes priority over range bets.
    Total(u8),
    /// 11..=17
    Big,
    /// 4..=10
    Small,
}

/// Craps come-out bet selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CrapsBet {
    Pass,
    DontPass,
}

/// Variant-specific play parameters (discriminated union).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameParams {
    Blackjack,
    Roulette { bet: RouletteBet },
    Baccarat { bet: BaccaratBet },
    Slots,
    Poker,
    SicBo { bet: SicBoBet },
    DragonTiger,
    Craps { bet: CrapsBet },
    Bingo { picks: Vec<u8> },
    Keno { picks: Vec<u8> },
}

impl GameParams {
    /// Game variant these parameters belong to.
    pub fn game_type(&self) -> GameType {
        match self {
            GameParams::Blackjack => GameType::Blackjack,
            GameParams::Roulette { .. } => GameType::Roulette,
            GameParams::Baccarat { .. } => GameType::Baccarat,
            GameParams::Slots => GameType::Slots,
            GameParams::Poker => GameType::Poker,
            GameParams::SicBo { .. } => GameType::SicBo,
            GameParams::DragonTiger => GameType::DragonTiger,
            GameParams::Craps { .. } => GameType::Craps,
            GameParams::Bingo { .. } => GameType::Bingo,
            GameParams::Keno { .. } => GameType::Keno,
        }
    }
}

/// Slot machine reel symbols, ordered by payout tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotSymbol {
    Cherry,
    Lemon,
    Orange,
    Grape,
    Diamond,
    Seven,
}

impl SlotSymbol {
    pub const ALL: [SlotSymbol; 6] = [
        SlotSymbol::Cherry,
        SlotSymbol::Lemon,
        SlotSymbol::Orange,
        SlotSymbol::Grape,
        SlotSymbol::Diamond,
        SlotSymbol::Seven,
    ];
}

/// Game-specific outcome payload, embedded into the session record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum OutcomeDetail {
    Blackjack {
        player_hand: Vec<Card>,
        dealer_hand: Vec<Card>,
        player_value: u8,
        dealer_value: u8,
    },
    Roulette {
        spin: u8,
        bet: RouletteBet,
    },
    Baccarat {
        player_card: u8,
        banker_card: u8,
        player_value: u8,
        banker_value: u8,
    },
    Slots {
        reels: [SlotSymbol; 3],
    },
    Poker {
        player_hand: Vec<Card>,
        dealer_hand: Vec<Card>,
        player_rank: u8,
        dealer_rank: u8,
    },
    SicBo {
        dice: [u8; 3],
        total: u8,
        bet: SicBoBet,
    },
    DragonTiger {
        dragon: u8,
        tiger: u8,
    },
    Craps {
        dice: [u8; 2],
        total: u8,
        bet: CrapsBet,
    },
    Bingo {
        picks: Vec<u8>,
        drawn: Vec<u8>,
        matches: usize,
    },
    Keno {
        picks: Vec<u8>,
        drawn: Vec<u8>,
        matches: usize,
    },
}

/// Transient engine output, consumed immediately by the coordinator.
///
/// `win_amount` includes the returned stake: a push pays exactly the stake,
/// a loss pays zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub result: RoundResult,
    pub win_amount: Decimal,
    pub detail: OutcomeDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_type_parse_round_trip() {
        for game in GameType::ALL {
            assert_eq!(game.as_str().parse::<GameType>().unwrap(), game);
        }
    }

    #[test]
    fn test_unknown_game_type_rejected() {
        let err = "warcraft".parse::<GameType>().unwrap_err();
        match err {
            SettlementError::UnknownGameType(tag) => assert_eq!(tag, "warcraft"),
            other => panic!("Expected UnknownGameType, got {:?}", other),
        }
    }

    #[test]
    fn test_game_params_serde_tags() {
        let params = GameParams::Roulette {
            bet: RouletteBet::Number(17),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["game"], "roulette");
        assert_eq!(json["bet"]["bet_type"], "number");
        assert_eq!(json["bet"]["value"], 17);

        let back: GameParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_money_type_serde_uppercase() {
        assert_eq!(serde_json::to_string(&MoneyType::Test).unwrap(), "\"TEST\"");
        assert_eq!(serde_json::to_string(&MoneyType::Real).unwrap(), "\"REAL\"");
    }

    #[test]
    fn test_params_game_type_agreement() {
        assert_eq!(GameParams::Blackjack.game_type(), GameType::Blackjack);
        assert_eq!(
            GameParams::Keno { picks: vec![1] }.game_type(),
            GameType::Keno
        );
    }
}
