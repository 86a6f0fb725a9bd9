//! Playing-card primitives shared by the card games.

use crate::rng::GameRng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Blackjack value before soft-ace reduction. Ace counts 11.
    pub fn blackjack_value(&self) -> u8 {
        match self {
            Rank::Ace => 11,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank = match self.rank {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        };
        let suit = match self.suit {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        };
        write!(f, "{}{}", rank, suit)
    }
}

/// A freshly shuffled 52-card deck. Cards are drawn without replacement.
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn shuffled<R: GameRng>(rng: &mut R) -> Self {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card { rank, suit });
            }
        }
        rng.shuffle(&mut cards);
        Self { cards }
    }

    /// Draw `n` cards from the top.
    pub fn deal(&mut self, n: usize) -> Vec<Card> {
        let split = self.cards.len().saturating_sub(n);
        self.cards.split_off(split)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

/// Blackjack hand value with soft-ace reduction: aces count 11 and drop to
/// 1 one at a time while the total exceeds 21.
pub fn blackjack_value(hand: &[Card]) -> u8 {
    let mut value: u8 = 0;
    let mut aces = 0;
    for card in hand {
        if card.rank == Rank::Ace {
            aces += 1;
        }
        value += card.rank.blackjack_value();
    }
    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }
    value
}
