//! Game resolution engine.
//!
//! One pure resolver per game variant: a function of (parameters, stake,
//! randomness) with no shared state and no I/O. Win amounts include the
//! returned stake, so a push pays exactly the stake and a loss pays zero.

use crate::errors::SettlementError;
use crate::games::cards::{blackjack_value, Card, Deck};
use crate::games::types::{
    BaccaratBet, CrapsBet, GameParams, GameType, Outcome, OutcomeDetail, RouletteBet, RoundResult,
    SicBoBet, SlotSymbol,
};
use crate::rng::GameRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Red pockets on a single-zero roulette wheel.
const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Keno payout multipliers indexed by match count (0..=10 picks).
const KENO_PAYTABLE: [u32; 11] = [0, 0, 0, 2, 5, 20, 50, 100, 500, 1000, 5000];

/// Rejection budget for the keno draw. With at most 19 of 80 numbers
/// already drawn the per-draw rejection chance is under 24%, so a fair
/// source never comes close to this bound.
const KENO_MAX_REDRAWS: usize = 1_000;

/// Resolve one play. Deterministic given a fixed RNG stream.
///
/// Fails with `InvalidParameters` when `params` belongs to a different game
/// than `game` or carries out-of-range fields; produces no side effects.
pub fn resolve<R: GameRng>(
    game: GameType,
    params: &GameParams,
    bet: Decimal,
    rng: &mut R,
) -> Result<Outcome, SettlementError> {
    if params.game_type() != game {
        return Err(SettlementError::InvalidParameters(format!(
            "parameters are for {}, play requested {}",
            params.game_type(),
            game
        )));
    }

    match params {
        GameParams::Blackjack => Ok(resolve_blackjack(bet, rng)),
        GameParams::Roulette { bet: selection } => resolve_roulette(*selection, bet, rng),
        GameParams::Baccarat { bet: selection } => Ok(resolve_baccarat(*selection, bet, rng)),
        GameParams::Slots => Ok(resolve_slots(bet, rng)),
        GameParams::Poker => Ok(resolve_poker(bet, rng)),
        GameParams::SicBo { bet: selection } => resolve_sicbo(*selection, bet, rng),
        GameParams::DragonTiger => Ok(resolve_dragon_tiger(bet, rng)),
        GameParams::Craps { bet: selection } => Ok(resolve_craps(*selection, bet, rng)),
        GameParams::Bingo { picks } => resolve_bingo(picks, bet, rng),
        GameParams::Keno { picks } => resolve_keno(picks, bet, rng),
    }
}

// ---------------------------------------------------------------------------
// Blackjack
// ---------------------------------------------------------------------------

fn resolve_blackjack<R: GameRng>(bet: Decimal, rng: &mut R) -> Outcome {
    let mut deck = Deck::shuffled(rng);
    let player_hand = deck.deal(2);
    let dealer_hand = deck.deal(2);
    score_blackjack(player_hand, dealer_hand, bet)
}

/// Scoring is split from drawing so every payout branch is testable with
/// constructed hands. No dealer drawing phase is modeled: both sides stand
/// on their two cards.
fn score_blackjack(player_hand: Vec<Card>, dealer_hand: Vec<Card>, bet: Decimal) -> Outcome {
    let player_value = blackjack_value(&player_hand);
    let dealer_value = blackjack_value(&dealer_hand);

    let (result, win_amount) = if player_value == 21 && player_hand.len() == 2 {
        // Natural pays 3:2.
        (RoundResult::Win, bet * dec!(2.5))
    } else if player_value > 21 {
        (RoundResult::Loss, Decimal::ZERO)
    } else if dealer_value > 21 || player_value > dealer_value {
        (RoundResult::Win, bet * dec!(2))
    } else if player_value == dealer_value {
        (RoundResult::Push, bet)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Blackjack {
            player_hand,
            dealer_hand,
            player_value,
            dealer_value,
        },
    }
}

// ---------------------------------------------------------------------------
// Roulette
// ---------------------------------------------------------------------------

fn resolve_roulette<R: GameRng>(
    selection: RouletteBet,
    bet: Decimal,
    rng: &mut R,
) -> Result<Outcome, SettlementError> {
    if let RouletteBet::Number(n) = selection {
        if n > 36 {
            return Err(SettlementError::InvalidParameters(format!(
                "roulette number {} outside 0..=36",
                n
            )));
        }
    }

    let spin = rng.draw(37) as u8;
    let is_red = RED_NUMBERS.contains(&spin);

    // Zero satisfies none of red/black/even/odd.
    let (hit, multiplier) = match selection {
        RouletteBet::Number(n) => (spin == n, dec!(36)),
        RouletteBet::Red => (is_red, dec!(2)),
        RouletteBet::Black => (!is_red && spin != 0, dec!(2)),
        RouletteBet::Even => (spin % 2 == 0 && spin != 0, dec!(2)),
        RouletteBet::Odd => (spin % 2 == 1, dec!(2)),
    };

    let (result, win_amount) = if hit {
        (RoundResult::Win, bet * multiplier)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Ok(Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Roulette {
            spin,
            bet: selection,
        },
    })
}

// ---------------------------------------------------------------------------
// Baccarat
// ---------------------------------------------------------------------------

/// Each side is reduced to a single card draw taken mod 10; no real
/// two-card baccarat hand is modeled.
fn resolve_baccarat<R: GameRng>(selection: BaccaratBet, bet: Decimal, rng: &mut R) -> Outcome {
    let player_card = rng.draw(13) as u8 + 1;
    let banker_card = rng.draw(13) as u8 + 1;
    let player_value = player_card % 10;
    let banker_value = banker_card % 10;

    let (result, win_amount) = if player_value == banker_value {
        if selection == BaccaratBet::Tie {
            (RoundResult::Win, bet * dec!(10))
        } else {
            (RoundResult::Push, bet)
        }
    } else if player_value > banker_value {
        if selection == BaccaratBet::Player {
            (RoundResult::Win, bet * dec!(2))
        } else {
            (RoundResult::Loss, Decimal::ZERO)
        }
    } else if selection == BaccaratBet::Banker {
        // Banker wins pay with 5% commission.
        (RoundResult::Win, bet * dec!(1.95))
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Baccarat {
            player_card,
            banker_card,
            player_value,
            banker_value,
        },
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

fn resolve_slots<R: GameRng>(bet: Decimal, rng: &mut R) -> Outcome {
    let reels = [
        SlotSymbol::ALL[rng.draw(6) as usize],
        SlotSymbol::ALL[rng.draw(6) as usize],
        SlotSymbol::ALL[rng.draw(6) as usize],
    ];

    let multiplier = if reels[0] == reels[1] && reels[1] == reels[2] {
        match reels[0] {
            SlotSymbol::Seven => dec!(100),
            SlotSymbol::Diamond => dec!(50),
            _ => dec!(10),
        }
    } else if reels[0] == reels[1] || reels[1] == reels[2] {
        dec!(2)
    } else {
        Decimal::ZERO
    };

    let (result, win_amount) = if multiplier > Decimal::ZERO {
        (RoundResult::Win, bet * multiplier)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Slots { reels },
    }
}

// ---------------------------------------------------------------------------
// Poker
// ---------------------------------------------------------------------------

/// Hand strength is a uniform rank 0..=9 per side rather than an evaluation
/// of the dealt cards. The cards are still dealt and reported.
fn resolve_poker<R: GameRng>(bet: Decimal, rng: &mut R) -> Outcome {
    let mut deck = Deck::shuffled(rng);
    let player_hand = deck.deal(5);
    let dealer_hand = deck.deal(5);
    let player_rank = rng.draw(10) as u8;
    let dealer_rank = rng.draw(10) as u8;

    let (result, win_amount) = if player_rank > dealer_rank {
        (RoundResult::Win, bet * dec!(2))
    } else if player_rank == dealer_rank {
        (RoundResult::Push, bet)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Poker {
            player_hand,
            dealer_hand,
            player_rank,
            dealer_rank,
        },
    }
}

// ---------------------------------------------------------------------------
// Sic Bo
// ---------------------------------------------------------------------------

fn resolve_sicbo<R: GameRng>(
    selection: SicBoBet,
    bet: Decimal,
    rng: &mut R,
) -> Result<Outcome, SettlementError> {
    if let SicBoBet::Total(t) = selection {
        if !(3..=18).contains(&t) {
            return Err(SettlementError::InvalidParameters(format!(
                "sicbo total {} outside 3..=18",
                t
            )));
        }
    }

    let dice = [
        rng.draw(6) as u8 + 1,
        rng.draw(6) as u8 + 1,
        rng.draw(6) as u8 + 1,
    ];
    let total = dice.iter().sum::<u8>();

    // Exact-total bets resolve before range bets.
    let (hit, multiplier) = match selection {
        SicBoBet::Total(t) => (total == t, dec!(10)),
        SicBoBet::Big => ((11..=17).contains(&total), Decimal::ONE),
        SicBoBet::Small => ((4..=10).contains(&total), Decimal::ONE),
    };

    let (result, win_amount) = if hit {
        (RoundResult::Win, bet * multiplier)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Ok(Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::SicBo {
            dice,
            total,
            bet: selection,
        },
    })
}

// ---------------------------------------------------------------------------
// Dragon Tiger
// ---------------------------------------------------------------------------

fn resolve_dragon_tiger<R: GameRng>(bet: Decimal, rng: &mut R) -> Outcome {
    let dragon = rng.draw(13) as u8 + 1;
    let tiger = rng.draw(13) as u8 + 1;

    let (result, win_amount) = if dragon > tiger {
        (RoundResult::Win, bet * dec!(2))
    } else if dragon == tiger {
        (RoundResult::Push, bet)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::DragonTiger { dragon, tiger },
    }
}

// ---------------------------------------------------------------------------
// Craps
// ---------------------------------------------------------------------------

/// Come-out roll only; no point phase is modeled. An unresolved roll
/// settles as a loss.
fn resolve_craps<R: GameRng>(selection: CrapsBet, bet: Decimal, rng: &mut R) -> Outcome {
    let dice = [rng.draw(6) as u8 + 1, rng.draw(6) as u8 + 1];
    let total = dice[0] + dice[1];

    let hit = match selection {
        CrapsBet::Pass => total == 7 || total == 11,
        CrapsBet::DontPass => total == 2 || total == 3,
    };

    let (result, win_amount) = if hit {
        (RoundResult::Win, bet * dec!(2))
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Craps {
            dice,
            total,
            bet: selection,
        },
    }
}

// ---------------------------------------------------------------------------
// Bingo
// ---------------------------------------------------------------------------

fn resolve_bingo<R: GameRng>(
    picks: &[u8],
    bet: Decimal,
    rng: &mut R,
) -> Result<Outcome, SettlementError> {
    validate_picks(picks, 75, picks.len(), "bingo")?;

    // 20 draws, repeats allowed.
    let drawn: Vec<u8> = (0..20).map(|_| rng.draw(75) as u8 + 1).collect();
    let matches = picks.iter().filter(|p| drawn.contains(p)).count();

    let multiplier = if matches >= 5 {
        dec!(100)
    } else if matches >= 4 {
        dec!(10)
    } else if matches >= 3 {
        dec!(2)
    } else {
        Decimal::ZERO
    };

    let (result, win_amount) = if multiplier > Decimal::ZERO {
        (RoundResult::Win, bet * multiplier)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Ok(Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Bingo {
            picks: picks.to_vec(),
            drawn,
            matches,
        },
    })
}

// ---------------------------------------------------------------------------
// Keno
// ---------------------------------------------------------------------------

fn resolve_keno<R: GameRng>(
    picks: &[u8],
    bet: Decimal,
    rng: &mut R,
) -> Result<Outcome, SettlementError> {
    // The paytable covers at most 10 picks.
    validate_picks(picks, 80, 10, "keno")?;

    // 20 distinct draws in 1..=80, by rejection.
    let mut drawn: Vec<u8> = Vec::with_capacity(20);
    let mut rejected = 0usize;
    while drawn.len() < 20 && rejected <= KENO_MAX_REDRAWS {
        let n = rng.draw(80) as u8 + 1;
        if drawn.contains(&n) {
            rejected += 1;
        } else {
            drawn.push(n);
        }
    }
    // A degenerate source can repeat itself forever; complete the board
    // from the lowest unused numbers instead of spinning.
    for n in 1..=80 {
        if drawn.len() == 20 {
            break;
        }
        if !drawn.contains(&n) {
            drawn.push(n);
        }
    }

    let matches = picks.iter().filter(|p| drawn.contains(p)).count();
    let multiplier = Decimal::from(KENO_PAYTABLE[matches]);

    let (result, win_amount) = if multiplier > Decimal::ZERO {
        (RoundResult::Win, bet * multiplier)
    } else {
        (RoundResult::Loss, Decimal::ZERO)
    };

    Ok(Outcome {
        result,
        win_amount,
        detail: OutcomeDetail::Keno {
            picks: picks.to_vec(),
            drawn,
            matches,
        },
    })
}

fn validate_picks(
    picks: &[u8],
    max_number: u8,
    max_picks: usize,
    game: &str,
) -> Result<(), SettlementError> {
    if picks.is_empty() {
        return Err(SettlementError::InvalidParameters(format!(
            "{} requires at least one pick",
            game
        )));
    }
    if picks.len() > max_picks {
        return Err(SettlementError::InvalidParameters(format!(
            "{} allows at most {} picks, got {}",
            game,
            max_picks,
            picks.len()
        )));
    }
    for &p in picks {
        if p == 0 || p > max_number {
            return Err(SettlementError::InvalidParameters(format!(
                "{} pick {} outside 1..={}",
                game, p, max_number
            )));
        }
    }
    let mut sorted = picks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != picks.len() {
        return Err(SettlementError::InvalidParameters(format!(
            "{} picks must be distinct",
            game
        )));
    }
    Ok(())
}
