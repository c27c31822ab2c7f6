//! Reward Ledger
//!
//! Points are earned by answering quiz questions correctly and spent on a
//! mentoring session. The balance is unsigned, so it can never go negative, and
//! [`PointsBalance::redeem_mentoring`] is the single place where the redemption
//! rule lives.

use serde::{Deserialize, Serialize};

/// Credited for each correct quiz answer.
pub const POINTS_PER_CORRECT_ANSWER: u32 = 10;
/// Debited for one mentoring session.
pub const MENTORING_COST: u32 = 50;

/// Outcome of a mentoring redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// The cost was debited; carries the remaining balance.
    Redeemed { remaining: u32 },
    /// Mentoring is unlocked but the balance is below the cost.
    Insufficient { balance: u32 },
    /// The student has not reached the mentoring module yet.
    NotYetAvailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBalance(u32);

impl PointsBalance {
    pub fn new(points: u32) -> Self {
        Self(points)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn credit_correct_answer(&mut self) {
        self.0 = self.0.saturating_add(POINTS_PER_CORRECT_ANSWER);
    }

    /// Debits [`MENTORING_COST`] when `unlocked` and the balance covers it.
    /// Any other outcome leaves the balance untouched.
    pub fn redeem_mentoring(&mut self, unlocked: bool) -> Redemption {
        if !unlocked {
            return Redemption::NotYetAvailable;
        }
        match self.0.checked_sub(MENTORING_COST) {
            Some(remaining) => {
                self.0 = remaining;
                Redemption::Redeemed { remaining }
            }
            None => Redemption::Insufficient { balance: self.0 },
        }
    }
}
