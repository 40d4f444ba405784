//! Rank gating for protection flags
//!
//! The permission rule itself is a single inequality: an actor whose rank
//! score is at least the flag's threshold may perform the action. The tier
//! classification below is a reporting view over the rank table.

use serde::{Deserialize, Serialize};

use crate::models::{RankTable, BANNED_RANK, OWNER_RANK};

/// Check if an actor with rank `score` passes a flag threshold
pub fn is_permitted(score: i32, threshold: i32) -> bool {
    score >= threshold
}

/// Check if `score` ranks strictly above `threshold`
///
/// A banned score never ranks above anything.
pub fn is_greater_rank(score: i32, threshold: i32) -> bool {
    score > BANNED_RANK && score > threshold
}

/// How a rank relates to a flag threshold, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
    /// Below the threshold (banned ranks are not listed)
    Blocked,
    /// Above the threshold, up to and including the owner
    Allowed,
    /// Exactly the threshold
    Minimal,
}

impl RankTier {
    pub fn display_name(&self) -> &'static str {
        match self {
            RankTier::Blocked => "Blocked",
            RankTier::Allowed => "Allowed",
            RankTier::Minimal => "Minimal",
        }
    }
}

/// Classify one rank score against a threshold
///
/// Returns `None` for ranks the view leaves out: banned scores below the
/// threshold and staff ranks above the owner.
pub fn classify(score: i32, threshold: i32) -> Option<RankTier> {
    if score > BANNED_RANK && score < threshold {
        Some(RankTier::Blocked)
    } else if score <= OWNER_RANK && score > threshold {
        Some(RankTier::Allowed)
    } else if score == threshold {
        Some(RankTier::Minimal)
    } else {
        None
    }
}

/// A rank with its tier against some threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankLine {
    pub name: String,
    pub score: i32,
    pub tier: RankTier,
}

/// Classify every rank in the table, lowest score first
pub fn rank_tiers(ranks: &RankTable, threshold: i32) -> Vec<RankLine> {
    ranks
        .iter()
        .filter_map(|(name, score)| {
            classify(score, threshold).map(|tier| RankLine {
                name: name.to_string(),
                score,
                tier,
            })
        })
        .collect()
}
