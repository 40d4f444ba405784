//! Island model - an owned region of a world with ranked members

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Flag, RankTable, BANNED_RANK, OWNER_RANK, VISITOR_RANK};
use crate::permissions;

/// An island with per-island flag overrides
///
/// Flag overrides are rank scores. Protection flags store the threshold,
/// setting flags store `VISITOR_RANK` (allowed) or `BANNED_RANK` (blocked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Island {
    pub id: Uuid,
    pub world: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Member ranks by user
    pub members: BTreeMap<Uuid, i32>,
    /// Flag overrides by flag id
    pub flags: BTreeMap<String, i32>,
    /// Cooldown expiry by flag id
    pub cooldowns: BTreeMap<String, DateTime<Utc>>,
}

impl Island {
    pub fn new(world: impl Into<String>, owner_id: Uuid) -> Self {
        let mut members = BTreeMap::new();
        members.insert(owner_id, OWNER_RANK);
        Self {
            id: Uuid::new_v4(),
            world: world.into(),
            owner_id: Some(owner_id),
            created_at: Utc::now(),
            members,
            flags: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
        }
    }

    /// Rank of a user on this island. Non-members are visitors.
    pub fn rank_of(&self, user_id: Uuid) -> i32 {
        self.members.get(&user_id).copied().unwrap_or(VISITOR_RANK)
    }

    pub fn set_rank(&mut self, user_id: Uuid, rank: i32) {
        self.members.insert(user_id, rank);
    }

    pub fn remove_member(&mut self, user_id: Uuid) -> bool {
        self.members.remove(&user_id).is_some()
    }

    /// Effective threshold for a flag: the island override, else the flag's default rank
    pub fn flag_rank(&self, flag: &Flag) -> i32 {
        self.flags
            .get(flag.id())
            .copied()
            .unwrap_or_else(|| flag.default_rank())
    }

    /// Set a flag override on this island
    ///
    /// Sub-flags of the same type follow the parent. Only direct sub-flags
    /// are visited.
    pub fn set_flag_rank(&mut self, flag: &Flag, rank: i32) {
        self.flags.insert(flag.id().to_string(), rank);
        for subflag in flag
            .subflags()
            .iter()
            .filter(|s| s.flag_type() == flag.flag_type())
        {
            self.flags.insert(subflag.id().to_string(), rank);
        }
    }

    /// Allow or block a setting flag on this island
    pub fn set_setting(&mut self, flag: &Flag, allowed: bool) {
        let rank = if allowed { VISITOR_RANK } else { BANNED_RANK };
        self.set_flag_rank(flag, rank);
    }

    /// Flip a setting flag, returning the new state
    pub fn toggle_setting(&mut self, flag: &Flag) -> bool {
        let allowed = !self.is_setting_allowed(flag);
        self.set_setting(flag, allowed);
        allowed
    }

    /// Island state of a setting flag, falling back to the compiled default
    pub fn is_setting_allowed(&self, flag: &Flag) -> bool {
        self.flags
            .get(flag.id())
            .map(|rank| *rank >= VISITOR_RANK)
            .unwrap_or_else(|| flag.default_setting())
    }

    /// Whether a user may perform the action a protection flag guards
    pub fn is_allowed_for(&self, user_id: Uuid, flag: &Flag) -> bool {
        permissions::is_permitted(self.rank_of(user_id), self.flag_rank(flag))
    }

    /// Step a protection threshold one rank up or down
    ///
    /// Thresholds range from visitor to owner and wrap around at either end.
    /// Returns the new threshold.
    pub fn cycle_flag_rank(&mut self, flag: &Flag, ranks: &RankTable, up: bool) -> i32 {
        let current = self.flag_rank(flag);
        let next = if up {
            if current >= OWNER_RANK {
                VISITOR_RANK
            } else {
                ranks.rank_above(current).unwrap_or(OWNER_RANK).min(OWNER_RANK)
            }
        } else if current <= VISITOR_RANK {
            OWNER_RANK
        } else {
            ranks
                .rank_below(current)
                .unwrap_or(VISITOR_RANK)
                .max(VISITOR_RANK)
        };
        self.set_flag_rank(flag, next);
        next
    }

    /// Start the flag's cooldown now
    pub fn set_cooldown(&mut self, flag: &Flag) {
        self.set_cooldown_at(flag, Utc::now());
    }

    pub fn set_cooldown_at(&mut self, flag: &Flag, now: DateTime<Utc>) {
        let expires = now + Duration::seconds(i64::from(flag.cooldown()));
        self.cooldowns.insert(flag.id().to_string(), expires);
    }

    pub fn is_on_cooldown(&self, flag: &Flag) -> bool {
        self.is_on_cooldown_at(flag, Utc::now())
    }

    pub fn is_on_cooldown_at(&self, flag: &Flag, now: DateTime<Utc>) -> bool {
        self.cooldowns
            .get(flag.id())
            .is_some_and(|expires| *expires > now)
    }
}
