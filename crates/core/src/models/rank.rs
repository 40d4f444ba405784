//! Rank table - named member roles and their scores

/// Banned from the island. Lowest possible rank.
pub const BANNED_RANK: i32 = -1;
/// Anyone who is not a member
pub const VISITOR_RANK: i32 = 0;
pub const COOP_RANK: i32 = 200;
pub const TRUSTED_RANK: i32 = 400;
/// Standard island member, the default protection threshold
pub const MEMBER_RANK: i32 = 500;
pub const SUB_OWNER_RANK: i32 = 900;
/// Island owner. Highest rank a player can hold on an island.
pub const OWNER_RANK: i32 = 1000;
pub const MOD_RANK: i32 = 5000;
pub const ADMIN_RANK: i32 = 10000;

/// Ordered mapping from rank name to score
///
/// Entries are kept sorted by score (lowest first), which is the order
/// reporting views walk them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    ranks: Vec<(String, i32)>,
}

impl Default for RankTable {
    fn default() -> Self {
        Self::from_entries([
            ("banned", BANNED_RANK),
            ("visitor", VISITOR_RANK),
            ("coop", COOP_RANK),
            ("trusted", TRUSTED_RANK),
            ("member", MEMBER_RANK),
            ("sub-owner", SUB_OWNER_RANK),
            ("owner", OWNER_RANK),
            ("mod", MOD_RANK),
            ("admin", ADMIN_RANK),
        ])
    }
}

impl RankTable {
    /// Create an empty table
    pub fn empty() -> Self {
        Self { ranks: Vec::new() }
    }

    /// Build a table from (name, score) pairs. Later duplicates overwrite earlier ones.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let mut table = Self::empty();
        for (name, score) in entries {
            table.set(name, score);
        }
        table
    }

    /// Add a new rank. Returns false if the name is already taken.
    pub fn add(&mut self, name: impl Into<String>, score: i32) -> bool {
        let name = name.into();
        if self.score(&name).is_some() {
            return false;
        }
        self.ranks.push((name, score));
        self.sort();
        true
    }

    /// Insert or overwrite a rank
    pub fn set(&mut self, name: impl Into<String>, score: i32) {
        let name = name.into();
        match self.ranks.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = score,
            None => self.ranks.push((name, score)),
        }
        self.sort();
    }

    /// Remove a rank by name
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.ranks.len();
        self.ranks.retain(|(n, _)| n != name);
        self.ranks.len() != before
    }

    /// Score for a rank name
    pub fn score(&self, name: &str) -> Option<i32> {
        self.ranks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, score)| *score)
    }

    /// First rank name holding this exact score
    pub fn name_of(&self, score: i32) -> Option<&str> {
        self.ranks
            .iter()
            .find(|(_, s)| *s == score)
            .map(|(n, _)| n.as_str())
    }

    /// All ranks, lowest score first
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.ranks.iter().map(|(n, s)| (n.as_str(), *s))
    }

    /// Lowest score strictly above `score`
    pub fn rank_above(&self, score: i32) -> Option<i32> {
        self.ranks.iter().map(|(_, s)| *s).find(|s| *s > score)
    }

    /// Highest score strictly below `score`
    pub fn rank_below(&self, score: i32) -> Option<i32> {
        self.ranks.iter().rev().map(|(_, s)| *s).find(|s| *s < score)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    fn sort(&mut self) {
        // Stable, so equal scores keep insertion order
        self.ranks.sort_by_key(|(_, score)| *score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_sorted() {
        let table = RankTable::default();
        let scores: Vec<i32> = table.iter().map(|(_, s)| s).collect();
        let mut sorted = scores.clone();
        sorted.sort();
        assert_eq!(scores, sorted);
        assert_eq!(table.score("member"), Some(MEMBER_RANK));
        assert_eq!(table.name_of(OWNER_RANK), Some("owner"));
    }

    #[test]
    fn test_add_rejects_duplicate_name() {
        let mut table = RankTable::default();
        assert!(!table.add("member", 42));
        assert_eq!(table.score("member"), Some(MEMBER_RANK));

        assert!(table.add("builder", 700));
        assert_eq!(table.rank_above(MEMBER_RANK), Some(700));
    }

    #[test]
    fn test_set_overwrites_and_resorts() {
        let mut table = RankTable::default();
        table.set("coop", 450);
        assert_eq!(table.rank_above(TRUSTED_RANK), Some(450));
        assert_eq!(table.rank_below(MEMBER_RANK), Some(450));
    }

    #[test]
    fn test_rank_neighbours() {
        let table = RankTable::default();
        assert_eq!(table.rank_above(VISITOR_RANK), Some(COOP_RANK));
        assert_eq!(table.rank_below(VISITOR_RANK), Some(BANNED_RANK));
        assert_eq!(table.rank_above(ADMIN_RANK), None);
        assert_eq!(table.rank_below(BANNED_RANK), None);
        // Scores between ranks snap to the neighbour
        assert_eq!(table.rank_above(450), Some(MEMBER_RANK));
    }

    #[test]
    fn test_remove() {
        let mut table = RankTable::default();
        assert!(table.remove("coop"));
        assert!(!table.remove("coop"));
        assert_eq!(table.rank_above(VISITOR_RANK), Some(TRUSTED_RANK));
    }
}
