//! Storage key layout shared by every component and adapter.

use crate::models::{ItemId, RankBasis};

/// Counter issuing item ids.
pub const ITEM_COUNTER: &str = "item:";
/// Prefix of item attribute records; `item:<id>` is also the ranking member.
pub const ITEM_PREFIX: &str = "item:";
pub const SCORE_RANKING: &str = "score:";
pub const TIME_RANKING: &str = "time:";

pub fn voted(id: ItemId) -> String {
    format!("voted:{id}")
}

pub fn group(name: &str) -> String {
    format!("group:{name}")
}

/// Cached intersection of a group with a global ranking, e.g. `score:rust`.
pub fn group_ranking(name: &str, basis: RankBasis) -> String {
    format!("{}{name}", basis.ranking_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_differ_per_basis() {
        assert_eq!(group_ranking("g", RankBasis::Score), "score:g");
        assert_eq!(group_ranking("g", RankBasis::Time), "time:g");
        assert_eq!(voted(ItemId(3)), "voted:3");
        assert_eq!(group("g"), "group:g");
    }
}
