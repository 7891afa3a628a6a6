//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Rank.
//! Items are identified by a monotonically increasing integer issued by the storage counter.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::keys;

/// Field names of the item attribute record.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const LINK: &str = "link";
    pub const AUTHOR: &str = "poster";
    pub const CREATED_AT: &str = "time";
    pub const VOTES: &str = "votes";
}

/// Identity of a submitted item. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl ItemId {
    /// The storage key of the item record, also used as the ranking member.
    pub fn member(&self) -> String {
        format!("{}{}", keys::ITEM_PREFIX, self.0)
    }

    /// Recovers an id from a ranking member (e.g. `item:42`).
    pub fn from_member(member: &str) -> Result<Self> {
        member
            .strip_prefix(keys::ITEM_PREFIX)
            .ok_or_else(|| AppError::internal(format!("unexpected ranking member {member:?}")))?
            .parse()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u64>()
            .map(ItemId)
            .map_err(|_| AppError::internal(format!("invalid item id {s:?}")))
    }
}

/// A submitted content entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub link: String,
    /// The submitting user
    pub author: String,
    /// Seconds since epoch, set once at submission
    pub created_at: i64,
    /// Starts at 1 (the submitter's implicit vote)
    pub votes: i64,
}

impl Item {
    /// The attribute record written at submission.
    pub fn to_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            (fields::TITLE.to_string(), self.title.clone()),
            (fields::LINK.to_string(), self.link.clone()),
            (fields::AUTHOR.to_string(), self.author.clone()),
            (fields::CREATED_AT.to_string(), self.created_at.to_string()),
            (fields::VOTES.to_string(), self.votes.to_string()),
        ])
    }

    /// Decodes an attribute record. Returns `None` for an empty record (the item is gone).
    pub fn from_fields(id: ItemId, record: &HashMap<String, String>) -> Result<Option<Self>> {
        if record.is_empty() {
            return Ok(None);
        }

        let text = |name: &str| {
            record
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::internal(format!("item {id} is missing field {name:?}")))
        };
        let number = |name: &str| -> Result<i64> {
            text(name)?
                .parse()
                .map_err(|_| AppError::internal(format!("item {id} has a non-numeric {name:?}")))
        };

        Ok(Some(Item {
            id,
            title: text(fields::TITLE)?,
            link: text(fields::LINK)?,
            author: text(fields::AUTHOR)?,
            created_at: number(fields::CREATED_AT)?,
            votes: number(fields::VOTES)?,
        }))
    }
}

/// Which global ordering a page is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankBasis {
    /// creation time + base weight + accumulated vote weight
    Score,
    /// creation time
    Time,
}

impl RankBasis {
    /// Key of the global ordered map for this basis.
    pub fn ranking_key(&self) -> &'static str {
        match self {
            RankBasis::Score => keys::SCORE_RANKING,
            RankBasis::Time => keys::TIME_RANKING,
        }
    }
}

/// Result of a vote. All three are successful outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOutcome {
    Accepted,
    /// The item is unknown or older than the voting window.
    RejectedExpired,
    /// The user already voted for this item (authors vote implicitly).
    RejectedDuplicate,
}

impl VoteOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VoteOutcome::Accepted)
    }
}

/// How member scores are combined by an ordered-map intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
}

impl Aggregate {
    pub fn combine(&self, a: f64, b: f64) -> f64 {
        match self {
            Aggregate::Sum => a + b,
            Aggregate::Min => a.min(b),
            Aggregate::Max => a.max(b),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}
