//! Participant deduplication.
//!
//! Comments are processed once, in the order given; that order is the
//! tie-break priority. Two maps are maintained and kept as mutual inverses:
//!
//! ```text
//! by_author:  author  → ParticipantRecord { address, comment_id, created }
//! by_address: address → author
//! ```
//!
//! # Rules
//! - Wallet claimed by a different author: the wallet is contested, the
//!   earlier owner is evicted and the new claim is dropped. A contested
//!   wallet stays void for the rest of the batch.
//! - Same author again: the strictly later comment replaces the earlier one.
//!   A comment without a timestamp neither replaces nor gets replaced.
//! - Otherwise: a fresh binding.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::selection::extractor::{validate, WalletAddress};
use crate::social::Comment;

/// The surviving claim of one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub address: WalletAddress,
    pub comment_id: String,
    pub created: Option<DateTime<Utc>>,
}

impl ParticipantRecord {
    /// Whether `self` is strictly later than `other`. Undated records are
    /// never later and never earlier than anything.
    fn supersedes(&self, other: &ParticipantRecord) -> bool {
        matches!((self.created, other.created), (Some(new), Some(old)) if new > old)
    }
}

/// Counters reported in the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_comments: usize,
    pub unique_participants: usize,
    pub unique_wallets: usize,
    /// Wallets ever claimed by more than one author, including evicted ones.
    pub duplicate_wallets: usize,
}

/// What happened to a single comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// No keyword, or not exactly one address.
    Ignored,
    /// First valid claim by this author.
    Bound { address: WalletAddress },
    /// A later comment replaced the author's earlier claim.
    Replaced {
        address: WalletAddress,
        previous: WalletAddress,
    },
    /// The author already holds a claim that is at least as recent.
    Stale { address: WalletAddress },
    /// The wallet belongs, or belonged, to someone else.
    Contested {
        address: WalletAddress,
        /// Owner evicted by this comment; `None` if the wallet was already void.
        evicted: Option<String>,
    },
}

/// Result of a full pass.
#[derive(Debug, Clone)]
pub struct Deduplication {
    /// Surviving participants ordered by author.
    pub participants: Vec<(String, ParticipantRecord)>,
    pub statistics: Statistics,
}

/// Single-pass deduplicator over a batch of comments.
#[derive(Debug)]
pub struct ParticipantDeduplicator {
    keyword: String,
    by_author: BTreeMap<String, ParticipantRecord>,
    by_address: HashMap<WalletAddress, String>,
    contested: HashSet<WalletAddress>,
    total_comments: usize,
}

impl ParticipantDeduplicator {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            by_author: BTreeMap::new(),
            by_address: HashMap::new(),
            contested: HashSet::new(),
            total_comments: 0,
        }
    }

    /// Run a whole batch and return the result.
    pub fn run<'a, I>(keyword: &str, comments: I) -> Deduplication
    where
        I: IntoIterator<Item = &'a Comment>,
    {
        let mut dedup = Self::new(keyword);
        for comment in comments {
            dedup.push(comment);
        }
        dedup.finish()
    }

    /// Process the next comment of the batch.
    pub fn push(&mut self, comment: &Comment) -> Admission {
        self.total_comments += 1;

        let Some(address) = validate(comment, &self.keyword) else {
            return Admission::Ignored;
        };
        let author = comment.author();

        if self.contested.contains(&address) {
            return Admission::Contested {
                address,
                evicted: None,
            };
        }

        if let Some(owner) = self.by_address.get(&address) {
            if owner != author {
                let evicted = owner.clone();
                self.contested.insert(address.clone());
                self.by_address.remove(&address);
                self.by_author.remove(&evicted);
                return Admission::Contested {
                    address,
                    evicted: Some(evicted),
                };
            }
        }

        let record = ParticipantRecord {
            address: address.clone(),
            comment_id: comment.comment_id().to_string(),
            created: comment.created(),
        };

        match self.by_author.get(author) {
            Some(existing) if record.supersedes(existing) => {
                let previous = existing.address.clone();
                self.by_address.remove(&previous);
                self.bind(author, record);
                Admission::Replaced { address, previous }
            }
            Some(_) => Admission::Stale { address },
            None => {
                self.bind(author, record);
                Admission::Bound { address }
            }
        }
    }

    fn bind(&mut self, author: &str, record: ParticipantRecord) {
        self.by_address
            .insert(record.address.clone(), author.to_string());
        self.by_author.insert(author.to_string(), record);
    }

    /// Current counters.
    pub fn statistics(&self) -> Statistics {
        Statistics {
            total_comments: self.total_comments,
            unique_participants: self.by_author.len(),
            unique_wallets: self.by_address.len(),
            duplicate_wallets: self.contested.len(),
        }
    }

    /// True when the author and address maps are mutual inverses.
    pub fn is_consistent(&self) -> bool {
        self.by_author.len() == self.by_address.len()
            && self.by_author.iter().all(|(author, record)| {
                self.by_address.get(&record.address).map(String::as_str) == Some(author.as_str())
            })
    }

    pub fn finish(self) -> Deduplication {
        debug_assert!(self.is_consistent());
        let statistics = self.statistics();
        Deduplication {
            participants: self.by_author.into_iter().collect(),
            statistics,
        }
    }
}
