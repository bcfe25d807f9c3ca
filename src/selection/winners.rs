//! Winner selection.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::selection::dedup::ParticipantRecord;
use crate::selection::extractor::WalletAddress;

/// A drawn participant awaiting disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub author: String,
    pub address: WalletAddress,
    pub comment_id: String,
    pub selected_at: DateTime<Utc>,
}

/// A winner whose tokens have been delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidWinner {
    #[serde(flatten)]
    pub winner: Winner,
    pub signature: String,
    pub disbursed_at: DateTime<Utc>,
}

impl PaidWinner {
    pub fn new(winner: Winner, signature: impl Into<String>) -> Self {
        Self {
            winner,
            signature: signature.into(),
            disbursed_at: Utc::now(),
        }
    }
}

/// Draw up to `count` winners uniformly at random.
///
/// The whole population is shuffled (Fisher–Yates) before the prefix is
/// taken, so input order has no influence. Asking for more winners than
/// there are participants returns everyone.
pub fn select_winners<R>(
    mut participants: Vec<(String, ParticipantRecord)>,
    count: usize,
    rng: &mut R,
) -> Vec<Winner>
where
    R: Rng + ?Sized,
{
    participants.shuffle(rng);
    participants.truncate(count);

    let selected_at = Utc::now();
    participants
        .into_iter()
        .map(|(author, record)| Winner {
            author,
            address: record.address,
            comment_id: record.comment_id,
            selected_at,
        })
        .collect()
}
