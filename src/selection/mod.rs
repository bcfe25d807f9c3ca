//! Participant selection.
//!
//! # Data Flow
//! ```text
//! Vec<Comment>
//!     → extractor.rs (keyword + exactly one candidate address per comment)
//!     → dedup.rs (single ordered pass: one wallet per author, one author per wallet)
//!     → winners.rs (uniform shuffle, bounded prefix)
//!     → Vec<Winner>
//! ```
//!
//! # Design Decisions
//! - Ambiguous comments are excluded silently, never partially credited
//! - A wallet claimed by two authors is void for everyone in the batch
//! - Randomness is injected so selection is testable

pub mod dedup;
pub mod extractor;
pub mod winners;

pub use dedup::{Admission, Deduplication, ParticipantDeduplicator, ParticipantRecord, Statistics};
pub use extractor::{extract_candidates, is_candidate_address, validate, WalletAddress};
pub use winners::{select_winners, PaidWinner, Winner};
