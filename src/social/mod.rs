//! Social platform integration.
//!
//! # Data Flow
//! ```text
//! video id
//!     → CommentSource::fetch_comments (ayrshare.rs over HTTPS)
//!     → Vec<Comment> (types.rs)
//!
//! paid winner
//!     → Notifier::notify (reply under the winning comment)
//! ```
//!
//! # Design Decisions
//! - Both collaborators sit behind traits so the core can run against mocks
//! - Neither trait retries; the pipeline decides what a failure means

pub mod ayrshare;
pub mod types;

pub use ayrshare::AyrshareClient;
pub use types::{Comment, CommentSource, Notifier, SocialError, SocialResult};
