//! Comment-driven token giveaway.
//!
//! Reads the comments of a video, keeps one wallet per participant and one
//! participant per wallet, draws winners at random and sends each of them a
//! fixed token amount exactly once.

pub mod blockchain;
pub mod config;
pub mod context;
pub mod disbursement;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod selection;
pub mod social;

pub use config::GiveawayConfig;
pub use context::GiveawayContext;
pub use pipeline::Giveaway;
