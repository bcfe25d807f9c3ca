//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file
//!     → loader.rs (parse & deserialize, defaults for missing sections)
//!     → loader.rs (environment overrides: TIKTOK_VIDEO_ID, LEA_TO_SEND, ...)
//!     → validation.rs (semantic checks, all errors reported at once)
//!     → GiveawayConfig (validated, immutable)
//!     → shared via Arc through GiveawayContext
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a run never reloads it
//! - All fields have defaults so a config file is optional
//! - Credentials are wrapped in `Secret` and never printed

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, read_config, ConfigError};
pub use validation::{validate_config, ValidationError};
pub use schema::{
    CampaignConfig, DisbursementConfig, GiveawayConfig, LedgerConfig, ObservabilityConfig,
    Secret, SocialConfig, WinnerRetryConfig,
};
