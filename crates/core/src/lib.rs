//! Core of the Kodi voice skill.
//!
//! - `normalize` canonicalizes spoken and catalog text for comparison
//! - `resolver` matches a spoken query against a catalog snapshot
//! - `dialog` holds the single pending disambiguation and its transition table
//! - `gateway` is the seam to the media center (the HTTP client lives in `kodi-voice-gateway`)
//!
//! Nothing in this crate performs I/O on its own; every side effect goes through the
//! `MediaGateway` trait.

pub mod audit;
pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod normalize;
pub mod resolver;

pub use dialog::{
    DialogAction, DialogEngine, DialogEvent, DialogState, DialogTransitionError, ListPhase,
    PendingContext, Prompt, Signal, TransitionOutcome,
};
pub use domain::catalog::{CatalogEntry, EntryExtra, MatchSet, MediaKind, Query, QueryCategory};
pub use domain::youtube::YoutubeLinks;
pub use errors::GatewayError;
pub use gateway::{MediaGateway, NavigationKey, ScriptedGateway, SeekStep};
pub use normalize::normalize;
pub use resolver::{DedupPolicy, EntityResolver, Resolution};
