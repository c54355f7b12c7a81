//! Voice-skill layer: turns recognized intents into resolver and dialog calls, runs the
//! resulting actions against a `MediaGateway`, and answers with a typed response.

pub mod errors;
pub mod intents;
pub mod responses;
pub mod runtime;
pub mod session;

pub use errors::SkillError;
pub use intents::{classify, SkillIntent, SkillRequest};
pub use responses::SkillResponse;
pub use runtime::{KodiSkill, SkillSettings};
pub use session::Session;
