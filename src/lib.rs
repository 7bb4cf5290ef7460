#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::doc_markdown
)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod shadow;
pub mod skill;

pub use config::Config;
pub use error::{SkillError, SkillResult};
pub use shadow::{HttpShadowClient, ShadowClient, StateDocument};
pub use skill::{IntentRouter, RequestEnvelope, ResponseEnvelope};
