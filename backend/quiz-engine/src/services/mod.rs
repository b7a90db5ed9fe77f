pub mod color_palette;
pub mod preference_store;
pub mod question_generator;
pub mod scoring_service;
pub mod session_service;

pub use color_palette::ColorPalette;
pub use preference_store::{
    InMemoryPreferenceStore, JsonFilePreferenceStore, PreferenceStore, Preferences,
};
pub use question_generator::{QuestionGenerator, ShadeSettings, ShadeTuning};
pub use scoring_service::{SessionSummary, Verdict};
pub use session_service::{FeedbackTimings, SessionSettings, SessionStateMachine};
