#![allow(dead_code)]

use colorquiz_engine::{
    services::{
        ColorPalette, InMemoryPreferenceStore, PreferenceStore, QuestionGenerator,
        SessionSettings, ShadeSettings,
    },
    AnswerOption, SessionState, SessionStateMachine,
};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

pub const SEED: u64 = 0x5eed;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("colorquiz_engine=debug"))
        .try_init();
}

/// Seeded machine backed by `store`, sized to `total` questions. Must be
/// called from within the test's runtime.
pub fn build_machine(store: &InMemoryPreferenceStore, total: usize) -> SessionStateMachine {
    build_machine_with(Box::new(store.clone()), total)
}

pub fn build_machine_with(store: Box<dyn PreferenceStore>, total: usize) -> SessionStateMachine {
    init_tracing();
    let generator =
        QuestionGenerator::seeded(ColorPalette::standard(), ShadeSettings::default(), SEED);
    let machine = SessionStateMachine::new(
        generator,
        store,
        SessionSettings::default(),
        Handle::current(),
    );
    assert!(machine.set_total_questions(total));
    machine
}

pub fn correct_answer(machine: &SessionStateMachine) -> AnswerOption {
    machine
        .snapshot()
        .current_question
        .expect("a question should be loaded")
        .correct_answer
}

pub fn wrong_answer(machine: &SessionStateMachine) -> AnswerOption {
    let question = machine
        .snapshot()
        .current_question
        .expect("a question should be loaded");
    question
        .options
        .into_iter()
        .find(|option| *option != question.correct_answer)
        .expect("question should offer a wrong option")
}

/// Waits (in virtual time when the clock is paused) for a published state
/// matching `condition`.
pub async fn wait_until(
    machine: &SessionStateMachine,
    condition: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    let mut updates = machine.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(30), updates.wait_for(condition))
        .await
        .expect("state was not reached in time")
        .expect("state channel closed")
        .clone();
    state
}
