use colorquiz_engine::{
    models::AnswerOutcome,
    services::{preference_store, InMemoryPreferenceStore, PreferenceStore, Verdict},
    AnswerOption, Difficulty, GameMode, Screen, SessionPhase,
};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{advance, sleep, Instant};

mod common;

#[tokio::test(start_paused = true)]
async fn test_perfect_single_question_sets_high_score() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 1);

    assert!(machine.start());
    advance(Duration::from_secs(1)).await;
    assert!(machine.submit_answer(common::correct_answer(&machine)));

    let state = common::wait_until(&machine, |s| s.screen == Screen::Result).await;
    assert_eq!(state.times, vec![1000]);
    assert_eq!(state.correct_count, 1);
    assert_eq!(state.final_score, Some(100.0));
    assert_eq!(state.high_score, 100.0);
    assert_eq!(state.high_score_average_time, 1.0);

    assert_eq!(store.get_f64(preference_store::HIGH_SCORE_KEY), Some(100.0));
    assert_eq!(
        store.get_f64(preference_store::HIGH_SCORE_AVG_TIME_KEY),
        Some(1.0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_time_counts_from_question_mark() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 2);

    assert!(machine.start());
    advance(Duration::from_secs(2)).await;
    machine.mark_question_start();
    advance(Duration::from_secs(1)).await;
    assert!(machine.submit_answer(common::correct_answer(&machine)));
    assert_eq!(machine.snapshot().times, vec![1000]);

    common::wait_until(&machine, |s| s.current_index == 1).await;
    advance(Duration::from_millis(1500)).await;
    machine.mark_question_start();
    assert!(machine.skip_question());
    assert_eq!(machine.snapshot().times, vec![1000, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_skip_scores_time_component_only_and_keeps_better_high_score() {
    let store = InMemoryPreferenceStore::new();
    let mut seeded = store.clone();
    seeded
        .put_f64(preference_store::HIGH_SCORE_KEY, 90.0)
        .unwrap();
    let machine = common::build_machine(&store, 1);
    assert_eq!(machine.snapshot().high_score, 90.0);

    assert!(machine.start());
    assert!(machine.skip_question());

    let state = common::wait_until(&machine, |s| s.screen == Screen::Result).await;
    assert_eq!(state.final_score, Some(25.0));
    assert_eq!(state.incorrect_answers.len(), 1);
    let record = &state.incorrect_answers[0];
    assert_eq!(record.selected, AnswerOption::Skipped);
    assert_eq!(record.outcome(), AnswerOutcome::Skipped);
    assert_eq!(record.game_mode, GameMode::Normal);

    assert_eq!(state.high_score, 90.0);
    assert_eq!(store.get_f64(preference_store::HIGH_SCORE_KEY), Some(90.0));
}

#[tokio::test(start_paused = true)]
async fn test_feedback_delay_depends_on_correctness() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 3);
    assert!(machine.start());

    assert!(machine.submit_answer(common::correct_answer(&machine)));
    let answered_at = Instant::now();
    let state = machine.snapshot();
    assert_eq!(state.phase(), SessionPhase::GameFeedback);
    assert_eq!(state.last_answer_correct, Some(true));
    assert_eq!(
        state.correct_option_for_display,
        state.selected_answer.clone()
    );

    sleep(Duration::from_millis(499)).await;
    assert!(machine.snapshot().feedback_active);

    let state = common::wait_until(&machine, |s| s.current_index == 1).await;
    assert_eq!(answered_at.elapsed(), Duration::from_millis(500));
    assert!(!state.feedback_active);
    assert!(!state.answered);
    assert_eq!(state.last_answer_correct, None);
    assert_eq!(state.correct_option_for_display, None);

    assert!(machine.submit_answer(common::wrong_answer(&machine)));
    let answered_at = Instant::now();
    assert_eq!(machine.snapshot().last_answer_correct, Some(false));

    common::wait_until(&machine, |s| s.current_index == 2).await;
    assert_eq!(answered_at.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_feedback_cancels_transition() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 2);

    assert!(machine.start());
    assert!(machine.skip_question());
    machine.reset_game();

    let state = machine.snapshot();
    assert_eq!(state.screen, Screen::Home);
    assert!(!state.feedback_active);

    assert!(machine.start());
    let session_id = machine.snapshot().session_id;
    sleep(Duration::from_secs(2)).await;

    let state = machine.snapshot();
    assert_eq!(state.screen, Screen::Game);
    assert_eq!(state.session_id, session_id);
    assert_eq!(state.current_index, 0);
    assert!(!state.answered);
    assert!(state.times.is_empty());
    assert!(state.incorrect_answers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_answers_are_accepted_once_per_question() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 2);
    assert!(machine.start());

    let answer = common::correct_answer(&machine);
    assert!(machine.submit_answer(answer.clone()));
    assert!(!machine.submit_answer(answer));
    assert!(!machine.skip_question());

    let state = machine.snapshot();
    assert_eq!(state.times.len(), 1);
    assert_eq!(state.correct_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_settings_only_change_on_home_screen() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 3);
    assert!(machine.start());

    assert!(!machine.set_game_mode(GameMode::Shade));
    assert!(!machine.set_difficulty(Difficulty::Hard));
    assert!(!machine.set_total_questions(5));
    let state = machine.snapshot();
    assert_eq!(state.mode, GameMode::Normal);
    assert_eq!(state.difficulty, Difficulty::Medium);
    assert_eq!(state.total_questions, 3);
    assert_eq!(store.get_string(preference_store::GAME_MODE_KEY), None);

    machine.reset_game();
    assert!(machine.set_game_mode(GameMode::Shade));
    assert!(machine.set_difficulty(Difficulty::Hard));
    assert!(!machine.set_total_questions(0));
    assert_eq!(
        store.get_string(preference_store::GAME_MODE_KEY).as_deref(),
        Some("SHADE")
    );
    assert_eq!(
        store.get_string(preference_store::DIFFICULTY_KEY).as_deref(),
        Some("HARD")
    );

    let reloaded = common::build_machine(&store, 3).snapshot();
    assert_eq!(reloaded.mode, GameMode::Shade);
    assert_eq!(reloaded.difficulty, Difficulty::Hard);
}

#[tokio::test(start_paused = true)]
async fn test_full_session_produces_summary() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 3);
    assert!(machine.start());

    for index in 0..3 {
        common::wait_until(&machine, |s| s.current_index == index && !s.answered).await;
        advance(Duration::from_secs(3)).await;
        assert!(machine.submit_answer(common::correct_answer(&machine)));
    }

    let state = common::wait_until(&machine, |s| s.screen == Screen::Result).await;
    assert_eq!(state.times, vec![3000, 3000, 3000]);
    let score = state.final_score.expect("final score");
    assert!((score - 95.833_333).abs() < 1e-3);

    let summary = machine.summary().expect("summary on result screen");
    assert_eq!(summary.accuracy_percent, 100);
    assert_eq!(summary.average_seconds, Some(3.0));
    assert_eq!(summary.verdict, Verdict::NoStrongSigns);
    assert!(summary.to_string().contains("Correct: 3/3 (100%)"));
}

#[tokio::test(start_paused = true)]
async fn test_start_from_result_begins_fresh_session() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 1);

    assert!(machine.start());
    assert!(machine.skip_question());
    let finished = common::wait_until(&machine, |s| s.screen == Screen::Result).await;

    assert!(machine.start());
    let state = machine.snapshot();
    assert_ne!(state.session_id, finished.session_id);
    assert_eq!(state.screen, Screen::Game);
    assert_eq!(state.current_index, 0);
    assert_eq!(state.correct_count, 0);
    assert!(state.times.is_empty());
    assert!(state.incorrect_answers.is_empty());
    assert_eq!(state.final_score, None);
}

#[tokio::test(start_paused = true)]
async fn test_clear_high_score_resets_stored_values() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 1);

    assert!(machine.start());
    assert!(machine.submit_answer(common::correct_answer(&machine)));
    common::wait_until(&machine, |s| s.screen == Screen::Result).await;
    assert!(machine.snapshot().has_high_score_time());

    machine.clear_high_score();
    let state = machine.snapshot();
    assert_eq!(state.high_score, 0.0);
    assert!(!state.has_high_score_time());
    assert_eq!(store.get_f64(preference_store::HIGH_SCORE_KEY), None);
    assert_eq!(store.get_f64(preference_store::HIGH_SCORE_AVG_TIME_KEY), None);
}

#[tokio::test(start_paused = true)]
async fn test_shade_session_offers_configured_option_count() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 2);
    assert!(machine.set_game_mode(GameMode::Shade));
    assert!(machine.start());

    let question = machine.snapshot().current_question.expect("question");
    assert_eq!(question.mode, GameMode::Shade);
    assert_eq!(question.options.len(), 9);
    assert_eq!(question.correct_option_count(), 1);

    assert!(machine.submit_answer(common::wrong_answer(&machine)));
    assert_eq!(machine.snapshot().last_answer_correct, Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_stream_follows_transitions() {
    let store = InMemoryPreferenceStore::new();
    let machine = common::build_machine(&store, 1);
    let mut updates = Box::pin(machine.snapshot_stream());

    assert!(machine.start());
    let started = updates.next().await.expect("start published");
    assert_eq!(started.screen, Screen::Game);

    assert!(machine.skip_question());
    let feedback = updates.next().await.expect("answer published");
    assert_eq!(feedback.phase(), SessionPhase::GameFeedback);

    let finished = updates.next().await.expect("result published");
    assert_eq!(finished.screen, Screen::Result);
}
