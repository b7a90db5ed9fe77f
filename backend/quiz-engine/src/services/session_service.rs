use chrono::Utc;
use futures::stream::{self, Stream};
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::{
    runtime::Handle,
    sync::watch,
    task::AbortHandle,
    time::{sleep_until, Instant},
};
use uuid::Uuid;

use super::color_palette::ColorPalette;
use super::preference_store::{
    self, JsonFilePreferenceStore, PreferenceStore, Preferences, DIFFICULTY_KEY, GAME_MODE_KEY,
};
use super::question_generator::QuestionGenerator;
use super::scoring_service::{self, SessionSummary};
use crate::config::Config;
use crate::error::PreferenceError;
use crate::metrics::{
    ANSWERS_SUBMITTED_TOTAL, ANSWER_TIME_SECONDS, FINAL_SCORE, QUIZ_SESSIONS_ACTIVE,
    QUIZ_SESSIONS_TOTAL,
};
use crate::models::{
    AnswerOption, AnswerOutcome, AnsweredRecord, Difficulty, GameMode, Screen, SessionState,
    DEFAULT_TOTAL_QUESTIONS, UNSET_AVERAGE_TIME,
};

/// How long the correct/incorrect styling stays up before the quiz moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackTimings {
    pub correct: Duration,
    pub incorrect: Duration,
}

impl Default for FeedbackTimings {
    fn default() -> Self {
        Self {
            correct: Duration::from_millis(500),
            incorrect: Duration::from_millis(1000),
        }
    }
}

impl FeedbackTimings {
    pub fn for_outcome(&self, was_correct: bool) -> Duration {
        if was_correct {
            self.correct
        } else {
            self.incorrect
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub default_total_questions: usize,
    pub feedback: FeedbackTimings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_total_questions: DEFAULT_TOTAL_QUESTIONS,
            feedback: FeedbackTimings::default(),
        }
    }
}

/// Identifies the answer a feedback timer was started for. A timer whose
/// token no longer matches the live session is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackToken {
    pub session_id: Uuid,
    pub question_index: usize,
}

struct PendingFeedback {
    token: FeedbackToken,
    abort: AbortHandle,
}

struct SessionCore {
    state: SessionState,
    generator: QuestionGenerator<StdRng>,
    store: Box<dyn PreferenceStore>,
    feedback: FeedbackTimings,
    question_started_at: Instant,
    pending: Option<PendingFeedback>,
    updates: watch::Sender<SessionState>,
}

/// Owns the quiz lifecycle: HOME -> GAME (-> feedback) -> RESULT -> HOME.
///
/// All mutation goes through the intent methods below; the presentation
/// layer observes [`SessionState`] snapshots via [`Self::subscribe`]. Intents
/// never fail: invalid ones are ignored and report `false`.
///
/// The handle is cheap to clone. Feedback delays run as tasks on the runtime
/// passed at construction, and answer timing follows that runtime's clock, so
/// intents may be issued from any thread.
#[derive(Clone)]
pub struct SessionStateMachine {
    core: Arc<Mutex<SessionCore>>,
    runtime: Handle,
}

impl SessionStateMachine {
    pub fn new(
        generator: QuestionGenerator<StdRng>,
        store: Box<dyn PreferenceStore>,
        settings: SessionSettings,
        runtime: Handle,
    ) -> Self {
        let prefs = Preferences::load(store.as_ref());
        let total_questions = if settings.default_total_questions > 0 {
            settings.default_total_questions
        } else {
            DEFAULT_TOTAL_QUESTIONS
        };

        let mut state = SessionState::home(prefs.game_mode, prefs.difficulty, total_questions);
        state.high_score = prefs.high_score;
        state.high_score_average_time = prefs.high_score_average_time;

        tracing::info!(
            "Quiz engine ready: mode={}, difficulty={}, high_score={:.1}",
            state.mode,
            state.difficulty,
            state.high_score
        );

        let question_started_at = {
            let _clock = runtime.enter();
            Instant::now()
        };
        let (updates, _) = watch::channel(state.clone());
        Self {
            core: Arc::new(Mutex::new(SessionCore {
                state,
                generator,
                store,
                feedback: settings.feedback,
                question_started_at,
                pending: None,
                updates,
            })),
            runtime,
        }
    }

    /// Standard palette, JSON preference file and timings from `config`.
    pub fn from_config(config: &Config, runtime: Handle) -> Result<Self, PreferenceError> {
        let store = JsonFilePreferenceStore::open(&config.preferences_path)?;
        tracing::debug!("Using preference file {}", store.path().display());
        let generator = match config.rng_seed {
            Some(seed) => QuestionGenerator::seeded(ColorPalette::standard(), config.shade, seed),
            None => QuestionGenerator::from_entropy(ColorPalette::standard(), config.shade),
        };
        Ok(Self::new(
            generator,
            Box::new(store),
            config.session_settings(),
            runtime,
        ))
    }

    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        lock_core(&self.core)
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.lock().updates.subscribe()
    }

    /// Every state published after the call, in order; intermediate states
    /// may be skipped if the consumer falls behind.
    pub fn snapshot_stream(&self) -> impl Stream<Item = SessionState> {
        stream::unfold(self.subscribe(), |mut rx| async move {
            rx.changed().await.ok()?;
            let state = rx.borrow_and_update().clone();
            Some((state, rx))
        })
    }

    /// Available once the session reached RESULT.
    pub fn summary(&self) -> Option<SessionSummary> {
        let core = self.lock();
        let state = &core.state;
        if state.screen != Screen::Result {
            return None;
        }
        let score = state.final_score?;
        Some(SessionSummary::new(
            state.mode,
            state.correct_count,
            state.total_questions,
            &state.times,
            score,
        ))
    }

    /// Starts a fresh session from HOME or RESULT.
    pub fn start(&self) -> bool {
        let _clock = self.runtime.enter();
        self.lock().start()
    }

    /// Records when the current question became visible. Elapsed answer time
    /// counts from the latest mark.
    pub fn mark_question_start(&self) {
        let _clock = self.runtime.enter();
        self.lock().question_started_at = Instant::now();
    }

    pub fn submit_answer(&self, option: AnswerOption) -> bool {
        self.answer(option)
    }

    /// Always scored incorrect.
    pub fn skip_question(&self) -> bool {
        self.answer(AnswerOption::Skipped)
    }

    /// Back to HOME from any screen. Settings and high score are kept and any
    /// pending feedback transition is cancelled.
    pub fn reset_game(&self) {
        self.lock().reset();
    }

    pub fn clear_high_score(&self) {
        self.lock().clear_high_score();
    }

    pub fn set_game_mode(&self, mode: GameMode) -> bool {
        let mut core = self.lock();
        if !core.accepts_settings("game mode") {
            return false;
        }
        core.state.mode = mode;
        core.persist_string(GAME_MODE_KEY, mode.as_str());
        core.publish();
        true
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) -> bool {
        let mut core = self.lock();
        if !core.accepts_settings("difficulty") {
            return false;
        }
        core.state.difficulty = difficulty;
        core.persist_string(DIFFICULTY_KEY, difficulty.as_str());
        core.publish();
        true
    }

    /// Zero is ignored.
    pub fn set_total_questions(&self, count: usize) -> bool {
        let mut core = self.lock();
        if count == 0 {
            tracing::debug!("Ignoring non-positive question count");
            return false;
        }
        if !core.accepts_settings("question count") {
            return false;
        }
        core.state.total_questions = count;
        core.publish();
        true
    }

    fn answer(&self, option: AnswerOption) -> bool {
        let _clock = self.runtime.enter();
        let mut core = self.lock();
        let Some((token, delay)) = core.record_answer(option) else {
            return false;
        };

        // The task blocks on the lock until `pending` is in place.
        let shared = Arc::clone(&self.core);
        let deadline = Instant::now() + delay;
        let task = self.runtime.spawn(async move {
            sleep_until(deadline).await;
            Self::on_feedback_elapsed(&shared, token);
        });
        core.pending = Some(PendingFeedback {
            token,
            abort: task.abort_handle(),
        });
        true
    }

    fn on_feedback_elapsed(core: &Arc<Mutex<SessionCore>>, token: FeedbackToken) -> bool {
        lock_core(core).finish_feedback(token)
    }
}

fn lock_core(core: &Mutex<SessionCore>) -> MutexGuard<'_, SessionCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionCore {
    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }

    fn cancel_pending_feedback(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort.abort();
            tracing::debug!(
                "Cancelled feedback timer for question {}",
                pending.token.question_index
            );
        }
    }

    fn accepts_settings(&self, setting: &str) -> bool {
        if self.state.screen == Screen::Home {
            return true;
        }
        tracing::debug!(
            "Ignoring {} change while {:?} is active",
            setting,
            self.state.screen
        );
        false
    }

    fn persist_string(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.put_string(key, value) {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }

    fn load_question(&mut self) {
        let question = self
            .generator
            .generate(self.state.mode, self.state.difficulty);
        self.state.current_question = Some(question);
        self.state.selected_answer = None;
        self.state.answered = false;
        self.question_started_at = Instant::now();
    }

    fn start(&mut self) -> bool {
        if self.state.screen == Screen::Game {
            tracing::debug!("Ignoring start while a session is in progress");
            return false;
        }
        self.cancel_pending_feedback();

        let state = &mut self.state;
        state.session_id = Uuid::new_v4();
        state.screen = Screen::Game;
        state.current_index = 0;
        state.correct_count = 0;
        state.times.clear();
        state.incorrect_answers.clear();
        state.feedback_active = false;
        state.last_answer_correct = None;
        state.correct_option_for_display = None;
        state.final_score = None;
        self.load_question();

        QUIZ_SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        QUIZ_SESSIONS_ACTIVE.inc();
        tracing::info!(
            "Session {} started: mode={}, difficulty={}, questions={}",
            self.state.session_id,
            self.state.mode,
            self.state.difficulty,
            self.state.total_questions
        );

        self.publish();
        true
    }

    fn record_answer(&mut self, option: AnswerOption) -> Option<(FeedbackToken, Duration)> {
        if self.state.screen != Screen::Game || self.state.answered || self.state.feedback_active
        {
            tracing::debug!("Ignoring answer outside an open question");
            return None;
        }
        let question = self.state.current_question.clone()?;

        let elapsed = self.question_started_at.elapsed();
        let elapsed_millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let was_correct = question.is_correct(&option);
        let outcome = AnswerOutcome::classify(&option, was_correct);

        let state = &mut self.state;
        state.times.push(elapsed_millis);
        state.selected_answer = Some(option.clone());
        state.answered = true;
        state.correct_option_for_display = Some(question.correct_answer.clone());
        state.last_answer_correct = Some(was_correct);
        state.feedback_active = true;

        if was_correct {
            state.correct_count += 1;
        } else {
            state.incorrect_answers.push(AnsweredRecord {
                game_mode: question.mode,
                question,
                selected: option,
                was_correct: false,
                elapsed_millis,
                answered_at: Utc::now(),
            });
        }

        ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&[state.mode.as_str(), outcome.as_str()])
            .inc();
        ANSWER_TIME_SECONDS.observe(elapsed.as_secs_f64());
        tracing::debug!(
            "Question {}/{} answered: outcome={}, elapsed={}ms",
            state.current_index + 1,
            state.total_questions,
            outcome.as_str(),
            elapsed_millis
        );

        let token = FeedbackToken {
            session_id: state.session_id,
            question_index: state.current_index,
        };
        self.publish();

        Some((token, self.feedback.for_outcome(was_correct)))
    }

    fn finish_feedback(&mut self, token: FeedbackToken) -> bool {
        let current = self.pending.as_ref().map(|pending| pending.token);
        if current != Some(token)
            || self.state.screen != Screen::Game
            || self.state.session_id != token.session_id
            || self.state.current_index != token.question_index
            || !self.state.feedback_active
        {
            tracing::debug!(
                "Discarding stale feedback timer for question {}",
                token.question_index
            );
            return false;
        }
        self.pending = None;

        self.state.feedback_active = false;
        self.state.last_answer_correct = None;
        self.state.correct_option_for_display = None;

        let next = self.state.current_index + 1;
        if next >= self.state.total_questions {
            self.finish_session();
        } else {
            self.state.current_index = next;
            self.load_question();
        }

        self.publish();
        true
    }

    fn finish_session(&mut self) {
        let state = &mut self.state;
        let score =
            scoring_service::final_score(state.correct_count, state.total_questions, &state.times);
        let average = scoring_service::average_seconds(&state.times);

        state.screen = Screen::Result;
        state.final_score = Some(score);

        FINAL_SCORE.observe(score);
        QUIZ_SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
        QUIZ_SESSIONS_ACTIVE.dec();
        tracing::info!(
            "Session {} finished: correct={}/{}, avg={:.2}s, score={:.1}",
            state.session_id,
            state.correct_count,
            state.total_questions,
            average,
            score
        );

        if score > state.high_score {
            state.high_score = score;
            state.high_score_average_time = average;
            tracing::info!("New high score {:.1}", score);
            if let Err(e) = preference_store::persist_high_score(self.store.as_mut(), score, average)
            {
                tracing::warn!("Failed to persist high score: {}", e);
            }
        }
    }

    fn reset(&mut self) {
        self.cancel_pending_feedback();
        if self.state.screen == Screen::Game {
            QUIZ_SESSIONS_TOTAL.with_label_values(&["abandoned"]).inc();
            QUIZ_SESSIONS_ACTIVE.dec();
            tracing::info!("Session {} abandoned", self.state.session_id);
        }

        let state = &mut self.state;
        state.session_id = Uuid::new_v4();
        state.screen = Screen::Home;
        state.feedback_active = false;
        state.last_answer_correct = None;
        state.correct_option_for_display = None;
        self.publish();
    }

    fn clear_high_score(&mut self) {
        self.state.high_score = 0.0;
        self.state.high_score_average_time = UNSET_AVERAGE_TIME;
        if let Err(e) = preference_store::clear_high_score(self.store.as_mut()) {
            tracing::warn!("Failed to clear stored high score: {}", e);
        }
        tracing::info!("High score cleared");
        self.publish();
    }
}
