use crate::profile::{LearnerProfile, SessionId};
use crate::similarity;
use crate::word::{normalize, Word};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is not waiting for input")]
    NotAwaitingInput,

    #[error("nothing was typed")]
    EmptyInput,

    #[error("session is not showing feedback")]
    NotInFeedback,

    #[error("session is not complete")]
    NotComplete,

    #[error("session results were already recorded")]
    AlreadyFinalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    AwaitingInput,
    Feedback,
    Complete,
}

/// Outcome of one submitted word
#[derive(Debug, Clone, PartialEq)]
pub struct WordResult {
    pub word: Word,
    pub typed: String,
    pub similarity: f64,
    /// Case-insensitive exact match, computed separately from `similarity`
    pub correct: bool,
}

/// One practice round over a fixed list of words
#[derive(Debug, Clone)]
pub struct PracticeSession {
    id: SessionId,
    words: Vec<Word>,
    cursor: usize,
    input: String,
    results: Vec<WordResult>,
    state: SessionState,
    finalized: bool,
}

impl PracticeSession {
    pub fn new(id: SessionId, words: Vec<Word>) -> Self {
        let state = if words.is_empty() {
            SessionState::Complete
        } else {
            SessionState::AwaitingInput
        };

        debug!(session = %id, words = words.len(), %state, "created practice session");

        Self {
            id,
            words,
            cursor: 0,
            input: String::new(),
            results: Vec::new(),
            state,
            finalized: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The word being practiced; absent once the session is complete
    pub fn current_word(&self) -> Option<&Word> {
        match self.state {
            SessionState::Complete => None,
            _ => self.words.get(self.cursor),
        }
    }

    /// Results so far, index-aligned with [`Self::words`]
    pub fn results(&self) -> &[WordResult] {
        &self.results
    }

    /// Result of the word currently shown as feedback
    pub fn last_result(&self) -> Option<&WordResult> {
        match self.state {
            SessionState::Feedback => self.results.last(),
            _ => None,
        }
    }

    pub fn typed_per_word(&self) -> impl Iterator<Item = &str> + '_ {
        self.results.iter().map(|r| r.typed.as_str())
    }

    pub fn score_per_word(&self) -> impl Iterator<Item = f64> + '_ {
        self.results.iter().map(|r| r.similarity)
    }

    /// Mean similarity of the submitted words
    pub fn average_similarity(&self) -> Option<f64> {
        let scores: Vec<f64> = self.score_per_word().collect();
        crate::util::mean(&scores)
    }

    /// Text typed so far for the current word
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn write(&mut self, c: char) {
        if self.state == SessionState::AwaitingInput && !c.is_control() {
            self.input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.state == SessionState::AwaitingInput {
            self.input.pop();
        }
    }

    /// Submit whatever is in the input buffer
    pub fn submit_input(&mut self) -> Result<&WordResult, SessionError> {
        let typed = self.input.clone();
        self.submit(&typed)
    }

    /// Score `typed` against the current word and move to feedback.
    ///
    /// Rejected without any change unless the session is awaiting input and
    /// `typed` has visible characters.
    pub fn submit(&mut self, typed: &str) -> Result<&WordResult, SessionError> {
        if self.state != SessionState::AwaitingInput {
            return Err(SessionError::NotAwaitingInput);
        }
        let typed = normalize(typed);
        if typed.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let word = self
            .words
            .get(self.cursor)
            .cloned()
            .ok_or(SessionError::NotAwaitingInput)?;

        let similarity = similarity::score(word.text(), &typed);
        let correct = similarity::is_exact_match(word.text(), &typed);

        debug!(
            session = %self.id,
            word = word.text(),
            level = word.level(),
            typed = %typed,
            similarity,
            correct,
            "recorded attempt"
        );

        self.results.push(WordResult {
            word,
            typed,
            similarity,
            correct,
        });
        self.state = SessionState::Feedback;

        self.results.last().ok_or(SessionError::NotAwaitingInput)
    }

    /// Leave feedback for the next word, or complete the session after the last one
    pub fn advance(&mut self) -> Result<SessionState, SessionError> {
        if self.state != SessionState::Feedback {
            return Err(SessionError::NotInFeedback);
        }

        self.cursor += 1;
        self.input.clear();
        self.state = if self.cursor >= self.words.len() {
            SessionState::Complete
        } else {
            SessionState::AwaitingInput
        };
        Ok(self.state)
    }

    /// Append one record per attempted word to `profile`.
    ///
    /// Only allowed once, and only after the session is complete. Returns the
    /// number of records appended. Persisting the profile is up to the caller.
    pub fn finalize(&mut self, profile: &mut LearnerProfile) -> Result<usize, SessionError> {
        if self.state != SessionState::Complete {
            return Err(SessionError::NotComplete);
        }
        if self.finalized {
            return Err(SessionError::AlreadyFinalized);
        }

        for result in &self.results {
            profile.append_record(
                self.id,
                &result.typed,
                result.word.text(),
                result.word.level(),
                result.similarity,
            );
        }
        self.finalized = true;

        info!(
            session = %self.id,
            learner = profile.name(),
            records = self.results.len(),
            "session results added to profile"
        );
        Ok(self.results.len())
    }
}
