use crate::catalog::WordCatalog;
use crate::practice::{PracticeSession, SessionError, SessionState, WordResult};
use crate::profile::{LearnerProfile, SessionId};
use crate::selection::SessionBuilder;
use crate::speech::Speaker;
use crate::store::RecordStore;
use rand::Rng;
use tracing::{info, warn};

/// Summary of a session once its results have been handled
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub results: Vec<WordResult>,
    pub average_similarity: Option<f64>,
    /// Records appended to the learner's profile (0 when practicing as a guest)
    pub recorded: usize,
    /// Whether the learner's records reached the store
    pub saved: bool,
}

/// Owns everything a running trainer needs and hands it explicitly to the
/// session builder and the practice session.
pub struct Trainer<S: RecordStore> {
    catalog: WordCatalog,
    builder: SessionBuilder,
    store: S,
    speaker: Box<dyn Speaker>,
    profile: Option<LearnerProfile>,
    session: Option<PracticeSession>,
}

impl<S: RecordStore> Trainer<S> {
    pub fn new(
        catalog: WordCatalog,
        builder: SessionBuilder,
        store: S,
        speaker: Box<dyn Speaker>,
    ) -> Self {
        Self {
            catalog,
            builder,
            store,
            speaker,
            profile: None,
            session: None,
        }
    }

    pub fn catalog(&self) -> &WordCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn profile(&self) -> Option<&LearnerProfile> {
        self.profile.as_ref()
    }

    pub fn session(&self) -> Option<&PracticeSession> {
        self.session.as_ref()
    }

    /// Load the named learner, replacing any current one. Any session in
    /// progress is abandoned.
    pub fn sign_in(&mut self, name: &str) -> &LearnerProfile {
        self.abandon_session();
        let profile = LearnerProfile::load(name, &self.store);
        info!(learner = %profile, level = profile.derive_level(), "signed in");
        self.profile.insert(profile)
    }

    pub fn sign_out(&mut self) -> Option<LearnerProfile> {
        self.abandon_session();
        self.profile.take()
    }

    /// Build a fresh session for the current learner (or a guest) and speak its first word
    pub fn start_session<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &PracticeSession {
        let words = self
            .builder
            .build(&self.catalog, self.profile.as_ref(), rng);
        let session = PracticeSession::new(SessionId::now(), words);

        if let Some(word) = session.current_word() {
            self.speaker.speak(word.text());
        }
        self.session.insert(session)
    }

    /// Say the current word again
    pub fn replay(&self) {
        if let Some(word) = self.session.as_ref().and_then(|s| s.current_word()) {
            self.speaker.speak(word.text());
        }
    }

    pub fn write(&mut self, c: char) {
        if let Some(session) = self.session.as_mut() {
            session.write(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.backspace();
        }
    }

    /// Submit the typed input for the current word
    pub fn submit(&mut self) -> Result<&WordResult, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotAwaitingInput)?;
        session.submit_input()
    }

    /// Move past feedback, speaking the next word if there is one
    pub fn advance(&mut self) -> Result<SessionState, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotInFeedback)?;
        let state = session.advance()?;
        if let Some(word) = session.current_word() {
            self.speaker.speak(word.text());
        }
        Ok(state)
    }

    /// Record a completed session against the learner and save their history.
    ///
    /// Guests get a summary but nothing is recorded. A failed save is logged;
    /// the records stay in the in-memory profile.
    pub fn finish_session(&mut self) -> Result<SessionSummary, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NotComplete)?;
        if !session.is_complete() {
            return Err(SessionError::NotComplete);
        }

        let (recorded, saved) = match self.profile.as_mut() {
            Some(profile) => {
                let recorded = session.finalize(profile)?;
                let saved = match self.store.save(profile.name(), profile.records()) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(learner = profile.name(), error = %err, "could not save learner records");
                        false
                    }
                };
                (recorded, saved)
            }
            None => {
                info!("guest session finished, nothing recorded");
                (0, false)
            }
        };

        let summary = SessionSummary {
            results: session.results().to_vec(),
            average_similarity: session.average_similarity(),
            recorded,
            saved,
        };
        self.session = None;
        Ok(summary)
    }

    /// Drop the current session without recording anything
    pub fn abandon_session(&mut self) -> Option<PracticeSession> {
        let session = self.session.take();
        if let Some(s) = &session {
            if !s.is_finalized() && !s.results().is_empty() {
                info!(session = %s.id(), attempted = s.results().len(), "abandoned session");
            }
        }
        session
    }
}
