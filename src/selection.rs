use crate::catalog::WordCatalog;
use crate::profile::LearnerProfile;
use crate::word::Word;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const DEFAULT_SESSION_SIZE: usize = 3;

/// Picks the words for the next practice session.
///
/// New learners get level 1 words only. Everyone else gets a blend of their
/// weakest words, words one level above their own, and words at their level,
/// topped up from anywhere in the catalog if those run dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBuilder {
    session_size: usize,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_SIZE)
    }
}

impl SessionBuilder {
    /// A session size of 0 is raised to 1
    pub fn new(session_size: usize) -> Self {
        Self {
            session_size: session_size.max(1),
        }
    }

    pub fn session_size(&self) -> usize {
        self.session_size
    }

    /// Split the session size over (weak, above, same) as evenly as possible,
    /// with any remainder going to the earlier categories.
    pub fn category_targets(&self) -> [usize; 3] {
        let base = self.session_size / 3;
        let remainder = self.session_size % 3;
        let mut targets = [base; 3];
        for target in targets.iter_mut().take(remainder) {
            *target += 1;
        }
        targets
    }

    /// Build an ordered, duplicate-free word list of at most `session_size` words.
    ///
    /// Fewer words come back only when the catalog cannot supply enough.
    pub fn build<R: Rng + ?Sized>(
        &self,
        catalog: &WordCatalog,
        profile: Option<&LearnerProfile>,
        rng: &mut R,
    ) -> Vec<Word> {
        let profile = match profile {
            Some(p) if !p.is_empty() => p,
            _ => return self.build_for_new_learner(catalog, rng),
        };

        let [weak_target, above_target, _] = self.category_targets();
        let mut picked = Picked::default();

        // Weakest words first, in worst-first order
        profile
            .weak_words()
            .iter()
            .filter_map(|w| catalog.find(&w.word))
            .take(weak_target)
            .for_each(|w| picked.push(w));
        let weak_count = picked.len();

        let level = profile.derive_level();
        let above = (level + 1).min(catalog.max_level());
        let candidates = picked.available(catalog.words_at_level(above));
        picked.extend(candidates.choose_multiple(rng, above_target).copied());
        let above_count = picked.len() - weak_count;

        // Same level absorbs whatever the first two categories could not fill
        let needed = self.session_size.saturating_sub(picked.len());
        let candidates = picked.available(catalog.words_at_level(level));
        picked.extend(candidates.choose_multiple(rng, needed).copied());
        let same_count = picked.len() - weak_count - above_count;

        let needed = self.session_size.saturating_sub(picked.len());
        if needed > 0 {
            let candidates = picked.available(catalog.words().iter().collect());
            picked.extend(candidates.choose_multiple(rng, needed).copied());
        }

        debug!(
            learner = profile.name(),
            level,
            above,
            weak = weak_count,
            above_count,
            same = same_count,
            filler = picked.len() - weak_count - above_count - same_count,
            "selected session words"
        );

        self.finish(picked, rng)
    }

    fn build_for_new_learner<R: Rng + ?Sized>(&self, catalog: &WordCatalog, rng: &mut R) -> Vec<Word> {
        let mut picked = Picked::default();
        picked.extend(
            catalog
                .words_at_level(1)
                .choose_multiple(rng, self.session_size)
                .copied(),
        );
        self.finish(picked, rng)
    }

    fn finish<R: Rng + ?Sized>(&self, picked: Picked<'_>, rng: &mut R) -> Vec<Word> {
        let mut words: Vec<Word> = picked.words.into_iter().cloned().collect();
        words.shuffle(rng);

        if words.len() < self.session_size {
            warn!(
                requested = self.session_size,
                available = words.len(),
                "not enough words in the catalog for a full session"
            );
        }
        words
    }
}

/// Words chosen so far, with their texts for quick exclusion
#[derive(Default)]
struct Picked<'a> {
    words: Vec<&'a Word>,
    texts: HashSet<&'a str>,
}

impl<'a> Picked<'a> {
    fn len(&self) -> usize {
        self.words.len()
    }

    fn push(&mut self, word: &'a Word) {
        if self.texts.insert(word.text()) {
            self.words.push(word);
        }
    }

    fn extend<I: IntoIterator<Item = &'a Word>>(&mut self, words: I) {
        for word in words {
            self.push(word);
        }
    }

    /// `candidates` minus anything already picked
    fn available(&self, candidates: Vec<&'a Word>) -> Vec<&'a Word> {
        candidates
            .into_iter()
            .filter(|w| !self.texts.contains(w.text()))
            .collect()
    }
}
