use crate::store::RecordStore;
use crate::word::normalize;
use chrono::Utc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Average similarity at or above which a word no longer needs practice
pub const WEAK_WORD_THRESHOLD: f64 = 0.99;

/// Identifies the session an attempt belongs to.
///
/// Stored as the session's start time in fractional seconds since the Unix
/// epoch. `f64` formatting is shortest-round-trip, so the value survives a
/// write and re-read of the record store unchanged.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(f64);

impl SessionId {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_micros() as f64 / 1_000_000.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<f64>().map(Self)
    }
}

/// One finalized attempt at spelling a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub session_id: SessionId,
    #[serde(rename = "word_typed")]
    pub typed: String,
    pub correct_word: String,
    pub level: u32,
    #[serde(rename = "similarity_score")]
    pub similarity: f64,
}

impl AttemptRecord {
    /// Build a record with normalized text, level floored at 1 and similarity
    /// clamped to `[0, 1]` (NaN counts as 0).
    pub fn new(
        session_id: SessionId,
        typed: &str,
        correct_word: &str,
        level: u32,
        similarity: f64,
    ) -> Self {
        let similarity = if similarity.is_nan() {
            0.0
        } else {
            similarity.clamp(0.0, 1.0)
        };

        Self {
            session_id,
            typed: normalize(typed),
            correct_word: normalize(correct_word),
            level: level.max(1),
            similarity,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.similarity >= 1.0
    }

    fn normalized(self) -> Self {
        Self::new(
            self.session_id,
            &self.typed,
            &self.correct_word,
            self.level,
            self.similarity,
        )
    }
}

/// A word the learner keeps getting wrong, worst first in [`LearnerProfile::weak_words`]
#[derive(Debug, Clone, PartialEq)]
pub struct WeakWord {
    pub word: String,
    pub average_similarity: f64,
    /// Level recorded with the first attempt at this word
    pub level: u32,
    pub attempts: usize,
}

/// A learner and everything they have attempted so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearnerProfile {
    name: String,
    records: Vec<AttemptRecord>,
}

impl LearnerProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            records: Vec::new(),
        }
    }

    pub fn with_records(name: &str, records: Vec<AttemptRecord>) -> Self {
        Self {
            name: name.trim().to_string(),
            records: records.into_iter().map(AttemptRecord::normalized).collect(),
        }
    }

    /// Load a learner's history from `store`.
    ///
    /// A missing history is a new learner. An unreadable one is logged and
    /// treated the same way so practice can continue from level 1.
    pub fn load(name: &str, store: &dyn RecordStore) -> Self {
        match store.load(name) {
            Ok(records) => {
                info!(learner = name, records = records.len(), "loaded learner profile");
                Self::with_records(name, records)
            }
            Err(err) => {
                warn!(learner = name, error = %err, "could not read learner records, starting fresh");
                Self::new(name)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append one attempt. No merging or de-duplication is done.
    pub fn append_record(
        &mut self,
        session_id: SessionId,
        typed: &str,
        correct_word: &str,
        level: u32,
        similarity: f64,
    ) {
        self.records.push(AttemptRecord::new(
            session_id,
            typed,
            correct_word,
            level,
            similarity,
        ));
    }

    /// Number of perfect attempts per level
    pub fn perfect_counts_by_level(&self) -> BTreeMap<u32, usize> {
        self.records
            .iter()
            .filter(|r| r.is_perfect())
            .fold(BTreeMap::new(), |mut counts, r| {
                *counts.entry(r.level).or_insert(0) += 1;
                counts
            })
    }

    /// The level with the most perfect attempts. Ties go to the lowest level;
    /// with no perfect attempts at all the learner is level 1.
    pub fn derive_level(&self) -> u32 {
        let counts = self.perfect_counts_by_level();

        let mut best = (1, 0);
        for (&level, &count) in &counts {
            if count > best.1 {
                best = (level, count);
            }
        }

        debug!(learner = %self.name, level = best.0, ?counts, "derived level");
        best.0
    }

    /// Words whose average similarity is below [`WEAK_WORD_THRESHOLD`], worst
    /// first. Words with equal averages keep the order they were first attempted.
    pub fn weak_words(&self) -> Vec<WeakWord> {
        let mut order: Vec<&str> = Vec::new();
        let mut totals: HashMap<&str, (f64, usize, u32)> = HashMap::new();

        for r in &self.records {
            let entry = totals.entry(r.correct_word.as_str()).or_insert_with(|| {
                order.push(r.correct_word.as_str());
                (0.0, 0, r.level)
            });
            entry.0 += r.similarity;
            entry.1 += 1;
        }

        let mut weak: Vec<WeakWord> = order
            .into_iter()
            .filter_map(|word| {
                let (sum, attempts, level) = totals[word];
                let average_similarity = sum / attempts as f64;
                (average_similarity < WEAK_WORD_THRESHOLD).then(|| WeakWord {
                    word: word.to_string(),
                    average_similarity,
                    level,
                    attempts,
                })
            })
            .collect();

        weak.sort_by(|a, b| a.average_similarity.total_cmp(&b.average_similarity));
        weak
    }

    /// Number of distinct sessions in the history
    pub fn session_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.session_id.value().to_bits())
            .unique()
            .count()
    }

    /// Mean similarity over every attempt, if there are any
    pub fn average_similarity(&self) -> Option<f64> {
        let scores: Vec<f64> = self.records.iter().map(|r| r.similarity).collect();
        crate::util::mean(&scores)
    }
}

impl fmt::Display for LearnerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} records)", self.name, self.records.len())
    }
}
