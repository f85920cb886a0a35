use crate::word::normalize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    Correct,
    Wrong,
    Missing,
}

/// One letter of the correct word and how the learner did on it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LetterMark {
    pub letter: char,
    pub mark: Mark,
}

/// Letter-by-letter view of an attempt, used for highlighted feedback
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LetterFeedback {
    pub letters: Vec<LetterMark>,
    /// The learner typed more characters than the word has
    pub extra_typed: bool,
}

impl LetterFeedback {
    pub fn wrong_count(&self) -> usize {
        self.letters.iter().filter(|l| l.mark != Mark::Correct).count()
    }
}

/// Positional comparison of `correct` against `typed`.
///
/// This is intentionally simpler than the similarity score: a missed letter
/// early in the word shifts everything after it, which is what the learner
/// sees when the two spellings are lined up.
pub fn letter_marks(correct: &str, typed: &str) -> LetterFeedback {
    let correct = normalize(correct);
    let typed: Vec<char> = normalize(typed).chars().collect();

    let letters = correct
        .chars()
        .enumerate()
        .map(|(i, letter)| {
            let mark = match typed.get(i) {
                Some(&t) if t == letter => Mark::Correct,
                Some(_) => Mark::Wrong,
                None => Mark::Missing,
            };
            LetterMark { letter, mark }
        })
        .collect::<Vec<_>>();

    LetterFeedback {
        extra_typed: typed.len() > letters.len(),
        letters,
    }
}
