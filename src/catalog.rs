use crate::word::{normalize, Word};
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

static WORDBANK_DIR: Dir = include_dir!("src/wordbank");

const DEFAULT_WORDBANK: &str = "words_mixed_levels.csv";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Word bank is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("Bundled word bank not found: {0}")]
    BundledNotFound(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Raw row of the word bank before validation
#[derive(Debug, Deserialize)]
struct WordRow {
    word: String,
    level: String,
    #[serde(default)]
    source: String,
}

/// Why a word bank row was left out of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the source, header included
    pub line: u64,
    pub reason: String,
}

/// The words available for practice, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    words: Vec<Word>,
    index: HashMap<String, usize>,
    skipped: Vec<SkippedRow>,
}

impl WordCatalog {
    /// Build a catalog from already-validated words. Later duplicates are dropped.
    pub fn from_words<I: IntoIterator<Item = Word>>(words: I) -> Self {
        let mut catalog = Self::default();
        for word in words {
            catalog.insert(word, 0);
        }
        catalog
    }

    /// Load the word bank from a CSV file with a `word,level,source` header
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let catalog = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            words = catalog.len(),
            skipped = catalog.skipped_rows().len(),
            "loaded word bank"
        );
        Ok(catalog)
    }

    /// Load the word bank shipped with the binary
    pub fn bundled() -> Result<Self> {
        let file = WORDBANK_DIR
            .get_file(DEFAULT_WORDBANK)
            .ok_or_else(|| CatalogError::BundledNotFound(DEFAULT_WORDBANK.to_string()))?;
        Self::from_reader(file.contents())
    }

    /// Parse word bank rows. Blank words and malformed levels skip the row;
    /// only an unreadable source or a missing column fails the whole load.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in ["word", "level"] {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::MissingColumn(column));
            }
        }

        let mut catalog = Self::default();
        for result in rdr.records() {
            let record = match result {
                Ok(record) => record,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    let line = err.position().map(|p| p.line()).unwrap_or_default();
                    catalog.skip(line, err.to_string());
                    continue;
                }
            };

            let line = record.position().map(|p| p.line()).unwrap_or_default();
            match record.deserialize::<WordRow>(Some(&headers)) {
                Ok(row) => catalog.accept_row(row, line),
                Err(err) => catalog.skip(line, err.to_string()),
            }
        }

        debug!(
            words = catalog.len(),
            max_level = catalog.max_level(),
            "parsed word bank"
        );
        Ok(catalog)
    }

    fn accept_row(&mut self, row: WordRow, line: u64) {
        if row.word.trim().is_empty() {
            self.skip(line, "empty word".to_string());
            return;
        }

        let level = match row.level.trim().parse::<u32>() {
            Ok(level) if level > 0 => level,
            _ => {
                self.skip(line, format!("invalid level '{}'", row.level));
                return;
            }
        };

        self.insert(Word::new(&row.word, level, &row.source), line);
    }

    fn insert(&mut self, word: Word, line: u64) {
        if self.index.contains_key(word.text()) {
            self.skip(line, format!("duplicate word '{}'", word.text()));
            return;
        }
        self.index.insert(word.text().to_string(), self.words.len());
        self.words.push(word);
    }

    fn skip(&mut self, line: u64, reason: String) {
        warn!(line, %reason, "skipping word bank row");
        self.skipped.push(SkippedRow { line, reason });
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Rows that were rejected while loading
    pub fn skipped_rows(&self) -> &[SkippedRow] {
        &self.skipped
    }

    /// Highest level in the catalog, never below 1
    pub fn max_level(&self) -> u32 {
        self.words.iter().map(Word::level).max().unwrap_or(1)
    }

    /// Words tagged with exactly `level`, in catalog order
    pub fn words_at_level(&self, level: u32) -> Vec<&Word> {
        self.words.iter().filter(|w| w.level() == level).collect()
    }

    /// Look a word up by text, ignoring case and surrounding whitespace
    pub fn find(&self, text: &str) -> Option<&Word> {
        self.index.get(&normalize(text)).map(|&i| &self.words[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse(data: &str) -> WordCatalog {
        WordCatalog::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_from_reader_basic() {
        let catalog = parse("word,level,source\nBee,1,test\nhoney,2,test\nrhythm,3,eowl\n");

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.find("bee").unwrap().level(), 1);
        assert_eq!(catalog.find("RHYTHM").unwrap().source(), "eowl");
        assert!(catalog.skipped_rows().is_empty());
    }

    #[test]
    fn test_blank_words_are_skipped() {
        let catalog = parse("word,level,source\n,1,test\n   ,2,test\nhive,1,test\n");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped_rows().len(), 2);
    }

    #[test]
    fn test_bad_level_skips_only_that_row() {
        let catalog = parse("word,level,source\nbee,one,test\nwax,0,test\nhive,2,test\n");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("hive").unwrap().level(), 2);

        let lines: Vec<u64> = catalog.skipped_rows().iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn test_skipped_row_line_counts_blank_lines() {
        let catalog = parse("word,level,source\n\nbee,1,t\n\n\nwax,xx,t\n");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped_rows()[0].line, 6);
    }

    #[test]
    fn test_duplicate_words_keep_first() {
        let catalog = parse("word,level,source\nbee,1,a\nBEE,3,b\n");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("bee").unwrap().level(), 1);
        assert_eq!(catalog.skipped_rows().len(), 1);
    }

    #[test]
    fn test_missing_source_column_is_allowed() {
        let catalog = parse("word,level\nbee,1\n");
        assert_eq!(catalog.find("bee").unwrap().source(), "");
    }

    #[test]
    fn test_missing_level_column_fails_load() {
        let result = WordCatalog::from_reader("word,source\nbee,test\n".as_bytes());
        assert_matches!(result, Err(CatalogError::MissingColumn("level")));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = WordCatalog::load("/nonexistent/beewise/words.csv");
        assert_matches!(result, Err(CatalogError::Io(_)));
    }

    #[test]
    fn test_max_level() {
        let catalog = parse("word,level,source\nbee,1,t\nrhythm,4,t\nhoney,2,t\n");
        assert_eq!(catalog.max_level(), 4);
    }

    #[test]
    fn test_max_level_of_empty_catalog_is_one() {
        assert_eq!(WordCatalog::default().max_level(), 1);
        assert_eq!(parse("word,level,source\n").max_level(), 1);
    }

    #[test]
    fn test_words_at_level() {
        let catalog = parse("word,level,source\nbee,1,t\nwax,1,t\nhoney,2,t\n");

        let level_one: Vec<&str> = catalog.words_at_level(1).iter().map(|w| w.text()).collect();
        assert_eq!(level_one, vec!["bee", "wax"]);
        assert!(catalog.words_at_level(7).is_empty());
    }

    #[test]
    fn test_bundled_word_bank_loads() {
        let catalog = WordCatalog::bundled().unwrap();

        assert!(!catalog.is_empty());
        assert!(catalog.skipped_rows().is_empty());
        assert!(!catalog.words_at_level(1).is_empty());
        assert!(catalog.max_level() >= 3);
    }

    #[test]
    fn test_from_words_dedupes() {
        let catalog = WordCatalog::from_words(vec![
            Word::new("bee", 1, "t"),
            Word::new("Bee", 2, "t"),
            Word::new("hive", 2, "t"),
        ]);
        assert_eq!(catalog.len(), 2);
    }
}
