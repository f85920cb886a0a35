mod ui;

use beewise::{
    app_dirs::AppDirs,
    catalog::WordCatalog,
    config::{Config, ConfigStore, FileConfigStore},
    practice::{SessionError, SessionState},
    profile::LearnerProfile,
    runtime::{Action, CrosstermEventSource, Runner, TrainerEvent},
    selection::SessionBuilder,
    speech::{CommandSpeaker, SilentSpeaker, Speaker},
    store::{CsvRecordStore, RecordStore},
    trainer::{SessionSummary, Trainer},
    util::percent,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;
const CURSOR_BLINK_TICKS: u64 = 5;
const WEAK_WORDS_SHOWN: usize = 5;

/// hear a word, spell it, and get sessions that adapt to the words you miss
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A spelling trainer that speaks each word aloud, scores what you type by edit distance, and builds each session from your weakest words, your current level and the level above it."
)]
pub struct Cli {
    /// number of words per session
    #[clap(short = 'w', long = "words", value_parser = parse_session_size)]
    session_size: Option<usize>,

    /// word bank CSV with a word,level,source header
    #[clap(short = 'b', long)]
    word_bank: Option<PathBuf>,

    /// learner to practice as (skips the sign-in screen)
    #[clap(short = 'u', long)]
    user: Option<String>,

    /// directory holding learner records
    #[clap(long)]
    users_dir: Option<PathBuf>,

    /// do not speak words aloud
    #[clap(long)]
    mute: bool,

    /// print the learner's level and weak words, then exit
    #[clap(long, requires = "user")]
    stats: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

fn parse_session_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{s}' is not a positive number of words")),
    }
}

impl Cli {
    /// Layer command line overrides on top of the stored configuration
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(size) = self.session_size {
            cfg.session_size = size;
        }
        if let Some(ref path) = self.word_bank {
            cfg.word_bank = Some(path.clone());
        }
        if let Some(ref dir) = self.users_dir {
            cfg.users_dir = Some(dir.clone());
        }
        if self.mute {
            cfg.speech = false;
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AppState {
    SignIn,
    Practice,
    Summary,
}

pub struct App<S: RecordStore> {
    pub trainer: Trainer<S>,
    pub state: AppState,
    pub name_input: String,
    pub summary: Option<SessionSummary>,
    pub notice: Option<String>,
    ticks: u64,
}

impl<S: RecordStore> App<S> {
    pub fn new(trainer: Trainer<S>) -> Self {
        Self {
            trainer,
            state: AppState::SignIn,
            name_input: String::new(),
            summary: None,
            notice: None,
            ticks: 0,
        }
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    pub fn cursor_visible(&self) -> bool {
        (self.ticks / CURSOR_BLINK_TICKS) % 2 == 0
    }

    /// Sign in (or continue as a guest with an empty name) and start practicing
    pub fn begin(&mut self, name: &str) {
        if name.trim().is_empty() {
            self.trainer.sign_out();
        } else {
            self.trainer.sign_in(name);
        }
        self.start_session();
    }

    fn start_session(&mut self) {
        self.summary = None;
        self.trainer.start_session(&mut rand::thread_rng());
        self.state = AppState::Practice;
        self.finish_if_complete();
    }

    fn finish_if_complete(&mut self) {
        let complete = self.trainer.session().is_some_and(|s| s.is_complete());
        if !complete {
            return;
        }
        match self.trainer.finish_session() {
            Ok(summary) => {
                if summary.recorded > 0 && !summary.saved {
                    self.notice = Some("Could not save your progress (see log)".to_string());
                }
                self.summary = Some(summary);
            }
            Err(err) => error!(error = %err, "could not finish session"),
        }
        self.state = AppState::Summary;
    }

    /// Apply one action. Returns false when the app should exit.
    pub fn handle(&mut self, action: Action) -> bool {
        if action == Action::Quit {
            self.trainer.abandon_session();
            return false;
        }

        match self.state {
            AppState::SignIn => match action {
                Action::Type(c) => self.name_input.push(c),
                Action::Backspace => {
                    self.name_input.pop();
                }
                Action::Confirm => {
                    let name = std::mem::take(&mut self.name_input);
                    self.begin(&name);
                }
                _ => {}
            },
            AppState::Practice => self.handle_practice(action),
            AppState::Summary => match action {
                Action::Confirm | Action::Type('n') => self.start_session(),
                Action::Type('s') => {
                    self.trainer.sign_out();
                    self.summary = None;
                    self.state = AppState::SignIn;
                }
                Action::Type('q') => return false,
                _ => {}
            },
        }
        true
    }

    fn handle_practice(&mut self, action: Action) {
        let state = match self.trainer.session() {
            Some(session) => session.state(),
            None => return,
        };

        match (state, action) {
            (SessionState::AwaitingInput, Action::Type(c)) => self.trainer.write(c),
            (SessionState::AwaitingInput, Action::Backspace) => self.trainer.backspace(),
            (SessionState::AwaitingInput, Action::Confirm) => {
                if let Err(err) = self.trainer.submit() {
                    debug!(error = %err, "submit ignored");
                }
            }
            (SessionState::Feedback, Action::Confirm) => match self.trainer.advance() {
                Ok(_) => self.finish_if_complete(),
                Err(SessionError::NotInFeedback) => {}
                Err(err) => error!(error = %err, "could not advance"),
            },
            (_, Action::Replay) => self.trainer.replay(),
            _ => {}
        }
    }
}

fn init_logging(to_file: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beewise=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if !to_file {
        builder.with_writer(io::stderr).init();
        return;
    }

    // The TUI owns the terminal, so interactive runs log to a file
    let log_file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });
    match log_file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => builder.with_writer(io::sink).init(),
    }
}

/// Load the configured word bank, falling back to an empty catalog with a notice
fn load_catalog(cfg: &Config) -> (WordCatalog, Option<String>) {
    let result = match cfg.word_bank {
        Some(ref path) => WordCatalog::load(path),
        None => WordCatalog::bundled(),
    };

    match result {
        Ok(catalog) => {
            let notice = (!catalog.skipped_rows().is_empty()).then(|| {
                format!(
                    "Skipped {} malformed word bank rows",
                    catalog.skipped_rows().len()
                )
            });
            (catalog, notice)
        }
        Err(err) => {
            error!(error = %err, "could not load word bank");
            (
                WordCatalog::default(),
                Some(format!("Could not load word bank: {err}")),
            )
        }
    }
}

fn make_speaker(cfg: &Config) -> Box<dyn Speaker> {
    if !cfg.speech {
        return Box::new(SilentSpeaker);
    }
    match cfg.speech_command {
        Some(ref program) => Box::new(CommandSpeaker::new(program, cfg.speech_rate)),
        None => Box::new(CommandSpeaker::system_default(cfg.speech_rate)),
    }
}

/// Plain-text progress report for `--stats`
fn write_stats<W: Write>(out: &mut W, profile: &LearnerProfile) -> io::Result<()> {
    writeln!(out, "learner: {}", profile.name())?;
    writeln!(
        out,
        "records: {} across {} sessions",
        profile.records().len(),
        profile.session_count()
    )?;
    writeln!(out, "level: {}", profile.derive_level())?;
    if let Some(avg) = profile.average_similarity() {
        writeln!(out, "average similarity: {}%", percent(avg))?;
    }

    let perfect = profile.perfect_counts_by_level();
    if !perfect.is_empty() {
        writeln!(out, "perfect spellings by level:")?;
        for (level, count) in perfect {
            writeln!(out, "  level {level}: {count}")?;
        }
    }

    let weak = profile.weak_words();
    if weak.is_empty() {
        writeln!(out, "weak words: none")?;
    } else {
        writeln!(out, "weak words:")?;
        for w in weak {
            writeln!(
                out,
                "  {} {}% (level {}, {} attempts)",
                w.word,
                percent(w.average_similarity),
                w.level,
                w.attempts
            )?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_store = FileConfigStore::new();
    let cfg = cli.apply(config_store.load());

    init_logging(!cli.stats);

    if cli.save_config {
        config_store.save(&cfg)?;
        info!(path = %config_store.path().display(), "saved config");
    }

    let store = CsvRecordStore::new(cfg.users_dir());

    if cli.stats {
        let name = cli.user.as_deref().unwrap_or_default();
        let profile = LearnerProfile::load(name, &store);
        write_stats(&mut io::stdout().lock(), &profile)?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let (catalog, notice) = load_catalog(&cfg);
    let trainer = Trainer::new(
        catalog,
        SessionBuilder::new(cfg.session_size),
        store,
        make_speaker(&cfg),
    );
    let mut app = App::new(trainer);
    app.notice = notice;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if let Some(ref name) = cli.user {
        app.begin(name);
    }
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, S: RecordStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            TrainerEvent::Tick => app.on_tick(),
            TrainerEvent::Resize => {}
            TrainerEvent::Key(key) => {
                if let Some(action) = Action::from_key(key) {
                    if !app.handle(action) {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beewise::{profile::SessionId, store::MemoryRecordStore, word::Word};

    fn test_app() -> App<MemoryRecordStore> {
        let catalog = WordCatalog::from_words(vec![
            Word::new("bee", 1, "t"),
            Word::new("wax", 1, "t"),
            Word::new("hive", 1, "t"),
            Word::new("honey", 2, "t"),
        ]);
        App::new(Trainer::new(
            catalog,
            SessionBuilder::new(3),
            MemoryRecordStore::default(),
            Box::new(SilentSpeaker),
        ))
    }

    fn type_text(app: &mut App<MemoryRecordStore>, text: &str) {
        for c in text.chars() {
            assert!(app.handle(Action::Type(c)));
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["beewise"]);

        assert_eq!(cli.session_size, None);
        assert_eq!(cli.word_bank, None);
        assert_eq!(cli.user, None);
        assert!(!cli.mute);
        assert!(!cli.stats);
    }

    #[test]
    fn test_cli_words() {
        let cli = Cli::parse_from(["beewise", "-w", "6"]);
        assert_eq!(cli.session_size, Some(6));

        let cli = Cli::parse_from(["beewise", "--words", "9"]);
        assert_eq!(cli.session_size, Some(9));
    }

    #[test]
    fn test_cli_rejects_zero_words() {
        assert!(Cli::try_parse_from(["beewise", "-w", "0"]).is_err());
        assert!(Cli::try_parse_from(["beewise", "-w", "many"]).is_err());
    }

    #[test]
    fn test_cli_stats_requires_user() {
        assert!(Cli::try_parse_from(["beewise", "--stats"]).is_err());
        assert!(Cli::try_parse_from(["beewise", "--stats", "-u", "alice"]).is_ok());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "beewise",
            "-w",
            "5",
            "--mute",
            "-b",
            "/tmp/words.csv",
            "--users-dir",
            "/tmp/users",
        ]);
        let cfg = cli.apply(Config::default());

        assert_eq!(cfg.session_size, 5);
        assert!(!cfg.speech);
        assert_eq!(cfg.word_bank, Some(PathBuf::from("/tmp/words.csv")));
        assert_eq!(cfg.users_dir(), PathBuf::from("/tmp/users"));
    }

    #[test]
    fn test_cli_keeps_config_when_not_overridden() {
        let stored = Config {
            session_size: 8,
            ..Config::default()
        };
        let cfg = Cli::parse_from(["beewise"]).apply(stored.clone());
        assert_eq!(cfg, stored);
    }

    #[test]
    fn test_load_catalog_reports_missing_bank() {
        let cfg = Config {
            word_bank: Some(PathBuf::from("/nonexistent/beewise/words.csv")),
            ..Config::default()
        };
        let (catalog, notice) = load_catalog(&cfg);

        assert!(catalog.is_empty());
        assert!(notice.unwrap().starts_with("Could not load word bank"));
    }

    #[test]
    fn test_load_catalog_defaults_to_bundled() {
        let (catalog, notice) = load_catalog(&Config::default());
        assert!(!catalog.is_empty());
        assert!(notice.is_none());
    }

    #[test]
    fn test_app_sign_in_starts_practice() {
        let mut app = test_app();
        assert_eq!(app.state, AppState::SignIn);

        type_text(&mut app, "Alice");
        assert!(app.handle(Action::Confirm));

        assert_eq!(app.state, AppState::Practice);
        assert_eq!(app.trainer.profile().unwrap().name(), "Alice");
        assert!(app.name_input.is_empty());
    }

    #[test]
    fn test_app_full_round_reaches_summary() {
        let mut app = test_app();
        app.begin("alice");

        for _ in 0..3 {
            let word = app
                .trainer
                .session()
                .and_then(|s| s.current_word())
                .unwrap()
                .text()
                .to_string();
            type_text(&mut app, &word);
            app.handle(Action::Confirm);
            assert_eq!(
                app.trainer.session().unwrap().state(),
                SessionState::Feedback
            );
            app.handle(Action::Confirm);
        }

        assert_eq!(app.state, AppState::Summary);
        let summary = app.summary.as_ref().unwrap();
        assert_eq!(summary.recorded, 3);
        assert!(summary.saved);
        assert_eq!(app.trainer.store().load("alice").unwrap().len(), 3);
    }

    #[test]
    fn test_app_empty_submit_is_ignored() {
        let mut app = test_app();
        app.begin("");

        app.handle(Action::Confirm);
        assert_eq!(
            app.trainer.session().unwrap().state(),
            SessionState::AwaitingInput
        );
    }

    #[test]
    fn test_app_empty_catalog_goes_to_summary() {
        let mut app = App::new(Trainer::new(
            WordCatalog::default(),
            SessionBuilder::new(3),
            MemoryRecordStore::default(),
            Box::new(SilentSpeaker),
        ));
        app.begin("alice");

        assert_eq!(app.state, AppState::Summary);
        assert!(app.summary.as_ref().unwrap().results.is_empty());
    }

    #[test]
    fn test_app_quit_abandons_session() {
        let mut app = test_app();
        app.begin("alice");
        type_text(&mut app, "bee");
        app.handle(Action::Confirm);

        assert!(!app.handle(Action::Quit));
        assert!(app.trainer.session().is_none());
        assert!(app.trainer.profile().unwrap().is_empty());
    }

    #[test]
    fn test_app_summary_switch_learner() {
        let mut app = test_app();
        app.begin("");
        app.state = AppState::Summary;

        app.handle(Action::Type('s'));
        assert_eq!(app.state, AppState::SignIn);
        assert!(app.trainer.profile().is_none());
    }

    #[test]
    fn test_cursor_blinks() {
        let mut app = test_app();
        assert!(app.cursor_visible());
        for _ in 0..CURSOR_BLINK_TICKS {
            app.on_tick();
        }
        assert!(!app.cursor_visible());
    }

    #[test]
    fn test_write_stats() {
        let mut profile = LearnerProfile::new("alice");
        profile.append_record(SessionId::new(1.0), "honey", "honey", 2, 1.0);
        profile.append_record(SessionId::new(2.0), "pithon", "python", 1, 0.5);
        profile.append_record(SessionId::new(2.0), "pythin", "python", 1, 0.6);

        let mut out = Vec::new();
        write_stats(&mut out, &profile).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("learner: alice"));
        assert!(text.contains("records: 3 across 2 sessions"));
        assert!(text.contains("level: 2"));
        assert!(text.contains("  level 2: 1"));
        assert!(text.contains("  python 55% (level 1, 2 attempts)"));
    }

    #[test]
    fn test_write_stats_new_learner() {
        let mut out = Vec::new();
        write_stats(&mut out, &LearnerProfile::new("bob")).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("level: 1"));
        assert!(text.contains("weak words: none"));
        assert!(!text.contains("average similarity"));
    }
}
