use beewise::{
    feedback::{letter_marks, Mark},
    practice::{PracticeSession, SessionState, WordResult},
    store::RecordStore,
    util::percent,
};
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState, WEAK_WORDS_SHOWN};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn green_bold() -> Style {
    bold().fg(Color::Green)
}

fn red_bold() -> Style {
    bold().fg(Color::Red)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn score_style(similarity: f64, correct: bool) -> Style {
    if correct {
        green_bold()
    } else if similarity >= 0.75 {
        bold().fg(Color::Yellow)
    } else {
        red_bold()
    }
}

impl<S: RecordStore> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(1), Constraint::Length(1)].as_ref())
            .split(area);

        let body = match self.state {
            AppState::SignIn => sign_in_lines(self),
            AppState::Practice => match self.trainer.session() {
                Some(session) => practice_lines(self, session),
                None => vec![Line::from("No session")],
            },
            AppState::Summary => summary_lines(self),
        };

        // vertically center the body
        let height = body.len() as u16;
        let top = chunks[0].height.saturating_sub(height) / 2;
        let body_area = Rect {
            y: chunks[0].y + top,
            height: chunks[0].height - top,
            ..chunks[0]
        };
        Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .render(body_area, buf);

        let footer = match &self.notice {
            Some(notice) => Line::from(Span::styled(notice.as_str(), red_bold())),
            None => Line::from(Span::styled(hint(self), italic().patch(dim()))),
        };
        Paragraph::new(footer)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }
}

fn hint<S: RecordStore>(app: &App<S>) -> &'static str {
    match app.state {
        AppState::SignIn => "(enter) start  (esc) quit",
        AppState::Practice => match app.trainer.session().map(|s| s.state()) {
            Some(SessionState::Feedback) => "(enter) next word  (tab) hear again  (esc) quit",
            _ => "(enter) check  (tab) hear again  (esc) quit",
        },
        AppState::Summary => "(n)ew session  (s)witch learner  (q)uit",
    }
}

fn cursor_span<S: RecordStore>(app: &App<S>) -> Span<'static> {
    let cursor = if app.cursor_visible() { "_" } else { " " };
    Span::styled(cursor, dim())
}

fn sign_in_lines<S: RecordStore>(app: &App<S>) -> Vec<Line<'_>> {
    vec![
        Line::from(Span::styled("BeeWise", bold().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "Who is practicing? Leave empty to practice as a guest.",
            italic(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(app.name_input.as_str(), bold()),
            cursor_span(app),
        ]),
    ]
}

fn practice_lines<'a, S: RecordStore>(
    app: &'a App<S>,
    session: &'a PracticeSession,
) -> Vec<Line<'a>> {
    let learner = match app.trainer.profile() {
        Some(profile) => format!("{} (level {})", profile.name(), profile.derive_level()),
        None => "guest".to_string(),
    };
    let total = session.words().len();
    let position = (session.cursor() + 1).min(total);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{learner}  word {position} of {total}"),
            dim(),
        )),
        Line::from(""),
    ];

    match session.state() {
        SessionState::AwaitingInput => {
            lines.push(Line::from(Span::styled(
                "Listen, then type the word you heard",
                italic(),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(session.input(), bold()),
                cursor_span(app),
            ]));
        }
        SessionState::Feedback => {
            if let Some(result) = session.last_result() {
                lines.extend(feedback_lines(result));
            }
        }
        SessionState::Complete => {}
    }
    lines
}

fn feedback_lines(result: &WordResult) -> Vec<Line<'_>> {
    let feedback = letter_marks(result.word.text(), &result.typed);
    let letters = feedback
        .letters
        .iter()
        .map(|m| match m.mark {
            Mark::Correct => Span::styled(m.letter.to_string(), green_bold()),
            Mark::Wrong => Span::styled(m.letter.to_string(), red_bold()),
            Mark::Missing => Span::styled(
                m.letter.to_string(),
                red_bold().add_modifier(Modifier::UNDERLINED),
            ),
        })
        .collect::<Vec<_>>();

    let verdict = if result.correct {
        "Correct!".to_string()
    } else {
        format!("{}% there", percent(result.similarity))
    };

    let mut lines = vec![
        Line::from(letters),
        Line::from(""),
        Line::from(vec![
            Span::styled("you typed ", dim()),
            Span::styled(result.typed.as_str(), bold()),
        ]),
        Line::from(Span::styled(
            verdict,
            score_style(result.similarity, result.correct),
        )),
    ];
    if feedback.extra_typed {
        lines.push(Line::from(Span::styled(
            "(you typed extra letters)",
            italic(),
        )));
    }
    lines
}

fn summary_lines<S: RecordStore>(app: &App<S>) -> Vec<Line<'_>> {
    let mut lines = vec![
        Line::from(Span::styled("Session complete", bold().fg(Color::Yellow))),
        Line::from(""),
    ];

    let Some(summary) = app.summary.as_ref() else {
        return lines;
    };

    if summary.results.is_empty() {
        lines.push(Line::from(Span::styled(
            "No words were available for this session",
            italic(),
        )));
        return lines;
    }

    let word_width = summary
        .results
        .iter()
        .map(|r| r.word.text().width())
        .max()
        .unwrap_or(0);
    let typed_width = summary
        .results
        .iter()
        .map(|r| r.typed.width())
        .max()
        .unwrap_or(0);

    for result in &summary.results {
        let word = result.word.text();
        lines.push(Line::from(vec![
            Span::styled(
                format!("{word}{}", " ".repeat(word_width - word.width())),
                bold(),
            ),
            Span::raw("  "),
            Span::raw(format!(
                "{}{}",
                result.typed,
                " ".repeat(typed_width - result.typed.width())
            )),
            Span::raw("  "),
            Span::styled(
                format!("{:>3}%", percent(result.similarity)),
                score_style(result.similarity, result.correct),
            ),
        ]));
    }

    lines.push(Line::from(""));
    if let Some(avg) = summary.average_similarity {
        lines.push(Line::from(vec![
            Span::styled("average ", dim()),
            Span::styled(format!("{}%", percent(avg)), bold()),
        ]));
    }

    if let Some(profile) = app.trainer.profile() {
        lines.push(Line::from(vec![
            Span::styled("level ", dim()),
            Span::styled(profile.derive_level().to_string(), bold()),
        ]));
        let weak = profile
            .weak_words()
            .into_iter()
            .take(WEAK_WORDS_SHOWN)
            .map(|w| w.word)
            .join(", ");
        if !weak.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("keep practicing ", dim()),
                Span::styled(weak, italic()),
            ]));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "practiced as a guest, nothing was saved",
            italic(),
        )));
    }

    lines
}
