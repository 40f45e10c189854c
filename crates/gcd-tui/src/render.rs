//! Pure view functions.
//!
//! Everything here takes `&AppState`, draws to a ratatui `Frame`, and never
//! mutates state or returns effects.

use gcd_core::workflow::FetchStatus;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::state::{AppState, NoticeLevel, Screen};

/// Spinner frames for in-flight work.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Ticks per spinner frame.
const SPINNER_SPEED_DIVISOR: usize = 6;

struct Hint<'a> {
    key: &'a str,
    action: &'a str,
    enabled: bool,
}

impl<'a> Hint<'a> {
    fn new(key: &'a str, action: &'a str) -> Self {
        Self {
            key,
            action,
            enabled: true,
        }
    }

    fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Renders the whole view.
pub fn render(app: &AppState, frame: &mut Frame) {
    let [header, body, notice, hints] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, header);

    match &app.screen {
        Screen::Checking => {
            render_centered(
                frame,
                body,
                Line::from(format!("{} Checking session...", spinner(app))),
            );
            render_hints(frame, hints, &[Hint::new("q", "quit")]);
        }
        Screen::Redirecting { url, pasted, error } => {
            render_redirecting(frame, body, url, pasted, error.as_deref());
            render_hints(
                frame,
                hints,
                &[
                    Hint::new("Enter", "continue"),
                    Hint::new("Ctrl+O", "reopen browser"),
                    Hint::new("Ctrl+U", "clear"),
                    Hint::new("Esc", "quit"),
                ],
            );
        }
        Screen::Failed { message } => {
            let text = Paragraph::new(vec![
                Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(Span::styled(
                    "Is the server running? Check `server_url` in the config.",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(text, vertical_center(body, 3));
            render_hints(
                frame,
                hints,
                &[Hint::new("r", "retry"), Hint::new("q", "quit")],
            );
        }
        Screen::Catalog => {
            render_catalog(frame, body, app);
            render_hints(frame, hints, &catalog_hints(app));
        }
    }

    render_notice(frame, notice, app);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            "gcd",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  classroom course export",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_redirecting(
    frame: &mut Frame,
    area: Rect,
    url: &str,
    pasted: &str,
    error: Option<&str>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Sign in ")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let masked = "•".repeat(pasted.chars().count().min(inner.width as usize / 2));
    let mut lines = vec![
        Line::from("Your session is not signed in. Authorize in the browser:"),
        Line::from(""),
        Line::from(Span::styled(url, Style::default().fg(Color::Cyan))),
        Line::from(""),
        Line::from("Then paste the session cookie set by the server and press Enter."),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(masked),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]),
    ];
    if let Some(error) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error,
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn render_catalog(frame: &mut Frame, area: Rect, app: &AppState) {
    let title = match app.catalog.status() {
        FetchStatus::Success(courses) => format!(
            " Courses · {} of {} selected ",
            app.selection.len(),
            courses.len()
        ),
        FetchStatus::Loading | FetchStatus::Error(_) => " Courses ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.catalog.status() {
        FetchStatus::Loading => {
            render_centered(
                frame,
                inner,
                Line::from(format!("{} Loading courses...", spinner(app))),
            );
        }
        FetchStatus::Error(message) => {
            render_centered(
                frame,
                inner,
                Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Red))),
            );
        }
        FetchStatus::Success(courses) if courses.is_empty() => {
            render_centered(
                frame,
                inner,
                Line::from(Span::styled(
                    "No courses.",
                    Style::default().fg(Color::DarkGray),
                )),
            );
        }
        FetchStatus::Success(courses) => {
            let items: Vec<ListItem> = courses
                .iter()
                .map(|course| {
                    let selected = app.selection.contains(&course.id);
                    let mark = if selected { "[x] " } else { "[ ] " };
                    let mut spans = vec![
                        Span::styled(
                            mark,
                            Style::default().fg(if selected {
                                Color::Green
                            } else {
                                Color::DarkGray
                            }),
                        ),
                        Span::raw(course.name.as_str()),
                    ];
                    if let Some(section) = course.section_label() {
                        spans.push(Span::styled(
                            format!("  {section}"),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect();

            let list = List::new(items)
                .highlight_style(
                    Style::default()
                        .bg(Color::Cyan)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ");
            let mut list_state = ListState::default().with_selected(Some(app.cursor));
            frame.render_stateful_widget(list, inner, &mut list_state);
        }
    }
}

fn catalog_hints(app: &AppState) -> Vec<Hint<'static>> {
    let export = if app.export.is_busy() {
        Hint::new("Enter", "exporting...").enabled(false)
    } else {
        Hint::new("Enter", "export").enabled(app.export_enabled())
    };
    vec![
        Hint::new("↑↓", "move"),
        Hint::new("Space", "select"),
        export,
        Hint::new("Esc", "cancel").enabled(app.transfer_running()),
        Hint::new("r", "reload"),
        Hint::new("R", "import"),
        Hint::new("x", "sign out"),
        Hint::new("q", "quit"),
    ]
}

fn render_notice(frame: &mut Frame, area: Rect, app: &AppState) {
    let Some(notice) = &app.notice else {
        return;
    };
    let color = match notice.level {
        NoticeLevel::Info => Color::Gray,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Error => Color::Red,
    };
    let mut spans = Vec::new();
    if app.transfer_running() || app.tasks.sign_out.is_running() {
        spans.push(Span::styled(
            format!("{} ", spinner(app)),
            Style::default().fg(color),
        ));
    }
    spans.push(Span::styled(
        notice.text.as_str(),
        Style::default().fg(color),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_hints(frame: &mut Frame, area: Rect, hints: &[Hint<'_>]) {
    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        }
        let key_color = if hint.enabled {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        spans.push(Span::styled(hint.key, Style::default().fg(key_color)));
        spans.push(Span::styled(
            format!(" {}", hint.action),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn render_centered(frame: &mut Frame, area: Rect, line: Line<'_>) {
    frame.render_widget(
        Paragraph::new(line).alignment(Alignment::Center),
        vertical_center(area, 1),
    );
}

fn vertical_center(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(area.x, y, area.width, height)
}

fn spinner(app: &AppState) -> &'static str {
    SPINNER_FRAMES[(app.spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len()]
}
