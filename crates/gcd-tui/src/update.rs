//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gcd_core::{ApiError, ErrorKind};
use gcd_core::workflow::{
    Catalog, CatalogTransition, Course, Delivered, ProbeOutcome, ProbeState, Termination,
};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Notice, Screen};
use crate::task::TaskKind;

/// Effects to run when the view opens: probe the session.
pub fn init(app: &mut AppState) -> Vec<UiEffect> {
    enter_entry(app)
}

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::TaskStarted { kind, started } => {
            if app.tasks.state_mut(kind).on_started(&started) {
                vec![]
            } else {
                // Superseded before it got going.
                vec![UiEffect::CancelTask {
                    kind,
                    token: Some(started.cancel),
                }]
            }
        }
        UiEvent::ProbeCompleted { id, result } => {
            if !app.tasks.probe.finish_if_active(id) {
                return vec![];
            }
            on_probe_completed(app, result)
        }
        UiEvent::CoursesLoaded { id, result } => {
            if !app.tasks.catalog.finish_if_active(id) {
                return vec![];
            }
            on_courses_loaded(app, result)
        }
        UiEvent::ExportCompleted { id, result } => {
            if !app.tasks.export.finish_if_active(id) {
                return vec![];
            }
            on_export_completed(app, result)
        }
        UiEvent::DownloadCompleted { id, result } => {
            if !app.tasks.download.finish_if_active(id) {
                return vec![];
            }
            on_download_completed(app, result)
        }
        UiEvent::SignedOut { id, termination } => {
            app.tasks.sign_out.finish_if_active(id);
            on_signed_out(app, &termination)
        }
        UiEvent::CookieStored { result } => on_cookie_stored(app, result),
        UiEvent::BrowserFailed { message } => {
            let text = format!("Could not open the browser: {message}");
            if let Screen::Redirecting { error, .. } = &mut app.screen {
                *error = Some(format!("{text}. Open the URL above manually."));
            } else {
                app.notice = Some(Notice::error(text));
            }
            vec![]
        }
    }
}

// ============================================================================
// Transitions
// ============================================================================

/// Returns to the entry state: drops session-scoped work and probes again.
fn enter_entry(app: &mut AppState) -> Vec<UiEffect> {
    let mut effects = cancel_tasks(
        app,
        &[
            TaskKind::Probe,
            TaskKind::Catalog,
            TaskKind::Export,
            TaskKind::Download,
        ],
    );
    app.export.settle();
    app.catalog = Catalog::new();
    app.selection.clear();
    app.cursor = 0;
    app.screen = Screen::Checking;

    let task = app.task_seq.next_id();
    app.tasks.probe.begin(task);
    effects.push(UiEffect::Probe { task });
    effects
}

fn cancel_tasks(app: &mut AppState, kinds: &[TaskKind]) -> Vec<UiEffect> {
    kinds
        .iter()
        .filter_map(|&kind| {
            let state = app.tasks.state_mut(kind);
            if !state.is_running() {
                return None;
            }
            Some(UiEffect::CancelTask {
                kind,
                token: state.take_cancel(),
            })
        })
        .collect()
}

fn start_loading(app: &mut AppState, discover: bool) -> Vec<UiEffect> {
    if app.tasks.catalog.is_running() {
        return vec![];
    }
    app.catalog.begin_loading();
    if discover {
        app.notice = Some(Notice::info("Importing courses from Classroom..."));
    }
    let task = app.task_seq.next_id();
    app.tasks.catalog.begin(task);
    vec![UiEffect::LoadCourses { task, discover }]
}

fn start_export(app: &mut AppState) -> Vec<UiEffect> {
    // Selected ids must refer to the list on screen.
    if !app.catalog_settled() {
        return vec![];
    }
    let Ok(request) = app.export.begin(&app.selection) else {
        return vec![];
    };
    app.notice = Some(Notice::info(format!(
        "Preparing archive of {}...",
        plural(request.selected_course_ids.len(), "course")
    )));
    let task = app.task_seq.next_id();
    app.tasks.export.begin(task);
    vec![UiEffect::Export { task, request }]
}

fn cancel_transfer(app: &mut AppState) -> Vec<UiEffect> {
    if app.export.is_busy() {
        app.export.settle();
        app.notice = Some(Notice::info("Export cancelled."));
        return vec![UiEffect::CancelTask {
            kind: TaskKind::Export,
            token: app.tasks.export.take_cancel(),
        }];
    }
    if app.tasks.download.is_running() {
        app.notice = Some(Notice::info("Download cancelled."));
        return vec![UiEffect::CancelTask {
            kind: TaskKind::Download,
            token: app.tasks.download.take_cancel(),
        }];
    }
    vec![]
}

fn start_sign_out(app: &mut AppState) -> Vec<UiEffect> {
    if app.tasks.sign_out.is_running() {
        return vec![];
    }
    app.notice = Some(Notice::info("Signing out..."));
    let task = app.task_seq.next_id();
    app.tasks.sign_out.begin(task);
    vec![UiEffect::SignOut { task }]
}

fn on_probe_completed(
    app: &mut AppState,
    result: Result<ProbeOutcome, ApiError>,
) -> Vec<UiEffect> {
    match ProbeState::from_result(result) {
        ProbeState::Authenticated => {
            app.screen = Screen::Catalog;
            start_loading(app, false)
        }
        ProbeState::Redirecting { url } => {
            app.screen = Screen::Redirecting {
                url: url.clone(),
                pasted: String::new(),
                error: None,
            };
            vec![UiEffect::OpenBrowser { url }]
        }
        ProbeState::Failed { message } => {
            app.screen = Screen::Failed { message };
            vec![]
        }
        ProbeState::Checking => vec![],
    }
}

fn on_courses_loaded(
    app: &mut AppState,
    result: Result<Vec<Course>, ApiError>,
) -> Vec<UiEffect> {
    match app.catalog.apply(result) {
        CatalogTransition::Loaded { count } => {
            app.selection.retain_known(app.catalog.courses());
            app.clamp_cursor();
            app.notice = (count == 0)
                .then(|| Notice::info("No courses yet. Press R to import them from Classroom."));
            vec![]
        }
        CatalogTransition::RouteToEntry => enter_entry(app),
        CatalogTransition::Failed => {
            app.notice = None;
            vec![]
        }
    }
}

fn on_export_completed(app: &mut AppState, result: Result<(), ApiError>) -> Vec<UiEffect> {
    app.export.settle();
    match result {
        Ok(()) => {
            app.selection.clear();
            app.notice = Some(Notice::info("Archive ready, downloading..."));
            let task = app.task_seq.next_id();
            app.tasks.download.begin(task);
            vec![UiEffect::Download { task }]
        }
        Err(err) => match err.kind() {
            ErrorKind::Unauthenticated => enter_entry(app),
            ErrorKind::Cancelled => {
                app.notice = Some(Notice::info("Export cancelled."));
                vec![]
            }
            ErrorKind::Failure => {
                tracing::warn!("export failed: {err}");
                app.notice = Some(Notice::error(format!("Export failed: {err}")));
                vec![]
            }
        },
    }
}

fn on_download_completed(
    app: &mut AppState,
    result: Result<Delivered, ApiError>,
) -> Vec<UiEffect> {
    match result {
        Ok(Delivered::Saved { path, bytes }) => {
            app.notice = Some(Notice::success(format!(
                "Saved {} ({})",
                path.display(),
                format_bytes(bytes)
            )));
            vec![]
        }
        Ok(Delivered::HandedToBrowser { .. }) => {
            app.notice = Some(Notice::success("Download handed to the browser."));
            vec![]
        }
        Err(err) => match err.kind() {
            ErrorKind::Unauthenticated => enter_entry(app),
            ErrorKind::Cancelled => {
                app.notice = Some(Notice::info("Download cancelled."));
                vec![]
            }
            ErrorKind::Failure => {
                tracing::warn!("download failed: {err}");
                app.notice = Some(Notice::error(format!("Download failed: {err}")));
                vec![]
            }
        },
    }
}

fn on_signed_out(app: &mut AppState, termination: &Termination) -> Vec<UiEffect> {
    let effects = enter_entry(app);
    app.notice = termination.user_message().map(Notice::error);
    effects
}

fn on_cookie_stored(app: &mut AppState, result: Result<(), String>) -> Vec<UiEffect> {
    let Screen::Redirecting { error, .. } = &mut app.screen else {
        return vec![];
    };
    match result {
        Ok(()) => {
            app.notice = None;
            enter_entry(app)
        }
        Err(message) => {
            *error = Some(message);
            vec![]
        }
    }
}

// ============================================================================
// Input
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Paste(text) => {
            if let Screen::Redirecting { pasted, error, .. } = &mut app.screen {
                pasted.extend(text.chars().filter(|c| !c.is_control()));
                *error = None;
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        if app.transfer_running() {
            return cancel_transfer(app);
        }
        return quit(app);
    }

    match app.screen {
        Screen::Checking => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => quit(app),
            _ => vec![],
        },
        Screen::Failed { .. } => match key.code {
            KeyCode::Char('r') => enter_entry(app),
            KeyCode::Char('q') | KeyCode::Esc => quit(app),
            _ => vec![],
        },
        Screen::Redirecting { .. } => handle_redirecting_key(app, key),
        Screen::Catalog => handle_catalog_key(app, key),
    }
}

fn handle_redirecting_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let Screen::Redirecting { url, pasted, error } = &mut app.screen else {
        return vec![];
    };

    match key.code {
        KeyCode::Esc => quit(app),
        KeyCode::Char('o') if ctrl => vec![UiEffect::OpenBrowser { url: url.clone() }],
        KeyCode::Char('u') if ctrl => {
            pasted.clear();
            vec![]
        }
        KeyCode::Char(c) if !ctrl => {
            pasted.push(c);
            *error = None;
            vec![]
        }
        KeyCode::Backspace => {
            pasted.pop();
            vec![]
        }
        KeyCode::Enter => {
            if pasted.trim().is_empty() {
                *error = Some("Paste the session cookie first.".to_string());
                return vec![];
            }
            vec![UiEffect::StoreCookie {
                input: pasted.clone(),
            }]
        }
        _ => vec![],
    }
}

fn handle_catalog_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.cursor = app.cursor.saturating_sub(1);
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.cursor + 1 < app.courses().len() {
                app.cursor += 1;
            }
            vec![]
        }
        KeyCode::Char(' ') => {
            if let Some(id) = app.highlighted().map(|course| course.id.clone()) {
                app.selection.toggle(&id);
            }
            vec![]
        }
        KeyCode::Enter | KeyCode::Char('d') => start_export(app),
        KeyCode::Esc => cancel_transfer(app),
        KeyCode::Char('r') => start_loading(app, false),
        KeyCode::Char('R') => start_loading(app, true),
        KeyCode::Char('x') => start_sign_out(app),
        KeyCode::Char('q') => quit(app),
        _ => vec![],
    }
}

fn quit(app: &mut AppState) -> Vec<UiEffect> {
    app.should_quit = true;
    vec![UiEffect::Quit]
}

// ============================================================================
// Formatting
// ============================================================================

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gcd_core::config::Endpoint;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::task::{TaskId, TaskStarted};

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn three_courses() -> Vec<Course> {
        vec![
            Course::new("a", "Math"),
            Course::new("b", "Art"),
            Course::new("c", "CS"),
        ]
    }

    fn probe_task(effects: &[UiEffect]) -> TaskId {
        effects
            .iter()
            .find_map(|e| match e {
                UiEffect::Probe { task } => Some(*task),
                _ => None,
            })
            .expect("probe effect")
    }

    /// Drives the reducer to a loaded catalog of three courses.
    fn catalog_app() -> AppState {
        let mut app = AppState::new();
        let probe = probe_task(&init(&mut app));
        let effects = update(
            &mut app,
            UiEvent::ProbeCompleted {
                id: probe,
                result: Ok(ProbeOutcome::Authenticated),
            },
        );
        let [UiEffect::LoadCourses { task, discover: false }] = effects.as_slice() else {
            panic!("expected LoadCourses, got {effects:?}");
        };
        update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Ok(three_courses()),
            },
        );
        assert_eq!(app.screen, Screen::Catalog);
        app
    }

    fn unauthenticated(endpoint: Endpoint) -> ApiError {
        ApiError::Unauthenticated { endpoint }
    }

    #[test]
    fn test_init_probes_session() {
        let mut app = AppState::new();
        let effects = init(&mut app);
        assert_eq!(app.screen, Screen::Checking);
        assert!(matches!(effects.as_slice(), [UiEffect::Probe { .. }]));
    }

    #[test]
    fn test_probe_redirect_opens_exact_url() {
        let mut app = AppState::new();
        let probe = probe_task(&init(&mut app));

        let effects = update(
            &mut app,
            UiEvent::ProbeCompleted {
                id: probe,
                result: Ok(ProbeOutcome::Redirect {
                    url: "https://provider/auth?x=1".to_string(),
                }),
            },
        );

        let [UiEffect::OpenBrowser { url }] = effects.as_slice() else {
            panic!("expected OpenBrowser, got {effects:?}");
        };
        assert_eq!(url, "https://provider/auth?x=1");
        assert!(matches!(app.screen, Screen::Redirecting { .. }));
    }

    #[test]
    fn test_probe_failure_shows_failed_screen_and_retries() {
        let mut app = AppState::new();
        let probe = probe_task(&init(&mut app));
        update(
            &mut app,
            UiEvent::ProbeCompleted {
                id: probe,
                result: Err(ApiError::Timeout {
                    endpoint: Endpoint::Entry,
                }),
            },
        );
        assert!(matches!(app.screen, Screen::Failed { .. }));

        let effects = update(&mut app, key(KeyCode::Char('r')));
        assert_eq!(app.screen, Screen::Checking);
        assert!(matches!(effects.as_slice(), [UiEffect::Probe { .. }]));
    }

    #[test]
    fn test_space_toggles_highlighted_course() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        update(&mut app, key(KeyCode::Down));
        update(&mut app, key(KeyCode::Down));
        update(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.selection.ids(), ["a", "c"]);

        update(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.selection.ids(), ["a"]);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Up));
        assert_eq!(app.cursor, 0);
        for _ in 0..10 {
            update(&mut app, key(KeyCode::Down));
        }
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn test_export_is_inert_with_empty_selection() {
        let mut app = catalog_app();
        assert!(!app.export_enabled());
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());

        update(&mut app, key(KeyCode::Char(' ')));
        assert!(app.export_enabled());
        update(&mut app, key(KeyCode::Char(' ')));
        assert!(!app.export_enabled());
    }

    #[test]
    fn test_second_export_while_pending_is_ignored() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));

        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::Export { request, .. }] = effects.as_slice() else {
            panic!("expected Export, got {effects:?}");
        };
        assert_eq!(request.selected_course_ids, ["a"]);
        assert!(!app.export_enabled());

        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());
        assert!(update(&mut app, key(KeyCode::Char('d'))).is_empty());
    }

    #[test]
    fn test_export_success_clears_selection_and_downloads() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::Export { task, .. }] = effects.as_slice() else {
            panic!("expected Export");
        };

        let effects = update(
            &mut app,
            UiEvent::ExportCompleted {
                id: *task,
                result: Ok(()),
            },
        );
        assert!(matches!(effects.as_slice(), [UiEffect::Download { .. }]));
        assert!(app.selection.is_empty());
        assert!(!app.export.is_busy());
    }

    #[test]
    fn test_export_failure_keeps_selection_and_rearms_trigger() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::Export { task, .. }] = effects.as_slice() else {
            panic!("expected Export");
        };

        update(
            &mut app,
            UiEvent::ExportCompleted {
                id: *task,
                result: Err(ApiError::Status {
                    endpoint: Endpoint::CoursesDownload,
                    status: 500,
                    body: String::new(),
                }),
            },
        );
        assert_eq!(app.selection.ids(), ["a"]);
        assert!(app.export_enabled());
        assert!(matches!(
            app.notice,
            Some(Notice {
                level: crate::state::NoticeLevel::Error,
                ..
            })
        ));
    }

    #[test]
    fn test_esc_cancels_pending_export() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::Export { task, .. }] = effects.as_slice() else {
            panic!("expected Export");
        };
        let token = CancellationToken::new();
        update(
            &mut app,
            UiEvent::TaskStarted {
                kind: TaskKind::Export,
                started: TaskStarted {
                    id: *task,
                    cancel: token.clone(),
                },
            },
        );

        let effects = update(&mut app, key(KeyCode::Esc));
        let [UiEffect::CancelTask { token: Some(t), .. }] = effects.as_slice() else {
            panic!("expected CancelTask, got {effects:?}");
        };
        t.cancel();
        assert!(token.is_cancelled());
        assert!(app.export_enabled());

        // The cancelled request's late result is stale.
        let effects = update(
            &mut app,
            UiEvent::ExportCompleted {
                id: *task,
                result: Ok(()),
            },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_catalog_401_routes_to_entry_from_any_status() {
        // From a loaded catalog, via reload.
        let mut app = catalog_app();
        let effects = update(&mut app, key(KeyCode::Char('r')));
        let [UiEffect::LoadCourses { task, .. }] = effects.as_slice() else {
            panic!("expected LoadCourses");
        };
        let effects = update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Err(unauthenticated(Endpoint::CoursesList)),
            },
        );
        assert_eq!(app.screen, Screen::Checking);
        assert!(effects.iter().any(|e| matches!(e, UiEffect::Probe { .. })));

        // From a failed catalog.
        let mut app = catalog_app();
        let effects = update(&mut app, key(KeyCode::Char('r')));
        let [UiEffect::LoadCourses { task, .. }] = effects.as_slice() else {
            panic!("expected LoadCourses");
        };
        update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Err(ApiError::Timeout {
                    endpoint: Endpoint::CoursesList,
                }),
            },
        );
        let effects = update(&mut app, key(KeyCode::Char('r')));
        let [UiEffect::LoadCourses { task, .. }] = effects.as_slice() else {
            panic!("expected LoadCourses");
        };
        update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Err(unauthenticated(Endpoint::CoursesList)),
            },
        );
        assert_eq!(app.screen, Screen::Checking);
    }

    #[test]
    fn test_selection_does_not_survive_a_return_to_entry() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.selection.ids(), ["a"]);

        let effects = update(&mut app, key(KeyCode::Char('r')));
        let [UiEffect::LoadCourses { task, .. }] = effects.as_slice() else {
            panic!("expected LoadCourses");
        };
        let effects = update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Err(unauthenticated(Endpoint::CoursesList)),
            },
        );
        assert_eq!(app.screen, Screen::Checking);
        assert!(app.selection.is_empty());

        let effects = update(
            &mut app,
            UiEvent::ProbeCompleted {
                id: probe_task(&effects),
                result: Ok(ProbeOutcome::Authenticated),
            },
        );
        let [UiEffect::LoadCourses { task, .. }] = effects.as_slice() else {
            panic!("expected LoadCourses, got {effects:?}");
        };
        update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Ok(three_courses()),
            },
        );
        assert_eq!(app.screen, Screen::Catalog);
        assert!(app.selection.is_empty());
        assert!(!app.export_enabled());
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());
    }

    #[test]
    fn test_export_waits_for_catalog_to_load() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        assert!(app.export_enabled());

        let effects = update(&mut app, key(KeyCode::Char('r')));
        let [UiEffect::LoadCourses { task, .. }] = effects.as_slice() else {
            panic!("expected LoadCourses");
        };
        assert!(!app.export_enabled());
        assert!(update(&mut app, key(KeyCode::Char('d'))).is_empty());
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());

        update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Ok(three_courses()),
            },
        );
        assert!(app.export_enabled());
        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(matches!(effects.as_slice(), [UiEffect::Export { .. }]));
    }

    #[test]
    fn test_reload_keeps_only_known_selection() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        update(&mut app, key(KeyCode::Down));
        update(&mut app, key(KeyCode::Char(' ')));

        let effects = update(&mut app, key(KeyCode::Char('R')));
        let [UiEffect::LoadCourses { task, discover: true }] = effects.as_slice() else {
            panic!("expected discover reload");
        };
        update(
            &mut app,
            UiEvent::CoursesLoaded {
                id: *task,
                result: Ok(vec![Course::new("b", "Art")]),
            },
        );
        assert_eq!(app.selection.ids(), ["b"]);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_sign_out_always_returns_to_entry() {
        let mut app = catalog_app();
        update(&mut app, key(KeyCode::Char(' ')));
        let effects = update(&mut app, key(KeyCode::Char('x')));
        let [UiEffect::SignOut { task }] = effects.as_slice() else {
            panic!("expected SignOut");
        };

        let effects = update(
            &mut app,
            UiEvent::SignedOut {
                id: *task,
                termination: Termination {
                    request_error: Some(ApiError::Timeout {
                        endpoint: Endpoint::OAuthLogout,
                    }),
                    cookie_cleared: true,
                    store_error: None,
                },
            },
        );
        assert_eq!(app.screen, Screen::Checking);
        assert!(app.selection.is_empty());
        assert!(app.notice.is_none());
        assert!(effects.iter().any(|e| matches!(e, UiEffect::Probe { .. })));
    }

    #[test]
    fn test_sign_out_store_failure_is_shown() {
        let mut app = catalog_app();
        let effects = update(&mut app, key(KeyCode::Char('x')));
        let [UiEffect::SignOut { task }] = effects.as_slice() else {
            panic!("expected SignOut");
        };
        update(
            &mut app,
            UiEvent::SignedOut {
                id: *task,
                termination: Termination {
                    store_error: Some("permission denied".to_string()),
                    ..Termination::default()
                },
            },
        );
        assert_eq!(app.screen, Screen::Checking);
        assert_eq!(
            app.notice.as_ref().map(|n| n.text.as_str()),
            Some("Could not clear the local session: permission denied")
        );
    }

    #[test]
    fn test_pasted_cookie_is_stored_then_probed() {
        let mut app = AppState::new();
        let probe = probe_task(&init(&mut app));
        update(
            &mut app,
            UiEvent::ProbeCompleted {
                id: probe,
                result: Ok(ProbeOutcome::Redirect {
                    url: "https://provider/auth".to_string(),
                }),
            },
        );

        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());
        update(
            &mut app,
            UiEvent::Terminal(Event::Paste("gcd_session=abc\n".to_string())),
        );
        let effects = update(&mut app, key(KeyCode::Enter));
        let [UiEffect::StoreCookie { input }] = effects.as_slice() else {
            panic!("expected StoreCookie, got {effects:?}");
        };
        assert_eq!(input, "gcd_session=abc");

        let effects = update(&mut app, UiEvent::CookieStored { result: Ok(()) });
        assert_eq!(app.screen, Screen::Checking);
        assert!(matches!(effects.as_slice(), [UiEffect::Probe { .. }]));
    }

    #[test]
    fn test_typed_q_is_part_of_cookie_not_quit() {
        let mut app = AppState {
            screen: Screen::Redirecting {
                url: "https://provider/auth".to_string(),
                pasted: String::new(),
                error: None,
            },
            ..AppState::default()
        };
        update(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        let Screen::Redirecting { pasted, .. } = &app.screen else {
            panic!("left redirect screen");
        };
        assert_eq!(pasted, "q");
    }

    #[test]
    fn test_download_saved_notice() {
        let mut app = catalog_app();
        let task = app.task_seq.next_id();
        app.tasks.download.begin(task);
        update(
            &mut app,
            UiEvent::DownloadCompleted {
                id: task,
                result: Ok(Delivered::Saved {
                    path: PathBuf::from("GCD_courses.zip"),
                    bytes: 2048,
                }),
            },
        );
        assert_eq!(
            app.notice.map(|n| n.text).as_deref(),
            Some("Saved GCD_courses.zip (2.0 KB)")
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
