//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! Async work is spawned on tokio and reports back through an inbox channel
//! that the loop drains every frame.

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use gcd_core::cookie::mask_value;
use gcd_core::interrupt;
use gcd_core::workflow::{artifact, catalog, export, prober, terminator};
use gcd_core::{ClassroomClient, Navigator, SessionCookie};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::task::{TaskId, TaskKind, TaskStarted};
use crate::{render, terminal, update};

/// Poll interval while something is in flight (keeps the spinner moving).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll interval when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    client: ClassroomClient,
    navigator: Arc<dyn Navigator>,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Enters the alternate screen and prepares the state.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(client: ClassroomClient, navigator: Arc<dyn Navigator>) -> Result<Self> {
        // Before entering the alternate screen.
        terminal::install_panic_hook();
        interrupt::set_restore_hook(|| {
            let _ = terminal::restore_terminal();
        });
        interrupt::reset();

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state: AppState::new(),
            client,
            navigator,
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs the main event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if the terminal fails.
    pub fn run(&mut self) -> Result<()> {
        let effects = update::init(&mut self.state);
        self.execute_effects(effects);

        let mut dirty = true;
        while !self.state.should_quit {
            if interrupt::should_terminate() {
                tracing::info!("terminate signal received");
                break;
            }

            for event in self.collect_events()? {
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
                dirty = true;
            }

            if dirty {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }

        Ok(())
    }

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let tick_interval = if self.state.tasks.is_any_running() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        self.execute_effects(effects);
    }

    /// Spawns `f` with a fresh cancellation token, reporting the start
    /// immediately and the resulting event when it completes.
    fn spawn_task<F, Fut>(&self, kind: TaskKind, id: TaskId, f: F)
    where
        F: FnOnce(ClassroomClient, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let cancel = CancellationToken::new();
        let _ = tx.send(UiEvent::TaskStarted {
            kind,
            started: TaskStarted {
                id,
                cancel: cancel.clone(),
            },
        });
        let client = self.client.clone();
        tokio::spawn(async move {
            let _ = tx.send(f(client, cancel).await);
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::Probe { task } => {
                self.spawn_task(TaskKind::Probe, task, move |client, cancel| async move {
                    UiEvent::ProbeCompleted {
                        id: task,
                        result: prober::probe(&client, &cancel).await,
                    }
                });
            }
            UiEffect::OpenBrowser { url } => {
                if let Err(err) = self.navigator.open_external(&url) {
                    tracing::warn!("{err:#}");
                    self.dispatch_event(UiEvent::BrowserFailed {
                        message: format!("{err:#}"),
                    });
                }
            }
            UiEffect::LoadCourses { task, discover } => {
                self.spawn_task(TaskKind::Catalog, task, move |client, cancel| async move {
                    let result = if discover {
                        catalog::refresh(&client, &cancel).await
                    } else {
                        catalog::load_courses(&client, &cancel).await
                    };
                    UiEvent::CoursesLoaded { id: task, result }
                });
            }
            UiEffect::Export { task, request } => {
                self.spawn_task(TaskKind::Export, task, move |client, cancel| async move {
                    UiEvent::ExportCompleted {
                        id: task,
                        result: export::request_export(&client, &request, &cancel).await,
                    }
                });
            }
            UiEffect::Download { task } => {
                let navigator = Arc::clone(&self.navigator);
                self.spawn_task(TaskKind::Download, task, move |client, cancel| async move {
                    let result = match artifact::retrieve(&client) {
                        Ok(action) => {
                            let download = &client.config().download;
                            artifact::deliver(
                                &client,
                                &action,
                                download.mode,
                                navigator.as_ref(),
                                &download.directory(),
                                &cancel,
                            )
                            .await
                        }
                        Err(err) => Err(err),
                    };
                    UiEvent::DownloadCompleted { id: task, result }
                });
            }
            UiEffect::SignOut { task } => {
                let order = self.client.config().sign_out.order;
                self.spawn_task(TaskKind::SignOut, task, move |client, cancel| async move {
                    UiEvent::SignedOut {
                        id: task,
                        termination: terminator::terminate(&client, order, &cancel).await,
                    }
                });
            }
            UiEffect::StoreCookie { input } => {
                let result = self.store_cookie(&input);
                self.dispatch_event(UiEvent::CookieStored { result });
            }
            UiEffect::CancelTask { kind, token } => {
                if let Some(token) = token {
                    tracing::debug!(?kind, "cancelling task");
                    token.cancel();
                }
            }
        }
    }

    fn store_cookie(&self, input: &str) -> Result<(), String> {
        let session = &self.client.config().session;
        let Some(cookie) =
            SessionCookie::from_pasted(input, &session.cookie_name, &session.cookie_path)
        else {
            return Err("That does not look like a session cookie.".to_string());
        };
        self.client
            .store()
            .save(&cookie)
            .map_err(|e| format!("Could not save the session: {e:#}"))?;
        tracing::info!(cookie = %mask_value(&cookie.value), "stored pasted session cookie");
        Ok(())
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
