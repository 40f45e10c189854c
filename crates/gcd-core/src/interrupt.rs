//! Ctrl+C and termination signals.
//!
//! A first Ctrl+C only raises a flag and wakes waiters, which cancel the
//! in-flight network operation. A second Ctrl+C exits with status 130.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static TERMINATE: AtomicBool = AtomicBool::new(false);
static INTERRUPT_NOTIFY: OnceLock<Notify> = OnceLock::new();
static RESTORE_HOOK: OnceLock<Box<dyn Fn() + Send + Sync>> = OnceLock::new();

#[derive(Debug)]
pub struct InterruptedError;

impl std::fmt::Display for InterruptedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted")
    }
}

impl std::error::Error for InterruptedError {}

/// Installs the Ctrl+C handler, plus SIGTERM and SIGHUP handlers on unix.
///
/// # Panics
/// Panics if registering a handler fails.
pub fn init() {
    ctrlc::set_handler(move || {
        trigger_ctrl_c();
    })
    .expect("Error setting Ctrl+C handler");

    #[cfg(unix)]
    {
        use signal_hook::consts::{SIGHUP, SIGTERM};

        // SAFETY: the closures only store to an AtomicBool, which is async-signal-safe.
        unsafe {
            signal_hook::low_level::register(SIGTERM, || {
                TERMINATE.store(true, Ordering::SeqCst);
            })
            .expect("Error registering SIGTERM handler");
            signal_hook::low_level::register(SIGHUP, || {
                TERMINATE.store(true, Ordering::SeqCst);
            })
            .expect("Error registering SIGHUP handler");
        }
    }
}

fn notify() -> &'static Notify {
    INTERRUPT_NOTIFY.get_or_init(Notify::new)
}

/// Triggers an interrupt, force-exiting on the second one.
pub fn trigger_ctrl_c() {
    if INTERRUPTED.swap(true, Ordering::SeqCst) {
        // process::exit skips Drop, so the terminal must be restored here.
        if let Some(hook) = RESTORE_HOOK.get() {
            hook();
        }
        std::process::exit(130);
    }
    notify().notify_waiters();
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// True once SIGTERM or SIGHUP was received.
pub fn should_terminate() -> bool {
    TERMINATE.load(Ordering::SeqCst)
}

/// Waits until an interrupt is triggered.
pub async fn wait_for_interrupt() {
    loop {
        let notified = notify().notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if is_interrupted() {
            return;
        }
        notified.await;
    }
}

/// Cancels `token` on the next interrupt.
///
/// The watcher stops on its own once the token is cancelled by anyone else.
pub fn cancel_on_interrupt(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = wait_for_interrupt() => {
                tracing::info!("interrupted, cancelling in-flight request");
                token.cancel();
            }
        }
    })
}

/// Clears the interrupt flag.
pub fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Registers a hook run before the forced exit on a second Ctrl+C.
pub fn set_restore_hook<F>(hook: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let _ = RESTORE_HOOK.set(Box::new(hook));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_on_interrupt_exits_when_token_cancelled() {
        let token = CancellationToken::new();
        let watcher = cancel_on_interrupt(token.clone());
        token.cancel();
        watcher.await.unwrap();
        assert!(!is_interrupted());
    }
}
