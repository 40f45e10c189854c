//! Session command handlers: status, login, logout.

use anyhow::{Context, Result, bail};
use gcd_core::config::Config;
use gcd_core::cookie::mask_value;
use gcd_core::interrupt::InterruptedError;
use gcd_core::workflow::{ProbeOutcome, ProbeState, prober, terminator};
use gcd_core::{ClassroomClient, SessionCookie, SystemBrowser};

pub async fn status(config: Config) -> Result<()> {
    let client = super::client(config)?;
    match probe(&client).await? {
        ProbeOutcome::Authenticated => {
            println!("Signed in to {}", client.config().server_url);
        }
        ProbeOutcome::Redirect { url } => {
            println!("Not signed in. Authorize at:\n{url}");
        }
    }
    Ok(())
}

pub async fn login(config: Config, cookie: Option<&str>) -> Result<()> {
    let client = super::client(config)?;

    if let Some(input) = cookie {
        return store_cookie(&client, input).await;
    }

    let cancel = super::interruptible();
    match prober::probe_and_navigate(&client, &SystemBrowser, &cancel).await {
        ProbeState::Authenticated => {
            println!("Already signed in to {}", client.config().server_url);
        }
        ProbeState::Redirecting { url } => {
            println!("Authorize in the browser:\n{url}\n");
            println!(
                "Then run `gcd login --cookie <VALUE>` with the `{}` cookie set by the server.",
                client.config().session.cookie_name
            );
        }
        ProbeState::Failed { message } => {
            if cancel.is_cancelled() {
                return Err(InterruptedError.into());
            }
            bail!(message);
        }
        ProbeState::Checking => bail!("session check did not finish"),
    }
    Ok(())
}

/// Saves a pasted cookie, then checks that the backend accepts it.
async fn store_cookie(client: &ClassroomClient, input: &str) -> Result<()> {
    let session = &client.config().session;
    let Some(cookie) = SessionCookie::from_pasted(input, &session.cookie_name, &session.cookie_path)
    else {
        bail!("Session cookie is empty or contains whitespace.");
    };

    client
        .store()
        .save(&cookie)
        .context("save session cookie")?;
    tracing::info!(cookie = %mask_value(&cookie.value), "stored session cookie");

    match probe(client).await? {
        ProbeOutcome::Authenticated => {
            println!("Signed in to {}", client.config().server_url);
            Ok(())
        }
        ProbeOutcome::Redirect { .. } => {
            if let Err(err) = client
                .store()
                .expire(&session.cookie_name, &session.cookie_path)
            {
                tracing::warn!("Failed to clear rejected cookie: {err:#}");
            }
            bail!("The server did not accept this session cookie.");
        }
    }
}

pub async fn logout(config: Config) -> Result<()> {
    let client = super::client(config)?;
    let order = client.config().sign_out.order;
    let cancel = super::interruptible();

    let termination = terminator::terminate(&client, order, &cancel).await;

    if let Some(message) = termination.user_message() {
        bail!(message);
    }
    if !termination.cookie_cleared {
        let reason = termination
            .request_error
            .map_or_else(|| "unknown error".to_string(), |err| err.to_string());
        bail!("Sign-out request failed ({reason}); the local session was kept.");
    }
    println!("Signed out.");
    Ok(())
}

async fn probe(client: &ClassroomClient) -> Result<ProbeOutcome> {
    let cancel = super::interruptible();
    prober::probe(client, &cancel)
        .await
        .map_err(|err| super::api_error(err, "check session"))
}
