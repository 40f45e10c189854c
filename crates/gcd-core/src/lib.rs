//! Core library for `gcd`, a terminal client for a classroom course export
//! service.
//!
//! The workflow is session gated: probe the session, redirect to the
//! identity provider when it is missing, load and select courses, request an
//! export, then retrieve the prepared archive.

pub mod client;
pub mod config;
pub mod cookie;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod navigator;
pub mod workflow;

pub use client::ClassroomClient;
pub use config::Config;
pub use cookie::{CookieFile, MemoryStore, SessionCookie, SessionStore};
pub use error::{ApiError, ErrorKind};
pub use navigator::{Navigator, SystemBrowser};
