//! OAuth 2.0 code relay for remote agents: build a Spotify authorize URL, park the returned code
//! behind a short numeric id for one-time pickup, and exchange it for tokens with bounded retries.
//!
//! The crate is split the same way the handoff works:
//!
//! - [`authorize`] builds the provider authorize URL from a [`config::ClientConfig`].
//! - [`relay`] holds pending authorization codes keyed by a six-digit id, hands each code out
//!   exactly once, and forgets it after 24 hours. [`relay::RedirectReceiver`] speaks the redirect
//!   endpoint's query protocol on top of it.
//! - [`exchange`] trades a code for a [`auth::TokenBundle`] against the token endpoint.
//! - [`facade`] exposes the two agent-facing operations (`get_url`, `handle_callback`).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authorize;
pub mod config;
pub mod error;
pub mod exchange;
pub mod facade;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod relay;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
