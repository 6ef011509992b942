//! Query protocol of the Redirect Receiver endpoint, independent of any HTTP server.
//!
//! `?code=<code>` deposits and answers with an HTML page showing the id, `?id=<id>` retrieves and
//! answers with the raw code, and anything else answers with a usage hint.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	relay::{Relay, SessionId},
};

const USAGE: &str = "Use ?code=<authorization code> to deposit or ?id=<session id> to retrieve.";

/// Reply produced by [`RedirectReceiver`], ready to be written by an HTTP layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiverReply {
	/// A code was deposited under `id`.
	Deposited {
		/// Assigned session id.
		id: SessionId,
		/// Pickup link embedding the id.
		link: Url,
	},
	/// The code for a retrieved id.
	Code(Secret),
	/// The id is unknown, already delivered, expired, or not a valid id.
	Missing,
	/// The query matched neither protocol shape.
	Usage,
}
impl ReceiverReply {
	/// HTTP status code for the reply.
	pub fn status(&self) -> u16 {
		match self {
			Self::Deposited { .. } | Self::Code(_) => 200,
			Self::Missing => 404,
			Self::Usage => 400,
		}
	}

	/// `Content-Type` header value for the reply.
	pub fn content_type(&self) -> &'static str {
		match self {
			Self::Deposited { .. } => "text/html; charset=utf-8",
			_ => "text/plain; charset=utf-8",
		}
	}

	/// Response body. [`ReceiverReply::Code`] exposes the raw code.
	pub fn body(&self) -> String {
		match self {
			Self::Deposited { id, link } => render_deposit_page(*id, link),
			Self::Code(code) => code.expose().to_owned(),
			Self::Missing => String::new(),
			Self::Usage => USAGE.to_owned(),
		}
	}
}

/// Handler that maps redirect-endpoint queries onto a [`Relay`].
#[derive(Clone, Debug)]
pub struct RedirectReceiver {
	relay: Relay,
}
impl RedirectReceiver {
	/// Creates a receiver over `relay`.
	pub fn new(relay: Relay) -> Self {
		Self { relay }
	}

	/// Underlying relay.
	pub fn relay(&self) -> &Relay {
		&self.relay
	}

	/// Handles the query string of an incoming request URL.
	pub async fn handle_url(&self, url: &Url) -> Result<ReceiverReply> {
		self.handle_query(url.query().unwrap_or_default()).await
	}

	/// Handles a raw, still percent-encoded query string (without the leading `?`).
	///
	/// Lookup misses become [`ReceiverReply::Missing`]; relay backend failures are returned as
	/// errors.
	pub async fn handle_query(&self, query: &str) -> Result<ReceiverReply> {
		match ReceiverQuery::parse(query) {
			ReceiverQuery::Deposit(code) => {
				let receipt = self.relay.deposit(code).await?;

				Ok(ReceiverReply::Deposited { id: receipt.id, link: receipt.link })
			},
			ReceiverQuery::Retrieve(raw_id) => {
				let Ok(id) = raw_id.parse::<SessionId>() else {
					return Ok(ReceiverReply::Missing);
				};

				match self.relay.retrieve(id).await {
					Ok(code) => Ok(ReceiverReply::Code(code)),
					Err(Error::NotFound) => Ok(ReceiverReply::Missing),
					Err(err) => Err(err),
				}
			},
			ReceiverQuery::Usage => Ok(ReceiverReply::Usage),
		}
	}
}

enum ReceiverQuery {
	Deposit(String),
	Retrieve(String),
	Usage,
}
impl ReceiverQuery {
	fn parse(query: &str) -> Self {
		let mut code = None;
		let mut id = None;
		let mut error = false;

		for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
			match key.as_ref() {
				"code" => code = Some(value.into_owned()),
				"id" => id = Some(value.into_owned()),
				"error" => error = true,
				_ => {},
			}
		}

		let code = code.filter(|value| !value.trim().is_empty());
		let id = id.filter(|value| !value.trim().is_empty());

		match (code, id, error) {
			(Some(code), None, false) => Self::Deposit(code),
			(None, Some(id), false) => Self::Retrieve(id),
			_ => Self::Usage,
		}
	}
}

fn render_deposit_page(id: SessionId, link: &Url) -> String {
	let link = escape_html(link.as_str());

	format!(
		"<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Authorization received</title>\
		 </head><body><h1>Authorization received</h1><p>Your session id is <strong>{id}</strong>. \
		 Enter it in the chat to finish connecting.</p><p><a href=\"{link}\">{link}</a></p>\
		 </body></html>\n"
	)
}

fn escape_html(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}

	out
}
