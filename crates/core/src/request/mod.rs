//! HTTP collaborator exposed to scripts as `request`.
//!
//! `request.fetchAsync(url, { method, headers, body })` returns a response
//! table with `status`, `headers`, `body`, `success`, an optional `json`
//! field and a `jsonAsync()` accessor. Network failures never raise; they
//! return `status = 0`, `success = false` and an `error` message.

mod client;
mod types;

pub use client::{DEFAULT_TIMEOUT, Request};
pub use types::{FetchOptions, FetchResponse, HttpError, HttpMethod};
