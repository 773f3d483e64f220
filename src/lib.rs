//! Print intercepted HTTP requests as curl commands.
//!
//! Hosts register a [`CurlAddon`](application::services::CurlAddon) as their
//! [`RequestHandler`](application::services::RequestHandler) and call
//! `on_request` once per observed request.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
