//! # portal-client
//!
//! Session, access-control, and upload coordination for the quoting portal
//! front end. Views call into this crate; the HTTP API sits behind it.
//!
//! LAYERS
//! ======
//! - `credential`: durable storage for the single bearer token.
//! - `net`: transport seam, request client, and wire types.
//! - `state`: the session store and the upload slot.
//! - `guard`: the pre-navigation hook and the route table.
//! - `app`: wires one instance of each together.

pub mod app;
pub mod config;
pub mod credential;
pub mod guard;
pub mod net;
pub mod state;
