//! Network layer: the HTTP seam, the request client, and wire types.
//!
//! DESIGN
//! ======
//! `transport` is the only place that touches a real HTTP stack. Everything
//! above it talks to `client::RequestClient`, which owns path resolution,
//! bearer injection, and the `{data, status}` / tagged-error result shape.

pub mod client;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod mock;
