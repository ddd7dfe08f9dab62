//! Governance session: the public client, its shared state and the internals
//! the heartbeat task drives.

mod client;
mod inner;
mod state;

pub use client::KuneoClient;
pub use state::SessionState;

pub(crate) use inner::SessionCore;
