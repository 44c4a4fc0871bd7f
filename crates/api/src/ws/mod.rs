//! WebSocket plumbing for live collection feeds.
//!
//! - [`feed::serve_feed`] -- drive one upgraded connection from a snapshot stream.
//! - [`feed::forward_snapshots`] -- encode snapshots as `{ "data": [...] }` text frames.

pub mod feed;

pub use feed::{forward_snapshots, serve_feed};
