//! Live-reloading preview server for pukidocs sites.
//!
//! Builds the site into a scratch directory, serves it, and rebuilds on
//! changes to the docs tree or the site configuration. Connected browsers
//! reload over a WebSocket.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent, WatchTargets};
pub use websocket::{ReloadHub, ReloadMessage};
