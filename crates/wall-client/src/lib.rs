//! Client side of the wall service: access control for protected walls,
//! the device session cache, record mutations, visit recording and the
//! view models driven by a navigation shell.

pub mod access;
pub mod backend;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
mod mutations;
pub mod send_view;
pub mod session;
pub mod shell;
pub mod threads;
pub mod view;
pub mod visits;
pub mod wall_view;

#[cfg(test)]
mod testing;

pub use access::{AccessController, AccessDecision, AccessState};
pub use backend::DataBackend;
pub use cache::{FileStore, KeyValueStore, MemoryStore, SessionCache};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{ClientError, Result};
pub use http::HttpBackend;
pub use session::{Session, SessionHub};
pub use shell::{Landing, Route, Shell};
pub use view::ViewState;
