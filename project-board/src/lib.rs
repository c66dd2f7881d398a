//! Project board core.
//!
//! Client-side state for a "Projects" list: a status registry, an owned
//! entity store with change notifications, pure filter/sort and summary
//! functions, and a query cache that sits between views and the remote
//! list backend.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod services;
