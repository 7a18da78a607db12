//! # perch
//!
//! A modular, non-blocking IRC client/bot framework core: wire-protocol
//! parsing, a backpressured network worker, a worker pool for running
//! hooks off the I/O path, a dispatch table, live channel/user tracking,
//! and a build-time extension registry.
//!
//! The binary entry point (`src/main.rs`) wires these into a
//! [`supervisor::Supervisor`]; embedding an extension in a larger process
//! only needs [`api::Api`] and [`extloader::ExtensionFactory`].

#![deny(clippy::all)]

pub mod api;
pub mod colors;
pub mod command;
pub mod config;
pub mod ctcp;
pub mod dispatch;
pub mod error;
pub mod ext;
pub mod extloader;
pub mod logging;
pub mod mode;
pub mod net;
pub mod pool;
pub mod prefix;
pub mod state;
pub mod supervisor;
pub mod transport;
