//! # CLI Behavior
//!
//! This is **one possible client** of the `taghistory` library. It is the only
//! place that knows about terminal I/O, exit codes, and output formatting.
//!
//! ## Store Selection
//!
//! The history store comes from `--database` / `--backend`, falling back to
//! configuration (see `taghistory::config`). Read commands open the store
//! read-only; only `add`, `remove`, `rollback` and `set-previous` open it for
//! writing, and each of those runs as one transaction.
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. `TAGHIST_LOG` takes an
//! `EnvFilter` directive; otherwise `-v` selects debug and `-vv` trace.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Dispatch to the library and printing
//! - `render`: Output formatting (tables, details)
//! - `styles`: Terminal styling constants

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
