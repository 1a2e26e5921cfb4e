//! # Taghist CLI
//!
//! `taghist` inspects and maintains the tag history of a repository. The binary
//! is intentionally thin: the CLI lives in `src/cli/`, while this file only
//! invokes `cli::run()` and handles process termination.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/taghist/src/cli/)                        │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Config + logging setup, dispatch (commands.rs)           │
//! │  - Terminal rendering (render.rs, styles.rs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Library (crates/taghistory)                                │
//! │  - History facade, TagList algorithms, TagStore backends    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything below the CLI layer is UI agnostic. The CLI owns argument
//! parsing, stdout/stderr, and exit codes.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
