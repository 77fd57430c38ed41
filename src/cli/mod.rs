//! # CLI Module
//!
//! The `kickstart` binary.
//!
//! ## Commands
//!
//! ```bash
//! # Serve a route file with the bundled handlers
//! APP_ENV=development kickstart serve --routes routes.yaml --addr 127.0.0.1:8080
//!
//! # Print the compiled table in matching order
//! kickstart routes --routes routes.yaml --base-href /app
//!
//! # Validate patterns; exits non-zero on the first invalid route
//! kickstart check --routes routes.toml
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use kickstart::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
