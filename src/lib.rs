//! # ctoolkit - CMake build orchestration and tool provisioning
//!
//! ctoolkit drives a CMake project from the command line: it configures and
//! builds through named terminals, waits for the build chain to signal
//! completion, and runs, debugs or tests the result. It also checks that the
//! required tools are installed and installs the missing ones with the
//! platform's package manager.
//!
//! ## Quick Start
//!
//! ```bash
//! # Pick a build type, then build and run
//! ctk select variant
//! ctk run
//!
//! # Make sure gcc, gdb, cmake and ninja are available
//! ctk tools install
//! ```
//!
//! ## Module Organization
//!
//! - [`build`] - Build state, command chains and the orchestrator
//! - [`toolchain`] - Tool detection and provisioning
//! - [`config`] - Configuration parsing (`ctk.toml`)
//! - [`platform`] - Host platform detection
//! - [`commands`] - CLI command handlers

/// Build state, command composition and the clean/build/run/debug/test cycle.
pub mod build;

/// CLI command handlers.
pub mod commands;

/// Configuration file parsing (`ctk.toml`).
pub mod config;

/// Host platform detection.
pub mod platform;

/// Tool detection and installation.
pub mod toolchain;

/// Terminal UI: notifications, prompts, spinners and tables.
pub mod ui;
