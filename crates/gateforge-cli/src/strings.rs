// crates/gateforge-cli/src/strings.rs
// ============================================================================
// Module: CLI Error Preambles
// Description: The fixed set of human-facing prefixes prepended to error
//              messages before they reach stderr.
// Purpose: Keep user-facing wording in one place without inventing a full
//          localization catalog GateForge has no requirement for.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! Unlike the teacher's `i18n` module, this is not a message catalog with
//! placeholder substitution — GateForge has no localization requirement.
//! It is just the handful of fixed preambles every command's error path
//! prepends to a [`crate::error::CliError`]'s message, kept in one place so
//! wording stays consistent across command modules.

/// Preamble for errors surfaced while reading an input artifact.
pub const READ_FAILED: &str = "failed to read input";
/// Preamble for errors surfaced while writing an output artifact.
pub const WRITE_FAILED: &str = "failed to write output";
/// Preamble for errors surfaced while loading configuration or policy.
pub const CONFIG_FAILED: &str = "failed to load configuration";
/// Preamble used when a command's decision resolves to a non-PASS outcome.
pub const DECISION_NOT_PASS: &str = "decision did not pass";
