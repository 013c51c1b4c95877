#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for x402 payment verification.
//!
//! This crate provides the foundational, chain-agnostic pieces used to decide whether
//! an x402 payment proof satisfies a set of payment requirements. Chain-specific
//! verification algorithms live in separate crates and plug in through the
//! [`scheme`] module.
//!
//! # Overview
//!
//! A buyer presents a [`PaymentPayload`](proto::v1::PaymentPayload): a signed,
//! network-specific proof of payment. A seller states its terms as
//! [`PaymentRequirements`](proto::v1::PaymentRequirements). A verifier selected by
//! `(scheme, network)` checks the one against the other and produces a
//! [`VerifyResponse`](proto::VerifyResponse): either `Valid { payer }` or
//! `Invalid { reason, details }`.
//!
//! # Modules
//!
//! - [`chain`] - Network client capability used for on-chain facts, with a timeout guard
//! - [`config`] - Environment variable resolution for configuration values
//! - [`networks`] - Registry of well-known x402 v1 network names
//! - [`proto`] - Wire types: payloads, requirements, verdicts and the error taxonomy
//! - [`scheme`] - Scheme verifier trait, blueprints and the immutable registry
//! - [`timestamp`] - Unix timestamps and the payment validity window
//! - [`util`] - Base64 helpers
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod chain;
pub mod config;
pub mod networks;
pub mod proto;
pub mod scheme;
pub mod timestamp;
pub mod util;
