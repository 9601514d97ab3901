// src/transport/memory/mod.rs

//! In-memory broker implementation.
//!
//! This module provides a pure in-process implementation of both domain-level
//! broker traits. It is intended for tests, dry runs and as the reference for
//! adapter semantics.
//!
//! ## Reference Semantics
//!
//! - Endpoint resolution always succeeds with `memory://<region>` unless a
//!   failure has been injected.
//! - A publish succeeds unless a failure has been injected. Successful
//!   publishes are counted, appended to a bounded journal (oldest entries are
//!   evicted once it is full) and fanned out to every subscriber whose topic
//!   matches exactly.
//! - Nothing is dropped due to timing or scheduling; a subscriber whose inbox
//!   is full or closed simply misses the message.
//!
//! ## Non-Goals
//!
//! This broker does not emulate MQTT wildcards, retained messages, sessions or
//! acknowledgements.

mod broker;

pub use broker::{MemoryBroker, PublishedMessage, DEFAULT_JOURNAL_CAPACITY};
