//! docrelay — WhatsApp document delivery pipeline.
//!
//! The document-sending core of a multi-tenant business backend: validates
//! recipient phone numbers, pushes generated PDFs (invoices, delivery notes)
//! over the WhatsApp Cloud API, defers transient failures to a score-ordered
//! retry queue, and tracks per-message delivery status.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod contacts;
pub mod logging;
pub mod phone;
pub mod queue;
pub mod send;
pub mod status;
pub mod store;
pub mod worker;
