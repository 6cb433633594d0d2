//! # TM Harness
//!
//! Translation-memory lookup and TMX import on top of an
//! Elasticsearch-compatible full-text search backend.
//!
//! Lookups turn the backend's opaque relevance scores into similarity
//! percentages by measuring one real fuzzy similarity (against the
//! best-ranked hit) and scaling every other hit proportionally. Imports
//! parse TMX files and push them to the backend in fail-fast bulk batches.
//!
//! ## Architecture
//!
//! ```text
//!  lookup:  text ──▶ SearchClient ──▶ scoring ──▶ format ──▶ ScoredMatch[]
//!                         │
//!                    ┌────┴─────┐
//!                    │ Transport │──▶ search backend (HTTP)
//!                    └────┬─────┘
//!                         │
//!  import:  .tmx ──▶ tmx ──▶ language ──▶ document ──▶ IndexWriter (bulk)
//!  save:    unit ─────────────────────────▶ document ──▶ IndexWriter (upsert)
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tm import memory.tmx --langmap en_US=en
//! tm search "Save the file"
//! tm origins
//! tm delete memory.tmx
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`backend`] | Transport trait and HTTP implementation |
//! | [`language`] | Language code resolution |
//! | [`document`] | Unit → backend document conversion |
//! | [`writer`] | Single upserts, bulk batches, origin maintenance |
//! | [`search`] | Match queries and response decoding |
//! | [`scoring`] | Similarity normalization |
//! | [`format`] | Display-ready match records |
//! | [`tmx`] | TMX parsing |
//! | [`import`] | TMX import pipeline |
//! | [`engine`] | Façade wiring everything together |
//! | [`logging`] | Tracing subscriber setup |

pub mod backend;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod format;
pub mod import;
pub mod language;
pub mod logging;
pub mod models;
pub mod scoring;
pub mod search;
pub mod tmx;
pub mod writer;
