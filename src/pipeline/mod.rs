//! Pipeline stages for record-to-document generation.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own. Only `input`, `inline` and `export` touch the network
//! or a subprocess; the middle of the pipeline is pure.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ compose ──▶ render ──▶ export
//! (CSV/JSON) (aliases)    (pages)     (HTML)     (PDF/PNG)
//!                 └──▶ inline (optional data URIs)
//! ```
//!
//! 1. [`input`]     — acquire raw records from an endpoint, JSON or CSV file
//! 2. [`normalize`] — resolve every canonical field through its alias list
//! 3. [`inline`]    — optionally embed photo/logo as `data:` URIs
//! 4. [`compose`]   — gated section builders placed by fixed ordering tables
//! 5. [`render`]    — escaped, self-contained HTML with one section per page
//! 6. [`export`]    — [`export::RenderBackend`] for PDF printing and PNG pages

pub mod compose;
pub mod export;
pub mod inline;
pub mod input;
pub mod normalize;
pub mod render;
