//! Pipeline stages from an uploaded schedule to adjusted rows.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the recognition backend can be swapped without
//! touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ rasterize ──▶ encode ──▶ extract ──▶ decode ──▶ select
//! (path/URL)  (pdfium)     (base64)   (llm plan)  (JSON)     (adjust)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local
//!    file and classify it as PDF or image
//! 2. [`rasterize`] — read a PDF's text layer, or rasterise scanned pages;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]    — base64-wrap page renders and uploaded photos
//! 4. [`extract`]   — run the primary/fallback model plan against a
//!    [`extract::RecognitionService`]; [`llm`] is the edgequake-llm one
//! 5. [`decode`]    — pull the row array out of an untrusted answer
//! 6. [`select`]    — find the time column and rewrite its ranges

pub mod decode;
pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod rasterize;
pub mod select;
