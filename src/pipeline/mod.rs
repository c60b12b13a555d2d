//! Pipeline stages shared by every analysis task.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the inference backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ gateway ──▶ postprocess
//! (path)    (pdfium)    (LLM call)  (JSON cleanup)
//! ```
//!
//! 1. [`input`]   — read the user-supplied file and check the PDF header
//! 2. [`extract`] — pull the text layer page by page; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`gateway`] — one structured request per task; the only stage with
//!    network I/O
//! 4. [`postprocess`] — strip fences and chatter around the model's JSON
//!    before it is deserialized

pub mod extract;
pub mod gateway;
pub mod input;
pub mod postprocess;
