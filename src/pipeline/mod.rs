//! Pipeline stages for PDF-to-audio conversion.
//!
//! Each submodule implements exactly one transformation step. Speech
//! synthesis, the last step, lives in [`crate::synth`] because it has two
//! interchangeable backends behind a trait.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ synth
//! (path/URL) (pdfium)   (flatten)    (cloud | local)
//! ```
//!
//! 1. [`input`]     — read a local file or download a URL into memory, check `%PDF`
//! 2. [`extract`]   — read the text layer of selected pages; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`normalize`] — collapse newlines and strip invisible characters so
//!    the text reads as one continuous passage

pub mod extract;
pub mod input;
pub mod normalize;
