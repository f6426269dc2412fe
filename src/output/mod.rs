//! Report output
//!
//! Text is the default; `--json` switches to a single JSON document.

pub mod json;
pub mod text;
