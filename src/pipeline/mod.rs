//! Pipeline stages for deck generation.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. add a backend variant) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! backend ──▶ repair ──▶ validate ──┐
//! (raw text)  (JSON)    (slides)   ├──▶ assemble ──▶ Deck
//! images ──▶ persist ──▶ pack ─────┘
//! ```
//!
//! 1. [`backend`]: the trait seam plus [`hosted`] and [`local`] wire
//!    clients; the only stage with long-latency network I/O
//! 2. [`repair`]: recover a JSON fragment from noisy model output
//! 3. [`validate`]: structural admission of the slide sequence
//! 4. [`images`]: persist extracted images and pack them into slides
//! 5. [`assemble`]: concatenate and attach generation metadata

pub mod assemble;
pub mod backend;
pub mod hosted;
pub mod images;
pub mod local;
pub mod repair;
pub mod validate;
