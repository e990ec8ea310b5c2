//! Typed mutable buffers that freeze into immutable [`crate::column::Column`]
//! values.
//!
//! Every buffer is write-once per slot: once [`freeze`](NumericBuffer::freeze)
//! (or the equivalent on the other buffer types) has been called, all
//! further mutation fails with [`crate::error::Error::BufferFrozen`]. A
//! single [`std::sync::Mutex`] guards each buffer's mutable state; this
//! crate does not assume lock-free writers, matching the blocking
//! concurrency style the rest of the codebase uses for shared mutable
//! state.

pub mod categorical;
pub mod numeric;
pub mod object;
pub mod temporal;

pub use categorical::CategoricalBuffer;
pub use numeric::NumericBuffer;
pub use object::ObjectBuffer;
pub use temporal::{DateTimeBuffer, TimeOfDayBuffer};
