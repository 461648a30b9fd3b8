//! keybridge daemon library
//!
//! Bridges a physical keyboard's kernel event stream to [`codec::KeyEvent`]s
//! and writes key events back to the kernel through a uinput virtual
//! keyboard ([`sink::UinputSink`]).

pub mod bridge;
pub mod codec;
pub mod device;
pub mod error;
pub mod ffi;
pub mod keycodes;
pub mod sink;
pub mod source;
pub mod time;

#[cfg(test)]
mod testing;
