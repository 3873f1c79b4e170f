#[macro_use]
mod macros;

pub mod options;
pub mod trace;

pub use codec;
pub use message;
pub use runtime;
