#[cfg(feature = "thread")]
mod thread;
#[cfg(feature = "async-tokio")]
mod tokio;

#[cfg(feature = "thread")]
pub use thread::*;
#[cfg(feature = "async-tokio")]
pub use tokio::*;
