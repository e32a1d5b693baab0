#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod mutex;
mod pool;
mod runtime;
mod size;
mod status;
mod worker;

pub use crate::error::*;
pub use crate::pool::*;
#[cfg(any(feature = "thread", feature = "async-tokio"))]
pub use crate::runtime::*;
pub use crate::size::*;
pub use crate::status::*;
pub use crate::worker::*;
