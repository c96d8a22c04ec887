//! External classifier runner.
//!
//! This crate provides:
//! - Type-safe classifier command building
//! - Concurrent stdout/stderr capture with timeout and kill-on-drop
//! - The relay completion policy (stderr or non-zero exit is a failure)
//! - Collision-free scratch files removed on every exit path
//! - A semaphore pool bounding concurrent classifier processes

pub mod command;
pub mod error;
pub mod invocation;
pub mod pool;
pub mod scratch;

pub use command::{check_program, ClassifierCommand, ClassifierRunner};
pub use error::{ClassifierError, ClassifierResult, DEFAULT_FAILURE_MESSAGE};
pub use invocation::{Invocation, OutputMode};
pub use pool::{ClassifierPermit, ClassifierPool, PoolStats};
pub use scratch::{ScratchDir, ScratchFile};
