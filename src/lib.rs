mod arena;
mod backoff;
mod cache_padded;
mod combining;
mod config;
mod elimination;
mod error;
mod ms_queue;
mod structure;
mod treiber;

pub mod barrier;
pub mod ebr;
pub mod harness;
pub mod lock;
pub mod locked;

pub use arena::{Arena, NodeId};
pub use backoff::{Backoff, SpinConfig};
pub use barrier::{Barrier, BarrierKind, LocalSense, RawBarrier};
pub use cache_padded::CachePadded;
pub use combining::{FlatCombiner, Operation, Withdrawn};
pub use config::{Config, Optimizations};
pub use ebr::{Collector, Epoch, ReclaimConfig};
pub use elimination::EliminationArray;
pub use error::{fatal, ConfigError};
pub use harness::{run_push_pop, RunReport, Worker};
pub use lock::{Lock, LockKind, Mutex, MutexGuard, RawLock};
pub use locked::{LockedHandle, LockedQueue, LockedStack};
pub use ms_queue::{MsQueue, QueueHandle};
pub use structure::{Structure, Value};
pub use treiber::{StackHandle, TreiberStack};
