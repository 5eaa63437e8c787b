pub mod clock;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod sequencing;
pub mod snapshot;
pub mod store;
pub mod views;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_config, load_config_from_str, Config};
pub use dispatch::{DedupMode, DispatchNotifier, DispatchOutcome, DispatchSkip};
pub use error::{ConfigError, Result, ShopfloorError, StoreError};
pub use orchestrator::{
    CompletionOutcome, CompletionSummary, DownstreamAction, JobCompletionOrchestrator,
    ProgressReport,
};
pub use snapshot::{RefreshScheduler, ShopSnapshot};
pub use store::{MemoryBackend, SqliteBackend, Stores};
