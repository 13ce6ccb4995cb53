pub mod aggregate;
pub mod cli;
pub mod conf;
pub mod engine;
pub mod enrichment;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod parse;
pub mod record;
pub mod render;

pub use engine::{DataState, Engine, EngineError, Evaluation};
pub use filter::{FilterConfig, TimeWindow, Traffic};
pub use record::{ErrorRecord, RequestRecord};
