mod site;
pub mod tracing;

pub use site::{TestSite, access_line, at};
pub use self::tracing::{CapturedEvent, init_test_tracing};
