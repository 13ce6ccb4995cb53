pub mod check;
pub mod filter_args;
pub mod query;
pub mod watch;


pub use filter_args::FilterArgs;
