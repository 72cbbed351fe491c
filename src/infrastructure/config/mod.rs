//! Infrastructure configuration modules.

pub mod ledger;
pub mod llm;
pub mod logging;
pub mod monitor;
pub mod rating;
pub mod settings;
pub mod settlement;

pub use settings::Config;
