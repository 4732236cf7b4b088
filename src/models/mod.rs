//! Data Models
//!
//! Run configuration, the shared flow state and the report aggregates.

pub mod flow_state;
pub mod issue;
pub mod report;
pub mod settings;

pub use flow_state::*;
pub use issue::*;
pub use report::*;
pub use settings::*;
