//! Background [`Task`]s definitions.

mod background;
pub mod daily_summary;

pub use common::Handler as Task;

pub use self::{background::Background, daily_summary::DailySummary};
