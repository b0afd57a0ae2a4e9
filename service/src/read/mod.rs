//! Read entities definitions.

pub mod activity;
pub mod duty;
pub mod setting;
