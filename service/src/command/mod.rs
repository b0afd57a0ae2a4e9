//! [`Command`] definition.

pub mod assign_duty;
pub mod calculate_charges;
pub mod cancel_duty;
pub mod create_duty;
pub mod create_setting;
pub mod delete_setting;
pub mod end_trip;
pub mod recalculate_charges;
pub mod start_trip;
pub mod update_setting;
pub mod verify_concierge;
pub mod verify_transport;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    assign_duty::AssignDuty, calculate_charges::CalculateCharges,
    cancel_duty::CancelDuty, create_duty::CreateDuty,
    create_setting::CreateSetting, delete_setting::DeleteSetting,
    end_trip::EndTrip, recalculate_charges::RecalculateCharges,
    start_trip::StartTrip, update_setting::UpdateSetting,
    verify_concierge::VerifyConcierge, verify_transport::VerifyTransport,
};
