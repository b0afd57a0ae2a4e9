//! [`ComputeCharges`] [`Query`].

use std::collections::HashMap;

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        charge::{self, CalculationError, Charges},
        setting, Setting,
    },
    infra::{database, Database},
    Service,
};

use super::{rate_tables, Query, RateTables};

/// [`Query`] calculating [`Charges`] of the provided [`charge::Context`] by
/// the current rates, without persisting anything.
#[derive(Clone, Debug)]
pub struct ComputeCharges(pub charge::Context);

impl<Db> Query<ComputeCharges> for Service<Db>
where
    Db: Database<
        Select<By<HashMap<setting::Key, Setting>, ()>>,
        Ok = HashMap<setting::Key, Setting>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Charges;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ComputeCharges(ctx): ComputeCharges,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tables = self
            .execute(RateTables)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let charges = charge::calculate(&ctx, &tables)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        log::debug!("computed charges of `{}` duty: {charges:?}", ctx.kind);

        Ok(charges)
    }
}

/// Error of [`ComputeCharges`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Charges`] cannot be calculated.
    #[display("Failed to calculate charges: {_0}")]
    Calculation(CalculationError),

    /// [`rate::Tables`] cannot be loaded.
    ///
    /// [`rate::Tables`]: crate::domain::rate::Tables
    #[display("Failed to load rate tables: {_0}")]
    Rates(rate_tables::ExecutionError),
}

#[cfg(test)]
mod spec {
    use common::Money;
    use serde_json::json;

    use crate::{command::spec::service, domain::charge, Query as _};

    use super::{ComputeCharges, ExecutionError};

    #[tokio::test]
    async fn computes_by_stored_rates() {
        let svc = service().await;
        let ctx: charge::Context = serde_json::from_value(json!({
            "dutyType": "Local Use",
            "vehicleType": "Sedan",
            "packageCode": "4H-40K",
            "usage": {"additionalKm": 10, "additionalHours": 1},
            "discountPercentage": 10,
            "applyDiscount": true,
        }))
        .unwrap();

        let charges = svc.execute(ComputeCharges(ctx)).await.unwrap();

        assert_eq!(charges.original_guest.total, Money::from(2744));
        assert_eq!(charges.guest.total, Money::from(2470));
        assert_eq!(charges.backend.total, Money::from(2016));
    }

    #[tokio::test]
    async fn reports_missing_local_use_rate() {
        let svc = service().await;
        let ctx: charge::Context = serde_json::from_value(json!({
            "dutyType": "Local Use",
            "vehicleType": "Sedan",
            "packageCode": "8H-80K",
        }))
        .unwrap();

        let err = svc.execute(ComputeCharges(ctx)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Calculation(_)));
    }
}
