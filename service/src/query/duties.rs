//! [`Duties`] [`Query`].

use std::time::Duration;

use common::{
    operations::{By, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{
        duty::Status,
        user::{Actor, Role},
        Duty,
    },
    infra::{database, Database},
    read::duty::list::{Filter, Order, Selector},
    Service,
};

use super::Query;

/// [`Query`] listing the [`Duty`]s visible to the provided [`Actor`].
///
/// A chauffeur sees only the [`Duty`]s assigned to them that are ongoing or
/// were completed with a pickup today, earliest pickup first. Everyone else
/// sees all the [`Duty`]s, newest first.
#[derive(Clone, Debug)]
pub struct Duties {
    /// [`Actor`] to list the [`Duty`]s for.
    pub actor: Actor,
}

impl<Db> Query<Duties> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Duty>, Selector>>,
        Ok = Vec<Duty>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Duty>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Duties { actor }: Duties,
    ) -> Result<Self::Ok, Self::Err> {
        if !actor.has_role(Role::Chauffeur) || actor.is_admin() {
            return self
                .database()
                .execute(Select(By::new(Selector::default())))
                .await
                .map_err(tracerr::wrap!());
        }

        let chauffeur = Some(actor.name);
        let today = DateTime::now().start_of_day();
        let tomorrow = today + Duration::from_secs(24 * 60 * 60);

        let mut duties = self
            .database()
            .execute(Select(By::new(Selector {
                filter: Filter {
                    statuses: vec![Status::Active, Status::InProgress],
                    chauffeur: chauffeur.clone(),
                    ..Filter::default()
                },
                order: Order::PickupAscending,
            })))
            .await
            .map_err(tracerr::wrap!())?;
        duties.extend(
            self.database()
                .execute(Select(By::new(Selector {
                    filter: Filter {
                        statuses: vec![Status::Completed],
                        chauffeur,
                        pickup: Some(today..=tomorrow - Duration::from_micros(1)),
                        ..Filter::default()
                    },
                    order: Order::PickupAscending,
                })))
                .await
                .map_err(tracerr::wrap!())?,
        );
        Order::PickupAscending.sort(&mut duties);

        Ok(duties)
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Update, DateTime};

    use crate::{
        command::spec::{actor, duty_in, service},
        domain::{
            duty::{Kind, Status},
            user::{Name, Role},
        },
        infra::Database as _,
        Query as _,
    };

    use super::Duties;

    #[tokio::test]
    async fn lists_everything_for_desks() {
        let svc = service().await;
        let first = duty_in(&svc, Kind::AirportPickup, Status::Pending).await;
        let mut second =
            duty_in(&svc, Kind::AirportDrop, Status::Cancelled).await;
        second.created_at = first.created_at + Duration::from_secs(1);
        svc.database().execute(Update(second.clone())).await.unwrap();

        let duties = svc
            .execute(Duties {
                actor: actor(Role::Concierge),
            })
            .await
            .unwrap();

        assert_eq!(
            duties.iter().map(|d| d.id).collect::<Vec<_>>(),
            [second.id, first.id],
        );
    }

    #[tokio::test]
    async fn lists_own_current_duties_for_chauffeur() {
        let svc = service().await;
        let mut later = duty_in(&svc, Kind::AirportDrop, Status::Active).await;
        later.pickup_at = DateTime::now() + Duration::from_secs(60 * 60);
        svc.database().execute(Update(later.clone())).await.unwrap();
        let completed =
            duty_in(&svc, Kind::AirportPickup, Status::Completed).await;
        let mut ongoing =
            duty_in(&svc, Kind::LocalUse, Status::InProgress).await;
        ongoing.pickup_at = completed.pickup_at - Duration::from_secs(1);
        svc.database().execute(Update(ongoing.clone())).await.unwrap();
        _ = duty_in(&svc, Kind::AirportPickup, Status::Pending).await;
        let mut foreign = duty_in(&svc, Kind::AirportDrop, Status::Active).await;
        foreign.chauffeur_name = Some(Name::new("Someone Else").unwrap());
        svc.database().execute(Update(foreign)).await.unwrap();
        let mut yesterday =
            duty_in(&svc, Kind::AirportPickup, Status::Completed).await;
        yesterday.pickup_at =
            DateTime::now().start_of_day() - Duration::from_secs(60);
        svc.database().execute(Update(yesterday)).await.unwrap();

        let duties = svc
            .execute(Duties {
                actor: actor(Role::Chauffeur),
            })
            .await
            .unwrap();

        assert_eq!(
            duties.iter().map(|d| d.id).collect::<Vec<_>>(),
            [ongoing.id, completed.id, later.id],
        );
    }
}
