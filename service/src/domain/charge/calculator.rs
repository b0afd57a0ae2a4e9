//! [`calculate`] function definition.

use common::Money;

use crate::domain::{
    duty,
    expense::{first_negative, total_of},
    rate::{Side, Tables},
};

use super::{Breakdown, CalculationError, Charges, Context, Missing, Mode, Party};

/// Calculates [`Charges`] of the provided [`Context`] by the provided rate
/// [`Tables`].
///
/// The backend charge is always calculated by the configured backend rates
/// and is never discounted, whatever [`Mode`] the guest is billed in.
/// Verified expenses are added on top of the taxed totals.
///
/// # Errors
///
/// - If a base rate required by the [`Context`] is absent in the [`Tables`].
/// - If any of the verified expenses has a negative amount.
/// - If the amounts are too large to be represented.
pub fn calculate(
    ctx: &Context,
    tables: &Tables,
) -> Result<Charges, CalculationError> {
    let expenses = &ctx.verified_expenses;
    if let Some(e) = first_negative(expenses) {
        return Err(CalculationError::NegativeExpense(e.label.clone()));
    }

    let (guest, original_guest) = match ctx.mode {
        Mode::Chargeable => chargeable(ctx, tables)?,
        Mode::Complimentary => complimentary(),
        Mode::PartOfPackage => part_of_package(ctx, tables)?,
    };
    let backend = rated(ctx, tables.side(Party::Backend), Party::Backend)?;

    let total = |party| {
        total_of(expenses, party).ok_or(CalculationError::Overflow)
    };
    Ok(Charges {
        guest: guest.with_expenses(total(Party::Guest)?)?,
        backend: backend.with_expenses(total(Party::Backend)?)?,
        original_guest,
    })
}

/// Calculates the guest [`Breakdown`] and its undiscounted original in the
/// [`Mode::Chargeable`].
fn chargeable(
    ctx: &Context,
    tables: &Tables,
) -> Result<(Breakdown, Breakdown), CalculationError> {
    let original = rated(ctx, tables.side(Party::Guest), Party::Guest)?;
    let guest = if ctx.apply_discount && !ctx.discount.is_zero() {
        original.discounted(ctx.discount)?
    } else {
        original
    };
    Ok((guest, original))
}

/// Calculates the guest [`Breakdown`] and its original in the
/// [`Mode::Complimentary`].
const fn complimentary() -> (Breakdown, Breakdown) {
    (Breakdown::ZERO, Breakdown::ZERO)
}

/// Calculates the guest [`Breakdown`] and its original in the
/// [`Mode::PartOfPackage`].
///
/// An absent part of package rate is treated as zero.
fn part_of_package(
    ctx: &Context,
    tables: &Tables,
) -> Result<(Breakdown, Breakdown), CalculationError> {
    let base = tables
        .part_of_package(&ctx.vehicle_type, &ctx.kind)
        .unwrap_or(Money::ZERO);
    Ok((Breakdown::ZERO, Breakdown::taxed(base, Money::ZERO)?))
}

/// Calculates the undiscounted [`Breakdown`] by the rates of the provided
/// [`Side`].
fn rated(
    ctx: &Context,
    side: &Side,
    party: Party,
) -> Result<Breakdown, CalculationError> {
    let vehicle = &ctx.vehicle_type;

    if ctx.kind != duty::Kind::LocalUse {
        let base = side.base(vehicle, &ctx.kind).ok_or_else(|| {
            CalculationError::MissingConfiguration(Missing::Base {
                party,
                vehicle: vehicle.clone(),
                kind: ctx.kind.clone(),
            })
        })?;
        return Breakdown::taxed(base, Money::ZERO);
    }

    let package = ctx
        .package_code
        .as_ref()
        .ok_or(CalculationError::PackageRequired)?;
    let base = side.local_use(package, vehicle).ok_or_else(|| {
        CalculationError::MissingConfiguration(Missing::LocalUse {
            party,
            package: package.clone(),
            vehicle: vehicle.clone(),
        })
    })?;
    let extra = match side.extra(vehicle) {
        Some(rate) if ctx.usage.is_any() => rate
            .charge(ctx.usage.km(), ctx.usage.hours())
            .ok_or(CalculationError::Overflow)?,
        _ => Money::ZERO,
    };
    Breakdown::taxed(base, extra)
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use common::{Money, Percent};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::domain::{
        charge::{
            Breakdown, CalculationError, Context, Missing, Mode, Party, Usage,
            TAX_RATE,
        },
        duty,
        expense::{self, Category},
        rate::{ExtraRate, PackageCode, Side, Tables, VehicleType},
    };

    use super::calculate;

    fn sedan() -> VehicleType {
        VehicleType::new("Sedan").unwrap()
    }

    fn package() -> PackageCode {
        PackageCode::new("4H-40K").unwrap()
    }

    fn side(
        pickup: u32,
        drop: u32,
        local_use: u32,
        per_km: u32,
        per_hour: u32,
    ) -> Side {
        Side {
            base: HashMap::from([(
                sedan(),
                HashMap::from([
                    (duty::Kind::AirportPickup, Money::from(pickup)),
                    (duty::Kind::AirportDrop, Money::from(drop)),
                ]),
            )]),
            local_use: HashMap::from([(
                package(),
                HashMap::from([(sedan(), Money::from(local_use))]),
            )]),
            extra: HashMap::from([(
                sedan(),
                ExtraRate {
                    per_km: Money::from(per_km),
                    per_hour: Money::from(per_hour),
                },
            )]),
        }
    }

    fn tables() -> Tables {
        Tables {
            guest: side(4000, 0, 2000, 15, 300),
            backend: side(3000, 2500, 1500, 10, 200),
            part_of_package: HashMap::from([(
                sedan(),
                HashMap::from([(duty::Kind::AirportPickup, Money::from(3500))]),
            )]),
            packages: Vec::new(),
        }
    }

    fn pickup() -> Context {
        Context {
            kind: duty::Kind::AirportPickup,
            vehicle_type: sedan(),
            package_code: None,
            usage: Usage::NONE,
            discount: Percent::ZERO,
            apply_discount: false,
            mode: Mode::Chargeable,
            verified_expenses: Vec::new(),
        }
    }

    fn local_use(km: Decimal, hours: Decimal) -> Context {
        Context {
            kind: duty::Kind::LocalUse,
            package_code: Some(package()),
            usage: Usage::new(km, hours).unwrap(),
            ..pickup()
        }
    }

    fn percent(val: Decimal) -> Percent {
        Percent::new(val).unwrap()
    }

    fn breakdown(base: u32, extra: u32, tax: u32, total: u32) -> Breakdown {
        Breakdown {
            base: Money::from(base),
            extra: Money::from(extra),
            tax: Money::from(tax),
            total: Money::from(total),
        }
    }

    fn verified(party: Party, amount: u32) -> expense::Verified {
        expense::Verified {
            label: "Parking".to_owned(),
            category: Category::Parking,
            party,
            amount: Money::from(amount),
            remark: String::new(),
        }
    }

    #[test]
    fn charges_point_to_point_duty() {
        let charges = calculate(&pickup(), &tables()).unwrap();

        assert_eq!(charges.guest, breakdown(4000, 0, 480, 4480));
        assert_eq!(charges.original_guest, charges.guest);
        assert_eq!(charges.backend, breakdown(3000, 0, 360, 3360));
    }

    #[test]
    fn accepts_zero_rate() {
        let ctx = Context {
            kind: duty::Kind::AirportDrop,
            ..pickup()
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest, Breakdown::ZERO);
        assert_eq!(charges.backend, breakdown(2500, 0, 300, 2800));
    }

    #[test]
    fn charges_local_use_with_extra_usage() {
        let ctx = local_use(dec!(10), dec!(1));

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.original_guest, breakdown(2000, 450, 294, 2744));
        assert_eq!(charges.guest, charges.original_guest);
        assert_eq!(charges.backend, breakdown(1500, 300, 216, 2016));
    }

    #[test]
    fn discounts_local_use() {
        let ctx = Context {
            discount: percent(dec!(10)),
            apply_discount: true,
            ..local_use(dec!(10), dec!(1))
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest, breakdown(1800, 405, 265, 2470));
        assert_eq!(charges.original_guest, breakdown(2000, 450, 294, 2744));
        assert_eq!(charges.backend, breakdown(1500, 300, 216, 2016));
    }

    #[test]
    fn ignores_discount_unless_applied() {
        let ctx = Context {
            discount: percent(dec!(25)),
            apply_discount: false,
            ..pickup()
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest, charges.original_guest);
    }

    #[test]
    fn rounds_discounted_components_half_away_from_zero() {
        let ctx = Context {
            discount: percent(dec!(12.5)),
            apply_discount: true,
            ..local_use(dec!(3), Decimal::ZERO)
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        // 2000 * 0.875 = 1750, 45 * 0.875 = 39.375, tax = 1789 * 0.12
        assert_eq!(charges.guest, breakdown(1750, 39, 215, 2004));
    }

    #[test]
    fn zeroes_everything_on_full_discount() {
        let ctx = Context {
            discount: Percent::HUNDRED,
            apply_discount: true,
            ..local_use(dec!(10), dec!(1))
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest, Breakdown::ZERO);
    }

    #[test]
    fn never_increases_total_with_discount() {
        let mut previous = None;
        for pct in (0..=100).map(Decimal::from) {
            let ctx = Context {
                discount: percent(pct),
                apply_discount: true,
                ..local_use(dec!(7), dec!(2))
            };

            let total = calculate(&ctx, &tables()).unwrap().guest.total;

            if let Some(previous) = previous {
                assert!(total <= previous, "{pct}% increased total");
            }
            previous = Some(total);
        }
    }

    #[test]
    fn taxes_rounded_sum_of_base_and_extra() {
        for ctx in [
            pickup(),
            local_use(dec!(3), Decimal::ZERO),
            local_use(dec!(13), dec!(3)),
            Context {
                discount: percent(dec!(33)),
                apply_discount: true,
                ..local_use(dec!(1), dec!(1))
            },
        ] {
            let charges = calculate(&ctx, &tables()).unwrap();

            for b in [charges.guest, charges.backend, charges.original_guest] {
                assert_eq!(b.tax, ((b.base + b.extra) * TAX_RATE).round());
                assert_eq!(b.total, b.base + b.extra + b.tax);
            }
        }
    }

    #[test]
    fn skips_extra_without_usage_or_rate() {
        let no_usage = calculate(&local_use(dec!(0), dec!(0)), &tables()).unwrap();
        assert_eq!(no_usage.guest, breakdown(2000, 0, 240, 2240));

        let mut tables = tables();
        tables.guest.extra.clear();
        let no_rate = calculate(&local_use(dec!(10), dec!(1)), &tables).unwrap();
        assert_eq!(no_rate.guest, breakdown(2000, 0, 240, 2240));
        assert_eq!(no_rate.backend, breakdown(1500, 300, 216, 2016));
    }

    #[test]
    fn ignores_usage_of_point_to_point_duty() {
        let ctx = Context {
            usage: Usage::new(dec!(50), dec!(5)).unwrap(),
            ..pickup()
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest, breakdown(4000, 0, 480, 4480));
    }

    #[test]
    fn bills_nothing_to_complimentary_guest() {
        let ctx = Context {
            mode: Mode::Complimentary,
            discount: percent(dec!(50)),
            apply_discount: true,
            ..pickup()
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest, Breakdown::ZERO);
        assert_eq!(charges.original_guest, Breakdown::ZERO);
        assert_eq!(
            charges.backend,
            calculate(&pickup(), &tables()).unwrap().backend,
        );
    }

    #[test]
    fn reports_part_of_package_rate() {
        let ctx = Context {
            mode: Mode::PartOfPackage,
            ..pickup()
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest, Breakdown::ZERO);
        assert_eq!(charges.original_guest, breakdown(3500, 0, 420, 3920));
        assert_eq!(charges.backend, breakdown(3000, 0, 360, 3360));
    }

    #[test]
    fn defaults_absent_part_of_package_rate_to_zero() {
        let ctx = Context {
            mode: Mode::PartOfPackage,
            kind: duty::Kind::AirportDrop,
            ..pickup()
        };

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.original_guest, Breakdown::ZERO);
    }

    #[test]
    fn adds_verified_expenses_after_tax() {
        for mode in Mode::ALL.iter().copied() {
            let ctx = Context {
                mode,
                verified_expenses: vec![
                    verified(Party::Guest, 200),
                    verified(Party::Backend, 50),
                ],
                ..pickup()
            };

            let plain = calculate(&Context { mode, ..pickup() }, &tables())
                .unwrap();
            let charges = calculate(&ctx, &tables()).unwrap();

            assert_eq!(charges.guest.total, plain.guest.total + Money::from(200));
            assert_eq!(charges.guest.tax, plain.guest.tax);
            assert_eq!(
                charges.backend.total,
                plain.backend.total + Money::from(50),
            );
            assert_eq!(charges.original_guest, plain.original_guest);
        }
    }

    #[test]
    fn fails_on_missing_guest_rate() {
        let ctx = Context {
            vehicle_type: VehicleType::new("Unknown").unwrap(),
            ..pickup()
        };

        let err = calculate(&ctx, &tables()).unwrap_err();

        assert!(matches!(
            err,
            CalculationError::MissingConfiguration(Missing::Base {
                party: Party::Guest,
                ..
            }),
        ));
        assert!(err.to_string().contains("`Unknown` vehicle"));
    }

    #[test]
    fn fails_on_missing_backend_rate_in_any_mode() {
        let mut tables = tables();
        tables.backend.local_use.clear();

        for mode in Mode::ALL.iter().copied() {
            let ctx = Context {
                mode,
                ..local_use(dec!(1), dec!(1))
            };

            let err = calculate(&ctx, &tables).unwrap_err();

            assert!(matches!(
                err,
                CalculationError::MissingConfiguration(Missing::LocalUse {
                    party: Party::Backend,
                    ..
                }),
            ));
        }
    }

    #[test]
    fn requires_package_for_local_use() {
        let ctx = Context {
            package_code: None,
            ..local_use(dec!(0), dec!(0))
        };

        assert!(matches!(
            calculate(&ctx, &tables()),
            Err(CalculationError::PackageRequired),
        ));
    }

    #[test]
    fn fails_on_overflowing_usage() {
        for ctx in [
            local_use(Decimal::MAX, Decimal::ZERO),
            local_use(Decimal::ZERO, Decimal::MAX),
        ] {
            assert!(matches!(
                calculate(&ctx, &tables()),
                Err(CalculationError::Overflow),
            ));
        }
    }

    #[test]
    fn fails_on_overflowing_rates() {
        let mut tables = tables();
        tables.guest.base.insert(
            sedan(),
            HashMap::from([(duty::Kind::AirportPickup, Money::new(Decimal::MAX))]),
        );

        assert!(matches!(
            calculate(&pickup(), &tables),
            Err(CalculationError::Overflow),
        ));
    }

    #[test]
    fn fails_on_overflowing_expenses() {
        let ctx = Context {
            verified_expenses: vec![expense::Verified {
                amount: Money::new(Decimal::MAX),
                ..verified(Party::Backend, 0)
            }],
            ..pickup()
        };

        assert!(matches!(
            calculate(&ctx, &tables()),
            Err(CalculationError::Overflow),
        ));
    }

    #[test]
    fn rejects_negative_expense() {
        let ctx = Context {
            verified_expenses: vec![
                verified(Party::Guest, 200),
                expense::Verified {
                    label: "Toll".to_owned(),
                    amount: Money::new(dec!(-50)),
                    ..verified(Party::Backend, 0)
                },
            ],
            ..pickup()
        };

        let err = calculate(&ctx, &tables()).unwrap_err();

        assert!(matches!(&err, CalculationError::NegativeExpense(l) if l == "Toll"));
        assert!(err.to_string().contains("`Toll`"));
    }

    #[test]
    fn rejects_negative_usage() {
        assert!(Usage::new(dec!(-1), dec!(0)).is_err());
        assert!(Usage::new(dec!(0), dec!(-0.5)).is_err());
        assert!(
            serde_json::from_str::<Usage>(r#"{"additionalKm": -3}"#).is_err()
        );
    }

    #[test]
    fn parses_context() {
        let ctx: Context = serde_json::from_str(
            r#"{
                "dutyType": "Local Use",
                "vehicleType": "Sedan",
                "packageCode": "4H-40K",
                "usage": {"additionalKm": 10, "additionalHours": 1},
                "discountPercentage": 10,
                "applyDiscount": true,
                "charges": "Chargeable",
                "verifiedExpenses": [{
                    "label": "Parking",
                    "category": "parking",
                    "type": "guest",
                    "amount": 200
                }]
            }"#,
        )
        .unwrap();

        let charges = calculate(&ctx, &tables()).unwrap();

        assert_eq!(charges.guest.total, Money::from(2670));
        assert_eq!(charges.original_guest.total, Money::from(2744));
    }
}
