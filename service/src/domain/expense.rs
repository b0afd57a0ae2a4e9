//! Operational expense definitions.

use common::{define_kind, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::charge::Party;
#[cfg(doc)]
use crate::domain::Duty;

/// Amount by which an [`Entry`] may exceed the unallocated remainder and
/// still be matched against it.
pub const SPLIT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

define_kind! {
    #[doc = "Category of an operational expense."]
    enum Category {
        #[doc = "Parking fees."]
        Parking = 1 => "parking",

        #[doc = "Fuel refills."]
        Fuel = 2 => "fuel",

        #[doc = "Anything else (tolls, permits, etc.)."]
        Misc = 3 => "misc",
    }
}

/// Expense allocated to a [`Party`] after a manual review.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Verified {
    /// Human-readable label of this expense.
    pub label: String,

    /// [`Category`] of this expense.
    pub category: Category,

    /// [`Party`] this expense is billed to.
    #[serde(rename = "type")]
    pub party: Party,

    /// Amount of this expense.
    pub amount: Money,

    /// Free-form remark of the reviewer.
    #[serde(default)]
    pub remark: String,
}

/// Sums the amounts of [`Verified`] expenses billed to the provided
/// [`Party`].
///
/// [`None`] is returned if the sum overflows.
#[must_use]
pub fn total_of<'a>(
    expenses: impl IntoIterator<Item = &'a Verified>,
    party: Party,
) -> Option<Money> {
    expenses
        .into_iter()
        .filter(|e| e.party == party)
        .try_fold(Money::ZERO, |total, e| total.checked_add(e.amount))
}

/// Returns the first of the provided [`Verified`] expenses having a negative
/// amount, if any.
#[must_use]
pub fn first_negative<'a>(
    expenses: impl IntoIterator<Item = &'a Verified>,
) -> Option<&'a Verified> {
    expenses.into_iter().find(|e| e.amount.is_negative())
}

/// Expense recorded by a chauffeur at the end of a trip.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Amount of this [`Entry`].
    pub amount: Money,

    /// Free-form remark of the chauffeur.
    #[serde(default)]
    pub remark: String,

    /// Reference to the uploaded receipt image.
    pub image_ref: String,

    /// [`Party`] this [`Entry`] was allocated to by a reconciliation, if it
    /// was.
    #[serde(default)]
    pub split: Option<Party>,
}

/// Recorded [`Entry`]s of a single [`Category`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Expenses {
    /// Indicator whether the chauffeur reported expenses of this
    /// [`Category`].
    pub enabled: bool,

    /// Recorded [`Entry`]s in their reporting order.
    pub entries: Vec<Entry>,
}

impl Expenses {
    /// Returns the total amount of the [`Entry`]s.
    #[must_use]
    pub fn total(&self) -> Money {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

/// Expenses recorded for a [`Duty`], grouped by [`Category`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Ledger {
    /// [`Category::Parking`] expenses.
    pub parking: Expenses,

    /// [`Category::Fuel`] expenses.
    pub fuel: Expenses,

    /// [`Category::Misc`] expenses.
    pub misc: Expenses,
}

impl Ledger {
    /// Returns [`Expenses`] of the provided [`Category`].
    #[must_use]
    pub fn category(&self, category: Category) -> &Expenses {
        match category {
            Category::Parking => &self.parking,
            Category::Fuel => &self.fuel,
            Category::Misc => &self.misc,
        }
    }

    /// Returns mutable [`Expenses`] of the provided [`Category`].
    pub fn category_mut(&mut self, category: Category) -> &mut Expenses {
        match category {
            Category::Parking => &mut self.parking,
            Category::Fuel => &mut self.fuel,
            Category::Misc => &mut self.misc,
        }
    }

    /// Returns the first enabled [`Category`] having an [`Entry`] with a
    /// negative amount or without a receipt image.
    #[must_use]
    pub fn incomplete(&self) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| {
            let expenses = self.category(*c);
            expenses.enabled
                && expenses.entries.iter().any(|e| {
                    e.amount.is_negative() || e.image_ref.trim().is_empty()
                })
        })
    }

    /// Returns the total amount of all the recorded [`Entry`]s.
    #[must_use]
    pub fn total(&self) -> Money {
        Category::ALL.iter().map(|c| self.category(*c).total()).sum()
    }

    /// Marks the recorded [`Entry`]s with the [`Party`] of the [`Verified`]
    /// expenses covering them.
    ///
    /// For every [`Verified`] expense, in order, the not yet split
    /// [`Entry`]s of its [`Category`] are walked in their reporting order and
    /// each one fitting into the unallocated remainder (within the
    /// [`SPLIT_TOLERANCE`]) is taken, until the remainder is exhausted.
    ///
    /// This is a first-fit approximation: when amounts overlap ambiguously,
    /// the earlier [`Entry`] wins, even if a later one would match exactly.
    pub fn reconcile<'a>(
        &mut self,
        verified: impl IntoIterator<Item = &'a Verified>,
    ) {
        let tolerance = Money::new(SPLIT_TOLERANCE);
        for allocation in verified {
            let mut remaining = allocation.amount;
            for entry in &mut self.category_mut(allocation.category).entries {
                if remaining <= Money::ZERO {
                    break;
                }
                if entry.split.is_some() {
                    continue;
                }
                let fits = remaining
                    .checked_add(tolerance)
                    .map_or(true, |limit| entry.amount <= limit);
                if fits {
                    entry.split = Some(allocation.party);
                    remaining -= entry.amount;
                }
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::domain::charge::Party;

    use super::{
        first_negative, total_of, Category, Entry, Expenses, Ledger, Verified,
        SPLIT_TOLERANCE,
    };

    fn entry(amount: Money) -> Entry {
        Entry {
            amount,
            remark: String::new(),
            image_ref: "receipt.jpg".to_owned(),
            split: None,
        }
    }

    fn verified(category: Category, party: Party, amount: Money) -> Verified {
        Verified {
            label: category.to_string(),
            category,
            party,
            amount,
            remark: String::new(),
        }
    }

    fn ledger(parking: &[u32], fuel: &[u32]) -> Ledger {
        let expenses = |amounts: &[u32]| Expenses {
            enabled: !amounts.is_empty(),
            entries: amounts.iter().map(|a| entry(Money::from(*a))).collect(),
        };
        Ledger {
            parking: expenses(parking),
            fuel: expenses(fuel),
            misc: Expenses::default(),
        }
    }

    fn splits(expenses: &Expenses) -> Vec<Option<Party>> {
        expenses.entries.iter().map(|e| e.split).collect()
    }

    #[test]
    fn sums_by_party() {
        let expenses = [
            verified(Category::Parking, Party::Guest, Money::from(200)),
            verified(Category::Fuel, Party::Backend, Money::from(50)),
            verified(Category::Misc, Party::Guest, Money::new(dec!(12.5))),
        ];

        assert_eq!(
            total_of(&expenses, Party::Guest),
            Some(Money::new(dec!(212.5))),
        );
        assert_eq!(total_of(&expenses, Party::Backend), Some(Money::from(50)));
        assert_eq!(
            total_of(std::iter::empty(), Party::Guest),
            Some(Money::ZERO),
        );
    }

    #[test]
    fn sum_does_not_overflow() {
        let expenses = [
            verified(Category::Misc, Party::Guest, Money::new(Decimal::MAX)),
            verified(Category::Misc, Party::Guest, Money::from(1)),
            verified(Category::Misc, Party::Backend, Money::from(1)),
        ];

        assert_eq!(total_of(&expenses, Party::Guest), None);
        assert_eq!(total_of(&expenses, Party::Backend), Some(Money::from(1)));
    }

    #[test]
    fn finds_negative_amount() {
        let mut expenses = vec![
            verified(Category::Parking, Party::Guest, Money::from(200)),
            verified(Category::Fuel, Party::Backend, Money::ZERO),
        ];
        assert!(first_negative(&expenses).is_none());

        expenses.push(verified(
            Category::Misc,
            Party::Guest,
            Money::new(dec!(-10)),
        ));
        assert_eq!(
            first_negative(&expenses).map(|e| e.category),
            Some(Category::Misc),
        );
    }

    #[test]
    fn split_tolerance_is_one_hundredth() {
        assert_eq!(SPLIT_TOLERANCE, dec!(0.01));
    }

    #[test]
    fn totals_ledger() {
        assert_eq!(ledger(&[100, 50], &[700]).total(), Money::from(850));
        assert_eq!(Ledger::default().total(), Money::ZERO);
    }

    #[test]
    fn detects_incomplete_entries() {
        let mut ledger = ledger(&[100], &[700]);
        assert_eq!(ledger.incomplete(), None);

        ledger.fuel.entries[0].image_ref = String::new();
        assert_eq!(ledger.incomplete(), Some(Category::Fuel));

        ledger.fuel.enabled = false;
        assert_eq!(ledger.incomplete(), None);
    }

    #[test]
    fn splits_first_fitting_entries() {
        let mut ledger = ledger(&[100, 50, 30], &[700]);

        ledger.reconcile(&[
            verified(Category::Parking, Party::Guest, Money::from(130)),
            verified(Category::Parking, Party::Backend, Money::from(50)),
            verified(Category::Fuel, Party::Backend, Money::from(700)),
        ]);

        assert_eq!(
            splits(&ledger.parking),
            [Some(Party::Guest), Some(Party::Backend), Some(Party::Guest)],
        );
        assert_eq!(splits(&ledger.fuel), [Some(Party::Backend)]);
    }

    #[test]
    fn tolerates_rounding_difference() {
        let mut ledger = ledger(&[], &[]);
        ledger.parking.entries.push(entry(Money::new(dec!(100.005))));

        ledger.reconcile(&[verified(
            Category::Parking,
            Party::Guest,
            Money::from(100),
        )]);

        assert_eq!(splits(&ledger.parking), [Some(Party::Guest)]);
    }

    #[test]
    fn skips_already_split_and_oversized_entries() {
        let mut ledger = ledger(&[80, 200, 40], &[]);
        ledger.parking.entries[0].split = Some(Party::Backend);

        ledger.reconcile(&[verified(
            Category::Parking,
            Party::Guest,
            Money::from(120),
        )]);

        assert_eq!(
            splits(&ledger.parking),
            [Some(Party::Backend), None, Some(Party::Guest)],
        );
    }

    #[test]
    fn takes_every_entry_for_largest_amount() {
        let mut ledger = ledger(&[100, 50], &[]);

        ledger.reconcile(&[verified(
            Category::Parking,
            Party::Guest,
            Money::new(Decimal::MAX),
        )]);

        assert_eq!(
            splits(&ledger.parking),
            [Some(Party::Guest), Some(Party::Guest)],
        );
    }

    #[test]
    fn prefers_earlier_entry_on_ambiguous_overlap() {
        let mut ledger = ledger(&[60, 100], &[]);

        ledger.reconcile(&[verified(
            Category::Parking,
            Party::Guest,
            Money::from(100),
        )]);

        assert_eq!(splits(&ledger.parking), [Some(Party::Guest), None]);
    }
}
