//! Stored data of the [`Memory`] database.
//!
//! [`Memory`]: super::Memory

use std::collections::{BTreeMap, HashMap};

use common::DateTime;

use crate::domain::{activity, duty, setting, Duty, Setting};

use super::Error;

/// Committed data.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Stored [`Duty`]s.
    duties: HashMap<duty::Id, Duty>,

    /// Stored [`Setting`]s.
    settings: HashMap<setting::Key, Setting>,

    /// [`setting::Change`] log, oldest first.
    setting_changes: Vec<setting::Change>,

    /// [`activity::Entry`] log, oldest first.
    activities: Vec<activity::Entry>,

    /// Last allocated trip sequence numbers by the start of their day.
    trip_sequences: BTreeMap<DateTime, u32>,
}

impl State {
    /// Allocates the next trip sequence number of the day the provided
    /// [`DateTime`] belongs to.
    pub(crate) fn next_trip_sequence(&mut self, at: DateTime) -> u32 {
        let seq = self.trip_sequences.entry(at.start_of_day()).or_default();
        *seq += 1;
        *seq
    }

    /// Applies the provided [`Write`] to this [`State`].
    pub(crate) fn apply(&mut self, write: Write) {
        match write {
            Write::InsertDuty(duty) | Write::UpdateDuty(duty) => {
                _ = self.duties.insert(duty.id, duty);
            }
            Write::InsertSetting(s) | Write::UpdateSetting(s) => {
                _ = self.settings.insert(s.key, s);
            }
            Write::DeleteSetting(key) => {
                _ = self.settings.remove(&key);
            }
            Write::LogSettingChange(change) => {
                self.setting_changes.push(change);
            }
            Write::LogActivity(entry) => self.activities.push(entry),
        }
    }

    /// Applies the provided [`Staged`] writes to this [`State`].
    pub(crate) fn commit(&mut self, staged: Staged) {
        let Staged {
            duties,
            settings,
            setting_changes,
            activities,
        } = staged;

        self.duties.extend(duties);
        for (key, setting) in settings {
            _ = match setting {
                Some(s) => self.settings.insert(key, s),
                None => self.settings.remove(&key),
            };
        }
        self.setting_changes.extend(setting_changes);
        self.activities.extend(activities);
    }
}

/// Writes of a transaction, not committed yet.
#[derive(Debug, Default)]
pub(crate) struct Staged {
    /// Inserted or updated [`Duty`]s.
    duties: HashMap<duty::Id, Duty>,

    /// Inserted or updated [`Setting`]s, or [`None`] for deleted ones.
    settings: HashMap<setting::Key, Option<Setting>>,

    /// Logged [`setting::Change`]s.
    setting_changes: Vec<setting::Change>,

    /// Logged [`activity::Entry`]s.
    activities: Vec<activity::Entry>,
}

impl Staged {
    /// Stages the provided [`Write`].
    pub(crate) fn apply(&mut self, write: Write) {
        match write {
            Write::InsertDuty(duty) | Write::UpdateDuty(duty) => {
                _ = self.duties.insert(duty.id, duty);
            }
            Write::InsertSetting(s) | Write::UpdateSetting(s) => {
                _ = self.settings.insert(s.key, Some(s));
            }
            Write::DeleteSetting(key) => {
                _ = self.settings.insert(key, None);
            }
            Write::LogSettingChange(change) => {
                self.setting_changes.push(change);
            }
            Write::LogActivity(entry) => self.activities.push(entry),
        }
    }
}

/// Modification of the stored data.
#[derive(Clone, Debug)]
pub enum Write {
    /// Inserts a new [`Duty`].
    InsertDuty(Duty),

    /// Replaces an existing [`Duty`].
    UpdateDuty(Duty),

    /// Inserts a new [`Setting`].
    InsertSetting(Setting),

    /// Replaces an existing [`Setting`].
    UpdateSetting(Setting),

    /// Deletes an existing [`Setting`].
    DeleteSetting(setting::Key),

    /// Appends a [`setting::Change`] to the log.
    LogSettingChange(setting::Change),

    /// Appends an [`activity::Entry`] to the log.
    LogActivity(activity::Entry),
}

impl Write {
    /// Checks this [`Write`] against the constraints of the provided
    /// [`View`].
    ///
    /// # Errors
    ///
    /// If a unique constraint is violated, or the modified document doesn't
    /// exist.
    pub(crate) fn check(&self, view: View<'_>) -> Result<(), Error> {
        match self {
            Self::InsertDuty(duty) => {
                if view.duty(duty.id).is_some() {
                    return Err(Error::UniqueViolation("duties_pkey"));
                }
                if view.duties().any(|d| d.trip_id == duty.trip_id) {
                    return Err(Error::UniqueViolation("duties_trip_id_key"));
                }
                Ok(())
            }
            Self::UpdateDuty(duty) => view
                .duty(duty.id)
                .map(drop)
                .ok_or(Error::NotFound("Duty")),
            Self::InsertSetting(s) => match view.setting(s.key) {
                Some(_) => Err(Error::UniqueViolation("settings_pkey")),
                None => Ok(()),
            },
            Self::UpdateSetting(Setting { key, .. }) | Self::DeleteSetting(key) => {
                view.setting(*key).map(drop).ok_or(Error::NotFound("Setting"))
            }
            Self::LogSettingChange(_) | Self::LogActivity(_) => Ok(()),
        }
    }
}

/// Read-only view of the stored data, with the staged writes of a
/// transaction (if any) applied on top of the committed ones.
#[derive(Clone, Copy, Debug)]
pub struct View<'a> {
    /// Committed [`State`].
    state: &'a State,

    /// [`Staged`] writes of a transaction.
    staged: Option<&'a Staged>,
}

impl<'a> View<'a> {
    /// Creates a new [`View`] of the committed [`State`] only.
    pub(crate) fn committed(state: &'a State) -> Self {
        Self {
            state,
            staged: None,
        }
    }

    /// Creates a new [`View`] of the committed [`State`] with the [`Staged`]
    /// writes applied on top.
    pub(crate) fn staged(state: &'a State, staged: &'a Staged) -> Self {
        Self {
            state,
            staged: Some(staged),
        }
    }

    /// Returns the [`Duty`] with the provided ID, if any.
    #[must_use]
    pub fn duty(self, id: duty::Id) -> Option<&'a Duty> {
        self.staged
            .and_then(|s| s.duties.get(&id))
            .or_else(|| self.state.duties.get(&id))
    }

    /// Iterates over all the [`Duty`]s in no particular order.
    pub fn duties(self) -> impl Iterator<Item = &'a Duty> {
        let staged = self.staged.map(|s| &s.duties);
        self.state
            .duties
            .values()
            .filter(move |d| staged.map_or(true, |s| !s.contains_key(&d.id)))
            .chain(staged.into_iter().flat_map(HashMap::values))
    }

    /// Returns the [`Setting`] with the provided [`setting::Key`], if any.
    #[must_use]
    pub fn setting(self, key: setting::Key) -> Option<&'a Setting> {
        match self.staged.and_then(|s| s.settings.get(&key)) {
            Some(staged) => staged.as_ref(),
            None => self.state.settings.get(&key),
        }
    }

    /// Iterates over all the [`Setting`]s in the [`setting::Key`]s order.
    pub fn settings(self) -> impl Iterator<Item = &'a Setting> {
        setting::Key::ALL.iter().filter_map(move |k| self.setting(*k))
    }

    /// Iterates over the [`setting::Change`] log, oldest first.
    pub fn setting_changes(
        self,
    ) -> impl DoubleEndedIterator<Item = &'a setting::Change> {
        self.state
            .setting_changes
            .iter()
            .chain(self.staged.into_iter().flat_map(|s| &s.setting_changes))
    }

    /// Iterates over the [`activity::Entry`] log, oldest first.
    pub fn activities(
        self,
    ) -> impl DoubleEndedIterator<Item = &'a activity::Entry> {
        self.state
            .activities
            .iter()
            .chain(self.staged.into_iter().flat_map(|s| &s.activities))
    }
}
