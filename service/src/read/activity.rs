//! [`activity::Entry`]-related read definitions.
//!
//! [`activity::Entry`]: crate::domain::activity::Entry

pub mod list {
    //! [`Entry`] list definitions.

    use crate::domain::duty;
    #[cfg(doc)]
    use crate::domain::{activity::Entry, Duty};

    /// Selector of the [`Entry`] list, newest first.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Selector {
        /// ID of the [`Duty`] to select [`Entry`]s of, if only of one.
        pub duty_id: Option<duty::Id>,

        /// Maximum number of [`Entry`]s to select.
        pub limit: usize,
    }
}
