//! [`Setting`]-related read definitions.

#[cfg(doc)]
use crate::domain::Setting;

pub mod changes {
    //! [`Setting`] change log definitions.

    use derive_more::{From, Into};

    #[cfg(doc)]
    use crate::domain::{setting::Change, Setting};

    /// Maximum number of the latest [`Change`]s to select.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct Limit(usize);

    impl Limit {
        /// Default [`Limit`] of the [`Setting`] change log.
        pub const DEFAULT: Self = Self(200);
    }

    impl Default for Limit {
        fn default() -> Self {
            Self::DEFAULT
        }
    }
}
