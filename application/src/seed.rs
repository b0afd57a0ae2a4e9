//! Seeding of the initial [`Setting`]s.
//!
//! [`Setting`]: service::domain::Setting

use std::{collections::HashMap, fs, io, path::Path};

use derive_more::{Display, Error, From};
use service::{
    command::{create_setting, CreateSetting},
    domain::{setting, user},
    Command as _,
};
use tracerr::Traced;
use tracing as log;

use crate::Service;

/// Creates the [`Setting`]s described by the JSON file at the provided
/// `path`, returning the number of created [`Setting`]s.
///
/// The file holds a JSON object of setting values keyed by [`setting::Key`].
///
/// # Errors
///
/// Errors if the file cannot be read or parsed, or any of the [`Setting`]s
/// cannot be created.
///
/// [`Setting`]: service::domain::Setting
pub async fn settings(
    service: &Service,
    path: impl AsRef<Path>,
) -> Result<usize, SeedError> {
    let raw = fs::read_to_string(path)?;
    let values: HashMap<setting::Key, serde_json::Value> =
        serde_json::from_str(&raw)?;

    let actor = system();
    let count = values.len();
    for (key, values) in values {
        _ = service
            .execute(CreateSetting {
                key,
                values,
                actor: actor.clone(),
            })
            .await?;
        log::debug!("seeded `{key}` setting");
    }

    Ok(count)
}

/// Administrator on whose behalf the [`Setting`]s are seeded.
///
/// [`Setting`]: service::domain::Setting
fn system() -> user::Actor {
    user::Actor {
        id: user::Id::new(),
        name: user::Name::new("System")
            .unwrap_or_else(|| unreachable!("valid `user::Name`")),
        roles: vec![user::Role::Admin],
    }
}

/// Error of seeding the initial [`Setting`]s.
///
/// [`Setting`]: service::domain::Setting
#[derive(Debug, Display, Error, From)]
pub enum SeedError {
    /// Seed file cannot be read.
    #[display("Failed to read settings seed: {_0}")]
    Io(io::Error),

    /// Seed file is not a valid JSON object of settings.
    #[display("Failed to parse settings seed: {_0}")]
    Json(serde_json::Error),

    /// [`Setting`] cannot be created.
    ///
    /// [`Setting`]: service::domain::Setting
    #[display("Failed to create setting: {_0}")]
    Setting(Traced<create_setting::ExecutionError>),
}
