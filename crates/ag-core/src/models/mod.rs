//! Persisted record shapes and their insert shapes
//!
//! Four tables back the application:
//! - users
//! - plant analyses
//! - disease reports
//! - user feedback
//!
//! Every table has a full shape (what the backend returns) and an insert
//! shape (the full shape minus the server-assigned `id` and `createdAt`).

/// Declares a lowercase severity enumeration that parses case-insensitively
macro_rules! severity_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::CoreError::Parse(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod analysis;
pub mod feedback;
pub mod report;
pub mod user;

use crate::validation::ValidationErrors;
use crate::{CoreResult, SchemaError};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use analysis::{NewPlantAnalysis, PlantAnalysis, PlantSeverity};
pub use feedback::{NewUserFeedback, UserFeedback};
pub use report::{DiseaseReport, NewDiseaseReport, ReportSeverity};
pub use user::{NewUser, User, UserProfile};

/// Insert shape of a table
pub trait Insertable: Serialize + DeserializeOwned {
    /// Table the shape is inserted into
    const TABLE: &'static str;

    /// Check the value-level invariants the table enforces
    fn check(&self) -> Result<(), ValidationErrors>;
}

/// Structurally validate a candidate record against a shape.
///
/// Missing required fields, wrong primitive types, unparseable timestamps
/// and (for insert shapes) unknown fields such as `id` are all rejected.
pub fn conform<T: DeserializeOwned>(candidate: &serde_json::Value) -> Result<T, SchemaError> {
    serde_json::from_value::<T>(candidate.clone()).map_err(|source| SchemaError {
        shape: shape_name::<T>(),
        source,
    })
}

/// Structurally validate a candidate insert payload, then check its invariants
pub fn conform_insert<T: Insertable>(candidate: &serde_json::Value) -> CoreResult<T> {
    let record: T = conform(candidate)?;
    record.check()?;
    Ok(record)
}

fn shape_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
