use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a `Uuid`-backed identifier newtype with the trait impls every
/// entity id needs (`Display`, `FromStr`, serde via the inner `Uuid`).
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

define_id!(
    /// Identifies a [`crate::Project`].
    ProjectId
);
define_id!(
    /// Identifies a [`crate::Repo`].
    RepoId
);
define_id!(
    /// Identifies a [`crate::Pipeline`].
    PipelineId
);
define_id!(
    /// Identifies a [`crate::Run`].
    RunId
);
define_id!(
    /// Identifies a [`crate::Step`].
    StepId
);
define_id!(
    /// Identifies a [`crate::Metric`].
    MetricId
);
define_id!(
    /// Identifies a [`crate::Baseline`].
    BaselineId
);
define_id!(
    /// Identifies a [`crate::Runner`].
    RunnerId
);
define_id!(
    /// Identifies a [`crate::Secret`].
    SecretId
);
