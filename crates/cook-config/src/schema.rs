use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::CookConfig;

/// JSON schema for `cook.toml`, for editor tooling and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(CookConfig)
}
