use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

/// A named group of buildings of one city, usually one ward of the export.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub watabou_ward_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// `watabouId`s of the buildings in this district.
    #[serde(default)]
    pub buildings: Vec<String>,
}

impl HasId for District {
    type IdType = String;
}

/// Absent fields stay as they are, `null` clears a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DistrictUpdate {
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub name: Option<Option<String>>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub description: Option<Option<String>>,
}

impl DistrictUpdate {
    pub fn apply(&self, district: &District) -> District {
        let mut updated = district.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        updated
    }
}
