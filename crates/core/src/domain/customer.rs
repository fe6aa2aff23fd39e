use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base customer row as supplied by the surrounding application.
///
/// The three `legacy_*` fields hold JSON arrays that were embedded in the customer row before the
/// dedicated health table existed. They are raw text on purpose: their shape is not guaranteed and
/// is only interpreted by [`crate::profile::HealthFields::merge`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub legacy_health_conditions: Option<String>,
    pub legacy_allergies: Option<String>,
    pub legacy_chronic_conditions: Option<String>,
}

impl CustomerRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CustomerId(id.into()),
            name: name.into(),
            email: None,
            date_of_birth: None,
            gender: None,
            legacy_health_conditions: None,
            legacy_allergies: None,
            legacy_chronic_conditions: None,
        }
    }
}
