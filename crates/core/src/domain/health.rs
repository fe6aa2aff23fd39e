use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: Option<NaiveDate>,
    pub prescribed_by: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerHealthData {
    pub customer_id: CustomerId,
    pub blood_type: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub current_medications: Vec<Medication>,
    pub emergency_contact: Option<EmergencyContact>,
    pub insurance: InsuranceInfo,
}

impl CustomerHealthData {
    pub fn empty(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            blood_type: None,
            height_cm: None,
            weight_kg: None,
            allergies: Vec::new(),
            chronic_conditions: Vec::new(),
            current_medications: Vec::new(),
            emergency_contact: None,
            insurance: InsuranceInfo::default(),
        }
    }
}
