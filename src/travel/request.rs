use serde::{Deserialize, Serialize};

use crate::error::TripError;

/// The five free-text trip fields collected by the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
    pub interests: String,
}

impl Default for TripRequest {
    /// The values the form is prefilled with.
    fn default() -> Self {
        Self {
            origin: "India".to_string(),
            destination: "Rome".to_string(),
            departure_date: "1st March 2025".to_string(),
            return_date: "7th March 2025".to_string(),
            interests: "sight seeing and good food".to_string(),
        }
    }
}

impl TripRequest {
    /// Trim every field and reject empty ones, naming the first offender.
    pub fn validated(self) -> Result<Self, TripError> {
        Ok(Self {
            origin: non_empty("From City", self.origin)?,
            destination: non_empty("Destination City", self.destination)?,
            departure_date: non_empty("Departure Date", self.departure_date)?,
            return_date: non_empty("Return Date", self.return_date)?,
            interests: non_empty("Interests", self.interests)?,
        })
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, TripError> {
    let value = value.trim();
    if value.is_empty() {
        Err(TripError::EmptyField { field })
    } else {
        Ok(value.to_string())
    }
}
