//! Shipping address fields and the frozen copy stored on orders.

use serde::{Deserialize, Serialize};

/// A required address field was blank.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} may not be blank")]
pub struct ShippingSnapshotError {
    /// Name of the offending field, as it appears in the API.
    pub field: &'static str,
}

/// Recipient and postal fields of an address.
///
/// The address book stores one of these per address. At checkout the whole
/// value is copied onto the order, so later edits or deletion of the source
/// address never change where an order ships.
///
/// Missing fields deserialize as empty strings so that [`Self::normalized`]
/// reports them by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShippingSnapshot {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl ShippingSnapshot {
    /// Maximum length for name and street lines.
    pub const MAX_LINE_LENGTH: usize = 255;
    /// Maximum length for phone and pincode.
    pub const MAX_SHORT_LENGTH: usize = 20;
    /// Maximum length for city and state.
    pub const MAX_REGION_LENGTH: usize = 100;

    /// Trim every field and check required ones are present.
    ///
    /// `line2` is the only optional field.
    ///
    /// # Errors
    ///
    /// Returns the first required field that is blank or over its length limit.
    pub fn normalized(self) -> Result<Self, ShippingSnapshotError> {
        let snapshot = Self {
            full_name: self.full_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            line1: self.line1.trim().to_owned(),
            line2: self.line2.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            pincode: self.pincode.trim().to_owned(),
        };

        let checks: [(&'static str, &str, usize, bool); 7] = [
            ("full_name", &snapshot.full_name, Self::MAX_LINE_LENGTH, true),
            ("phone", &snapshot.phone, Self::MAX_SHORT_LENGTH, true),
            ("line1", &snapshot.line1, Self::MAX_LINE_LENGTH, true),
            ("line2", &snapshot.line2, Self::MAX_LINE_LENGTH, false),
            ("city", &snapshot.city, Self::MAX_REGION_LENGTH, true),
            ("state", &snapshot.state, Self::MAX_REGION_LENGTH, true),
            ("pincode", &snapshot.pincode, Self::MAX_SHORT_LENGTH, true),
        ];

        for (field, value, max, required) in checks {
            if (required && value.is_empty()) || value.chars().count() > max {
                return Err(ShippingSnapshotError { field });
            }
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn main_st() -> ShippingSnapshot {
        ShippingSnapshot {
            full_name: " Asha Rao ".to_owned(),
            phone: "9999900000".to_owned(),
            line1: "123 Main St".to_owned(),
            line2: String::new(),
            city: "Pune".to_owned(),
            state: "MH".to_owned(),
            pincode: "411001".to_owned(),
        }
    }

    #[test]
    fn test_normalized_trims() {
        let s = main_st().normalized().unwrap();
        assert_eq!(s.full_name, "Asha Rao");
    }

    #[test]
    fn test_normalized_rejects_blank_required_field() {
        let mut s = main_st();
        s.city = "   ".to_owned();
        assert_eq!(
            s.normalized().unwrap_err(),
            ShippingSnapshotError { field: "city" }
        );
    }

    #[test]
    fn test_line2_is_optional_but_bounded() {
        let mut s = main_st();
        s.line2 = "x".repeat(256);
        assert_eq!(s.normalized().unwrap_err().field, "line2");
    }

    #[test]
    fn test_missing_fields_deserialize_blank() {
        let s: ShippingSnapshot = serde_json::from_str(r#"{"full_name":"Asha"}"#).unwrap();
        assert_eq!(s.normalized().unwrap_err().field, "phone");
    }
}
