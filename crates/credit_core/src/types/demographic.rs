//! Categorical customer attributes decoded from dataset codes.

use serde::{Deserialize, Serialize};

/// Customer sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Male
    M,
    /// Female
    F,
}

impl Sex {
    /// Decodes the dataset code: 1 is male, anything else female.
    pub fn from_code(code: i32) -> Self {
        if code == 1 {
            Sex::M
        } else {
            Sex::F
        }
    }
}

/// Highest completed education.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Education {
    /// Graduate school
    GraduateSchool,
    /// University
    University,
    /// High school
    HighSchool,
    /// Any other education
    Others,
    /// Undocumented code
    Unknown,
}

impl Education {
    /// Decodes the dataset code; undocumented codes (0, 5, 6, ...) map to `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Education::GraduateSchool,
            2 => Education::University,
            3 => Education::HighSchool,
            4 => Education::Others,
            _ => Education::Unknown,
        }
    }

    /// Minimum plausible age for a customer holding this education.
    pub fn minimum_age(&self) -> Option<i32> {
        match self {
            Education::GraduateSchool => Some(21),
            Education::University => Some(18),
            Education::HighSchool => Some(16),
            Education::Others | Education::Unknown => None,
        }
    }
}

/// Marital status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    /// Married
    Married,
    /// Single
    Single,
    /// Any other status
    Others,
    /// Undocumented code
    Unknown,
}

impl MaritalStatus {
    /// Decodes the dataset code.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => MaritalStatus::Married,
            2 => MaritalStatus::Single,
            3 => MaritalStatus::Others,
            _ => MaritalStatus::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_codes() {
        assert_eq!(Sex::from_code(1), Sex::M);
        assert_eq!(Sex::from_code(2), Sex::F);
        assert_eq!(Education::from_code(1), Education::GraduateSchool);
        assert_eq!(Education::from_code(6), Education::Unknown);
        assert_eq!(Education::from_code(0), Education::Unknown);
        assert_eq!(MaritalStatus::from_code(2), MaritalStatus::Single);
        assert_eq!(MaritalStatus::from_code(0), MaritalStatus::Unknown);
    }

    #[test]
    fn test_serialised_names() {
        assert_eq!(
            serde_json::to_string(&Education::GraduateSchool).unwrap(),
            "\"GRADUATE_SCHOOL\""
        );
        assert_eq!(serde_json::to_string(&Sex::F).unwrap(), "\"F\"");
    }
}
