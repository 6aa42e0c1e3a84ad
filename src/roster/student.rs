use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;

/// Stored student record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub age: u8,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub class: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn from_fields(id: u64, fields: StudentFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: fields.name,
            age: fields.age,
            email: fields.email,
            gender: fields.gender,
            class: fields.class,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite editable fields and bump `updated_at`
    pub fn apply(&mut self, fields: StudentFields, now: DateTime<Utc>) {
        self.name = fields.name;
        self.age = fields.age;
        self.email = fields.email;
        self.gender = fields.gender;
        self.class = fields.class;
        self.updated_at = now;
    }
}

/// Student data as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub name: String,
    pub age: Option<i64>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub class: Option<String>,
}

/// Validated, normalised student data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFields {
    pub name: String,
    pub age: u8,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub class: Option<String>,
}

impl StudentForm {
    /// Check required fields and ranges, trimming text and turning blank
    /// optional fields into `None`
    pub fn validate(self) -> Result<StudentFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RosterError::ValidationError("name is required".to_string()));
        }

        let age = match self.age {
            None => return Err(RosterError::ValidationError("age is required".to_string())),
            Some(age) if !(MIN_AGE..=MAX_AGE).contains(&age) => {
                return Err(RosterError::ValidationError(format!(
                    "age must be between {} and {}",
                    MIN_AGE, MAX_AGE
                )))
            }
            Some(age) => age as u8,
        };

        let email = non_blank(self.email);
        if let Some(ref address) = email {
            if !is_email_shaped(address) {
                return Err(RosterError::ValidationError(format!(
                    "'{}' is not a valid email address",
                    address
                )));
            }
        }

        Ok(StudentFields {
            name: name.to_string(),
            age,
            email,
            gender: non_blank(self.gender),
            class: non_blank(self.class),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loose address check: one `@` with text on both sides and no whitespace
pub fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, age: Option<i64>) -> StudentForm {
        StudentForm {
            name: name.to_string(),
            age,
            ..Default::default()
        }
    }

    #[test]
    fn test_age_bounds() {
        assert!(form("Ann", Some(1)).validate().is_ok());
        assert!(form("Ann", Some(120)).validate().is_ok());
        assert!(form("Ann", Some(0)).validate().is_err());
        assert!(form("Ann", Some(121)).validate().is_err());
        assert!(form("Ann", None).validate().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = form("   ", Some(10)).validate().unwrap_err();
        assert_eq!(err, RosterError::ValidationError("name is required".to_string()));
    }

    #[test]
    fn test_blank_optionals_normalised() {
        let fields = StudentForm {
            name: " Ann ".to_string(),
            age: Some(12),
            email: Some("  ".to_string()),
            gender: Some("F".to_string()),
            class: Some(String::new()),
        }
        .validate()
        .unwrap();

        assert_eq!(fields.name, "Ann");
        assert_eq!(fields.email, None);
        assert_eq!(fields.gender.as_deref(), Some("F"));
        assert_eq!(fields.class, None);
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email_shaped("a@x.com"));
        assert!(is_email_shaped("a@localhost"));
        assert!(!is_email_shaped("a.x.com"));
        assert!(!is_email_shaped("@x.com"));
        assert!(!is_email_shaped("a@"));
        assert!(!is_email_shaped("a@b@c"));
        assert!(!is_email_shaped("a b@x.com"));
    }
}
