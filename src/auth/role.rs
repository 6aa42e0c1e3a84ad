use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::RosterError;

/// Roles an identity can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

/// Set of roles, ordered so serialized claims are stable
pub type RoleSet = BTreeSet<Role>;

impl Role {
    /// Every role, in the order offered on the registration form
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RosterError;

    /// Role names are matched ignoring ASCII case and surrounding whitespace
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RosterError::InvalidRole(trimmed.to_string()))
    }
}

/// Protected operations exposed by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewProfile,
    ViewStudents,
    CreateStudent,
    EditStudent,
    DeleteStudent,
}

impl Action {
    /// Roles allowed to perform this action. An empty set admits any
    /// authenticated principal.
    pub fn required_roles(&self) -> RoleSet {
        match self {
            Action::ViewProfile => RoleSet::new(),
            Action::ViewStudents => RoleSet::from([Role::Student, Role::Teacher, Role::Admin]),
            Action::CreateStudent | Action::EditStudent => {
                RoleSet::from([Role::Teacher, Role::Admin])
            }
            Action::DeleteStudent => RoleSet::from([Role::Admin]),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::ViewProfile => "view_profile",
            Action::ViewStudents => "view_students",
            Action::CreateStudent => "create_student",
            Action::EditStudent => "edit_student",
            Action::DeleteStudent => "delete_student",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(
            "Janitor".parse::<Role>().unwrap_err(),
            RosterError::InvalidRole("Janitor".to_string())
        );
    }

    #[test]
    fn test_role_serializes_as_name() {
        let json = serde_json::to_string(&RoleSet::from([Role::Admin, Role::Student])).unwrap();
        assert_eq!(json, r#"["Student","Admin"]"#);
    }
}
