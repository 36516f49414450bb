//! The authenticated principal and its role/capability model.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account role. A closed set: the backend only ever issues these four.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Professor,
    Aluno,
    Gerente,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Professor, Role::Aluno, Role::Gerente];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Professor => "professor",
            Role::Aluno => "aluno",
            Role::Gerente => "gerente",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "professor" => Ok(Role::Professor),
            "aluno" => Ok(Role::Aluno),
            "gerente" => Ok(Role::Gerente),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated principal, as the API reports it.
///
/// The four role flags are projections of `role`; exactly one of them is true
/// on a well-formed identity. `is_readonly` is an independent axis — in the
/// current policy only managers carry it, but a read-only manager is not
/// "a weaker admin", so it is never folded into the role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    /// Unique login handle.
    pub username: String,
    /// Display name (the linked professor/aluno record name when present).
    pub nome: String,
    pub role: Role,
    pub is_admin: bool,
    pub is_professor: bool,
    pub is_aluno: bool,
    pub is_gerente: bool,
    #[serde(default)]
    pub is_readonly: bool,
    /// Back-reference to the teacher record, when the role implies one.
    #[serde(default)]
    pub professor_id: Option<i64>,
    /// Back-reference to the student record, when the role implies one.
    #[serde(default)]
    pub aluno_id: Option<i64>,
}

impl Identity {
    /// Build an identity, deriving the four role flags from `role`.
    pub fn new(
        id: i64,
        username: impl Into<String>,
        nome: impl Into<String>,
        role: Role,
        is_readonly: bool,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            nome: nome.into(),
            role,
            is_admin: role == Role::Admin,
            is_professor: role == Role::Professor,
            is_aluno: role == Role::Aluno,
            is_gerente: role == Role::Gerente,
            is_readonly,
            professor_id: None,
            aluno_id: None,
        }
    }

    pub fn with_professor(mut self, professor_id: i64) -> Self {
        self.professor_id = Some(professor_id);
        self
    }

    pub fn with_aluno(mut self, aluno_id: i64) -> Self {
        self.aluno_id = Some(aluno_id);
        self
    }

    /// Exactly one role flag is set, and it is the one matching `role`.
    ///
    /// Wire payloads carry the flags alongside `role`; a payload where they
    /// disagree is malformed and callers should trust `role`.
    pub fn flags_consistent(&self) -> bool {
        let flags = [
            (self.is_admin, Role::Admin),
            (self.is_professor, Role::Professor),
            (self.is_aluno, Role::Aluno),
            (self.is_gerente, Role::Gerente),
        ];

        flags.iter().filter(|(set, _)| *set).count() == 1
            && flags.iter().any(|(set, role)| *set && *role == self.role)
    }
}
