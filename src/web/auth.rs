//! Caller identity from the upstream gateway.
//!
//! The gateway authenticates users and forwards `X-User-Id` and `X-User-Role`;
//! this service trusts those headers and only decides who may see which report.

use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::web::error::ApiError;
use crate::web::middleware::client_ip::header_str;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" | "estudiante" => Some(Role::Student),
            "teacher" | "docente" | "profesor" => Some(Role::Teacher),
            "admin" | "administrator" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_staff(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub role: Role,
}

impl Caller {
    /// Resolve whose report is being requested.
    ///
    /// Students always get their own; staff must name a student unless they
    /// are one themselves.
    pub fn resolve_student(&self, requested: Option<i32>) -> Result<i32, ApiError> {
        match requested {
            Some(id) if self.role.is_staff() || id == self.user_id => Ok(id),
            Some(_) => Err(ApiError::forbidden(
                "Students may only request their own reports",
            )),
            None if self.role.is_staff() => Err(ApiError::bad_request(
                "studentId is required for staff requests",
            )),
            None => Ok(self.user_id),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_str(&parts.headers, USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::unauthorized("Invalid user identity"))?;

        let role = header_str(&parts.headers, USER_ROLE_HEADER)
            .map(|raw| Role::parse(raw).ok_or_else(|| ApiError::unauthorized("Unknown user role")))
            .transpose()?
            .unwrap_or(Role::Student);

        Ok(Caller { user_id, role })
    }
}
