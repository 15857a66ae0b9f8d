//! Request/Response types for the HTTP API

use crate::model::{Group, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub data: String,
    #[serde(rename = "perms")]
    pub permissions: u32,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id.0,
            name: user.name,
            data: user.data,
            permissions: user.permissions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDto {
    pub id: Uuid,
    pub name: String,
}

impl From<Group> for GroupDto {
    fn from(group: Group) -> Self {
        GroupDto {
            id: group.id.0,
            name: group.name,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

/// `?uid=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdQuery {
    pub uid: Option<String>,
}

/// `?uid=&gid=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkQuery {
    pub uid: Option<String>,
    pub gid: Option<String>,
}

/// `?q=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        StatusResponse {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
