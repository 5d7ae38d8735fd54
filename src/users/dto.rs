use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;

/// Public part of the user returned to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            is_active: u.is_active,
            is_superuser: u.is_superuser,
        }
    }
}

/// `count` is the number of rows in `data`; `total` counts every user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersPublic {
    pub data: Vec<UserPublic>,
    pub count: usize,
    pub total: i64,
}

/// Admin creation body.
#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn default_true() -> bool {
    true
}

/// Self-service signup body. Never grants privileges.
#[derive(Debug, Deserialize)]
pub struct UserRegister {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<UserRegister> for UserCreate {
    fn from(r: UserRegister) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
            is_active: true,
            is_superuser: false,
        }
    }
}

/// Admin update body.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateMe {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<UserUpdateMe> for UserUpdate {
    fn from(me: UserUpdateMe) -> Self {
        Self {
            name: me.name,
            email: me.email,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
