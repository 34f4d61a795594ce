// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Hierarquia de papéis: operador < admin < superadmin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Operador,
    Admin,
    Superadmin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Operador, UserRole::Admin, UserRole::Superadmin];

    pub fn rank(self) -> u8 {
        match self {
            UserRole::Operador => 1,
            UserRole::Admin => 2,
            UserRole::Superadmin => 3,
        }
    }
}

// Representa um usuário vindo do banco de dados.
// A linha em `users` é a única fonte de verdade para papel e suspensão.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// A visão pública do usuário (o "AppUser" do painel)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub uid: Uuid,
    #[schema(example = "operador@studyx.com")]
    pub email: String,
    pub role: UserRole,
    pub suspended: bool,
}

impl From<User> for AppUser {
    fn from(user: User) -> Self {
        Self {
            uid: user.id,
            email: user.email,
            role: user.role,
            suspended: user.suspended,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "users.email_invalid"))]
    #[schema(example = "admin@studyx.com")]
    pub email: String,
    #[validate(length(min = 6, message = "auth.password_short"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: AppUser,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1, message = "auth.invalid_token"))]
    pub token: String,
    #[validate(length(min = 6, message = "auth.password_short"))]
    pub new_password: String,
}

// Claims da sessão. O papel vai junto para o front-end decidir o que mostrar;
// a autorização no servidor sempre relê o usuário do banco.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

pub const PASSWORD_RESET_PURPOSE: &str = "password_reset";

// Token de redefinição de senha (curta duração)
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: Uuid,
    pub purpose: String,
    pub exp: usize,
    pub iat: usize,
}
