// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, ResetClaims, User, PASSWORD_RESET_PURPOSE},
};

const SESSION_DAYS: i64 = 7;
const RESET_TOKEN_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Conta suspensa não recebe sessão
        if user.suspended {
            return Err(AppError::UserSuspended);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user: user.into() })
    }

    /// Decodifica o token e relê o usuário. Papel e suspensão vêm sempre do banco.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if user.suspended {
            return Err(AppError::UserSuspended);
        }
        Ok(user)
    }

    pub fn create_reset_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = ResetClaims {
            sub: user_id,
            purpose: PASSWORD_RESET_PURPOSE.to_string(),
            exp: (now + chrono::Duration::minutes(RESET_TOKEN_MINUTES)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let token_data = decode::<ResetClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        // Um token de sessão não serve para trocar senha
        if token_data.claims.purpose != PASSWORD_RESET_PURPOSE {
            return Err(AppError::InvalidToken);
        }

        let password_hash = hash_password(new_password).await?;
        self.user_repo
            .set_password_hash(token_data.claims.sub, &password_hash)
            .await?;

        tracing::info!("🔑 Senha redefinida para o usuário {}", token_data.claims.sub);
        Ok(())
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(SESSION_DAYS);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

/// bcrypt é caro: roda fora do executor assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        // O pool nunca conecta: os testes abaixo não tocam no banco.
        // `connect_lazy` precisa de um runtime, por isso todos são `tokio::test`.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(UserRepository::new(pool), "test-secret".into())
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_before_the_database() {
        let err = service().validate_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn session_token_cannot_reset_a_password() {
        let service = service();
        let user = User {
            id: Uuid::new_v4(),
            email: "ana@studyx.com".into(),
            password_hash: String::new(),
            role: crate::models::auth::UserRole::Operador,
            suspended: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let session = service.create_token(&user).unwrap();

        let err = service.reset_password(&session, "nova-senha-123").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn reset_token_carries_purpose() {
        let service = service();
        let id = Uuid::new_v4();
        let token = service.create_reset_token(id).unwrap();

        let data = decode::<ResetClaims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, id);
        assert_eq!(data.claims.purpose, PASSWORD_RESET_PURPOSE);
    }
}
