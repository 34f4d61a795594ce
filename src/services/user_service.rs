// src/services/user_service.rs

use rand::Rng;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Cursor, Page, PageParams},
    },
    db::UserRepository,
    models::auth::{AppUser, UserRole},
    services::{
        auth::{hash_password, AuthService},
        role_guard,
    },
};

const GENERATED_PASSWORD_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@$%*?";
const GENERATED_PASSWORD_LEN: usize = 14;
const MIN_DEV_PASSWORD_LEN: usize = 8;

// Quem está chamando um helper de dev: usuário logado e/ou chave de dev
#[derive(Debug, Default, Clone)]
pub struct DevCaller<'a> {
    pub user: Option<&'a AppUser>,
    pub dev_key: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct DevPasswordSet {
    pub uid: Uuid,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    auth_service: AuthService,
    app_base_url: String,
    dev_reset_key: Option<String>,
    production: bool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        auth_service: AuthService,
        app_base_url: String,
        dev_reset_key: Option<String>,
        production: bool,
    ) -> Self {
        Self { user_repo, auth_service, app_base_url, dev_reset_key, production }
    }

    pub async fn create_user(
        &self,
        actor: &AppUser,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<AppUser, AppError> {
        role_guard::authorize_creation(actor.role, role)?;

        let password_hash = hash_password(password).await?;
        let user = self.user_repo.create_user(email, &password_hash, role).await?;

        tracing::info!("👤 Usuário {} criado por {} com papel {:?}", user.email, actor.email, role);
        Ok(user.into())
    }

    pub async fn update_role(&self, actor: &AppUser, uid: Uuid, role: UserRole) -> Result<AppUser, AppError> {
        let target: AppUser = self
            .user_repo
            .find_by_id(uid)
            .await?
            .ok_or(AppError::UserNotFound)?
            .into();

        role_guard::authorize_role_change(actor, &target, role)?;

        let updated = self.user_repo.update_role(uid, role).await?;
        tracing::info!("Papel de {} alterado para {:?} por {}", updated.email, role, actor.email);
        Ok(updated.into())
    }

    pub async fn toggle_suspension(&self, actor: &AppUser, uid: Uuid, suspend: bool) -> Result<AppUser, AppError> {
        // A checagem de auto-suspensão vem antes de qualquer leitura
        if actor.uid == uid {
            return Err(AppError::InvalidArgument("users.self_suspension"));
        }

        let target = self.user_repo.find_by_id(uid).await?.ok_or(AppError::UserNotFound)?;
        role_guard::authorize_suspension(actor, target.id, target.role)?;

        let updated = self.user_repo.set_suspended(uid, suspend).await?;
        tracing::info!(
            "Usuário {} {} por {}",
            updated.email,
            if suspend { "suspenso" } else { "reativado" },
            actor.email
        );
        Ok(updated.into())
    }

    pub async fn list_users(&self, params: &PageParams) -> Result<Page<AppUser>, AppError> {
        let page_size = params.page_size();
        let rows = self.user_repo.list_page(params.cursor()?, page_size).await?;

        let page = Page::from_rows(rows, page_size, |u| Cursor { created_at: u.created_at, id: u.id });
        Ok(Page {
            items: page.items.into_iter().map(AppUser::from).collect(),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    // --- HELPERS DE DESENVOLVIMENTO ---

    fn authorize_dev(&self, caller: &DevCaller<'_>) -> Result<(), AppError> {
        role_guard::authorize_dev_access(
            self.production,
            caller.user.map(|u| u.role),
            caller.dev_key,
            self.dev_reset_key.as_deref(),
        )
    }

    /// Link de redefinição para abrir manualmente (nenhum e-mail é enviado).
    pub async fn dev_password_reset_link(&self, caller: DevCaller<'_>, email: &str) -> Result<String, AppError> {
        self.authorize_dev(&caller)?;

        let user = self.user_repo.find_by_email(email).await?.ok_or(AppError::UserNotFound)?;
        let token = self.auth_service.create_reset_token(user.id)?;

        tracing::info!(
            "Link de redefinição gerado (dev) para {} por {}",
            user.email,
            caller.user.map(|u| u.email.as_str()).unwrap_or("devKey")
        );
        Ok(format!("{}/reset-password?token={}", self.app_base_url.trim_end_matches('/'), token))
    }

    /// Define a senha informada ou, se ela for curta demais, gera uma aleatória.
    pub async fn dev_set_password(
        &self,
        caller: DevCaller<'_>,
        uid: Option<Uuid>,
        email: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<DevPasswordSet, AppError> {
        self.authorize_dev(&caller)?;

        let target_uid = match (uid, email) {
            (Some(uid), _) => uid,
            (None, Some(email)) => {
                self.user_repo
                    .find_by_email(email)
                    .await?
                    .ok_or(AppError::UserNotFound)?
                    .id
            }
            (None, None) => return Err(AppError::InvalidArgument("dev.missing_target")),
        };

        let password = match new_password {
            Some(p) if p.chars().count() >= MIN_DEV_PASSWORD_LEN => p.to_string(),
            _ => generate_password(),
        };

        let password_hash = hash_password(&password).await?;
        self.user_repo.set_password_hash(target_uid, &password_hash).await?;

        tracing::info!(
            "Senha (dev) definida para {} por {}",
            target_uid,
            caller.user.map(|u| u.email.as_str()).unwrap_or("devKey")
        );
        Ok(DevPasswordSet { uid: target_uid, password })
    }

    /// Garante um superadmin inicial. Não faz nada se o e-mail já existir.
    pub async fn bootstrap_superadmin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            tracing::debug!("Superadmin inicial {} já existe", email);
            return Ok(());
        }

        let password_hash = hash_password(password).await?;
        self.user_repo
            .create_user(email, &password_hash, UserRole::Superadmin)
            .await?;
        tracing::info!("✅ Superadmin inicial {} criado", email);
        Ok(())
    }
}

pub fn generate_password() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_PASSWORD_LEN)
        .map(|_| GENERATED_PASSWORD_CHARS[rng.gen_range(0..GENERATED_PASSWORD_CHARS.len())] as char)
        .collect()
}
