//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas do widget de chat
    let conversation_routes = Router::new()
        .route("/", post(handlers::chat::start_conversation))
        .route("/{id}/messages", post(handlers::chat::send_message))
        .route("/{id}/invoice", get(handlers::invoices::get_invoice))
        .route("/{id}/invoice.pdf", get(handlers::invoices::get_invoice_pdf));

    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/reset-password", post(handlers::auth::reset_password));

    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Painel: o papel exigido fica em cada handler (RequireRole)
    let admin_routes = Router::new()
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/users/{uid}/role", put(handlers::users::update_user_role))
        .route("/users/{uid}/suspension", put(handlers::users::toggle_user_suspension))
        .route("/conversations", get(handlers::admin_conversations::list_conversations))
        .route("/conversations/export", get(handlers::admin_conversations::export_conversations))
        .route("/conversations/{id}", get(handlers::admin_conversations::get_conversation))
        .route("/metrics", get(handlers::dashboard::get_metrics))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Sessão opcional: também aceitam a chave de dev
    let dev_routes = Router::new()
        .route("/password-reset-link", post(handlers::dev::password_reset_link))
        .route("/set-password", post(handlers::dev::set_password));

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/lead-capture", post(handlers::leads::capture_lead))
        .route("/api/summarize-conversation", post(handlers::chat::summarize_conversation))
        .route(
            "/api/cursos",
            get(handlers::courses::list_sheet_courses).post(handlers::courses::match_course),
        )
        .nest("/api/conversations", conversation_routes)
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/dev", dev_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let bind_addr = settings.bind_addr.clone();
    if !settings.production {
        tracing::warn!("APP_ENV diferente de production: rotas /api/dev habilitadas");
    }

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new(settings)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some((email, password)) = app_state.settings.bootstrap_superadmin.clone() {
        app_state
            .user_service
            .bootstrap_superadmin(&email, &password)
            .await
            .context("Falha ao criar o superadmin inicial")?;
    }

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::services::{ai_gateway::AiGateway, chat_service::tests::StubGateway, course_matcher::CourseCatalog};

    // Pool preguiçoso: estas rotas respondem antes de tocar no banco.
    // `connect_lazy` precisa de um runtime, por isso todos são `tokio::test`.
    fn app_with(ai: Arc<dyn AiGateway>, settings: Settings) -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.database_url)
            .unwrap();
        let catalog = Arc::new(CourseCatalog::from_text("Contabilidad Avanzada\nMarketing Digital"));
        build_router(AppState::from_parts(settings, pool, ai, catalog, Arc::from("Eres un asesor.")))
    }

    fn app(ai: Arc<dyn AiGateway>) -> Router {
        app_with(ai, Settings::for_tests())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn lead(email: &str, phone: &str) -> Value {
        json!({
            "conversationId": "2f1f4c0e-6a51-4d53-9a43-1c2b3d4e5f60",
            "firstName": "Juan",
            "lastName": "Perez",
            "email": email,
            "phone": phone,
            "consent": true
        })
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let response = app(StubGateway::replying("hola"))
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn lead_capture_rejects_malformed_email() {
        let (status, body) =
            send(app(StubGateway::replying("")), post_json("/api/lead-capture", lead("juan.test.com", "3051234567")))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["email"][0], "Email inválido");
    }

    #[tokio::test]
    async fn lead_capture_rejects_short_phone() {
        let (status, body) =
            send(app(StubGateway::replying("")), post_json("/api/lead-capture", lead("juan@test.com", "123-45")))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["phone"][0], "Teléfono demasiado corto");
    }

    #[tokio::test]
    async fn lead_capture_requires_a_conversation() {
        let mut payload = lead("juan@test.com", "3051234567");
        payload["conversationId"] = Value::Null;
        let (status, body) = send(app(StubGateway::replying("")), post_json("/api/lead-capture", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "conversationId requerido");
    }

    #[tokio::test]
    async fn chat_returns_model_text() {
        let ai = StubGateway::replying("¡Hola! ¿En qué te ayudo?");
        let request = post_json(
            "/api/chat",
            json!({
                "history": [{"role": "model", "text": "Hola"}, {"role": "user", "text": "Buenas"}],
                "prompt": "Quiero un curso",
                "systemPrompt": "Eres un asesor de pruebas."
            }),
        );
        let (status, body) = send(app(ai.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "¡Hola! ¿En qué te ayudo?");

        let requests = ai.requests.lock().unwrap();
        assert_eq!(requests[0].history.len(), 2);
        assert_eq!(requests[0].system_prompt.as_deref(), Some("Eres un asesor de pruebas."));
    }

    #[tokio::test]
    async fn chat_without_prompt_is_bad_request() {
        let ai = StubGateway::replying("nunca");
        let (status, body) = send(app(ai.clone()), post_json("/api/chat", json!({ "history": [] }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Falta el \"prompt\" en la solicitud");
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn chat_failure_carries_details() {
        let (status, body) = send(
            app(StubGateway::failing("quota exceeded")),
            post_json("/api/chat", json!({ "prompt": "hola" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"], "quota exceeded");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn summary_needs_messages() {
        let (status, body) =
            send(app(StubGateway::replying("")), post_json("/api/summarize-conversation", json!({ "messages": [] })))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Faltan mensajes para resumir.");
    }

    #[tokio::test]
    async fn summary_returns_structured_fields() {
        let ai = StubGateway::replying(
            "Contexto: Consulta inicial\nNecesidad: Contabilidad\nCursos: Contabilidad Avanzada\nAcción: Enviar precio",
        );
        let request = post_json(
            "/api/summarize-conversation",
            json!({ "messages": [{"role": "user", "text": "Quiero contabilidad"}] }),
        );
        let (status, body) = send(app(ai.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cursos"], "Contabilidad Avanzada");
        assert_eq!(body["accion"], "Enviar precio");
        assert!(ai.requests.lock().unwrap()[0].prompt.ends_with("Cliente: Quiero contabilidad"));
    }

    #[tokio::test]
    async fn course_matcher_answers_without_ai() {
        let ai = StubGateway::replying("nunca");
        let (status, body) = send(
            app(ai.clone()),
            post_json("/api/cursos", json!({ "message": "quiero saber de contabilidad" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_str().unwrap().contains("Contabilidad Avanzada"));
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn admin_routes_require_a_session() {
        for uri in ["/api/admin/users", "/api/admin/conversations", "/api/admin/metrics", "/api/users/me"] {
            let (status, _) =
                send(app(StubGateway::replying("")), Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn forged_tokens_are_rejected_in_english_when_asked() {
        let request = Request::get("/api/admin/metrics")
            .header(header::AUTHORIZATION, "Bearer not.a.jwt")
            .header(header::ACCEPT_LANGUAGE, "en-US")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(StubGateway::replying("")), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or missing authentication token.");
    }

    #[tokio::test]
    async fn dev_routes_are_closed_in_production() {
        let mut settings = Settings::for_tests();
        settings.production = true;
        let request = post_json(
            "/api/dev/password-reset-link",
            json!({ "email": "operador@studyx.com", "devKey": "dev-key" }),
        );
        let (status, body) = send(app_with(StubGateway::replying(""), settings), request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "No disponible en producción.");
    }

    #[tokio::test]
    async fn dev_routes_need_the_right_key() {
        let request = post_json("/api/dev/set-password", json!({ "email": "x@studyx.com", "devKey": "wrong" }));
        let (status, _) = send(app(StubGateway::replying("")), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
