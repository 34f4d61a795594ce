// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Chat ---
        handlers::chat::chat,
        handlers::chat::start_conversation,
        handlers::chat::send_message,
        handlers::chat::summarize_conversation,

        // --- Leads / Cursos / Fatura ---
        handlers::leads::capture_lead,
        handlers::courses::match_course,
        handlers::courses::list_sheet_courses,
        handlers::invoices::get_invoice,
        handlers::invoices::get_invoice_pdf,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::reset_password,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user_role,
        handlers::users::toggle_user_suspension,

        // --- Admin ---
        handlers::admin_conversations::list_conversations,
        handlers::admin_conversations::export_conversations,
        handlers::admin_conversations::get_conversation,
        handlers::dashboard::get_metrics,

        // --- Dev ---
        handlers::dev::password_reset_link,
        handlers::dev::set_password,
    ),
    components(
        schemas(
            // --- Conversas ---
            models::conversation::MessageRole,
            models::conversation::Message,
            models::conversation::ConversationStatus,
            models::conversation::SalesStage,
            models::conversation::CustomerData,
            models::conversation::LeadCaptureMeta,
            models::conversation::Conversation,
            models::conversation::ConversationListItem,
            models::conversation::TurnResult,
            services::summary_service::ConversationSummary,

            // --- Fatura ---
            models::invoice::Invoice,
            models::invoice::InvoiceLine,

            // --- Dashboard ---
            models::dashboard::DashboardMetrics,
            models::dashboard::StatusCount,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::AppUser,
            models::auth::LoginUserPayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthResponse,

            // --- Payloads ---
            handlers::chat::ChatPayload,
            handlers::chat::ChatResponse,
            handlers::chat::SendMessagePayload,
            handlers::chat::SummarizePayload,
            handlers::leads::LeadCapturePayload,
            handlers::courses::CourseQueryPayload,
            handlers::courses::CourseQueryResponse,
            handlers::courses::CourseSheetResponse,
            handlers::users::CreateUserPayload,
            handlers::users::UpdateRolePayload,
            handlers::users::SuspensionPayload,
            handlers::dev::ResetLinkPayload,
            handlers::dev::ResetLinkResponse,
            handlers::dev::SetPasswordPayload,
            handlers::dev::SetPasswordResponse,
        )
    ),
    tags(
        (name = "Chat", description = "Widget de chat, turnos e resumo"),
        (name = "Leads", description = "Formulário de captura de lead"),
        (name = "Courses", description = "Catálogo de cursos"),
        (name = "Invoice", description = "Fatura da assinatura"),
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Equipe e hierarquia de papéis"),
        (name = "Admin", description = "Painel de conversas"),
        (name = "Dashboard", description = "Indicadores do funil"),
        (name = "Dev", description = "Helpers fora de produção")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
