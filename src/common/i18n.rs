// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "es";

// Catálogo de mensagens por idioma. Chave desconhecida volta como a própria chave.
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

const ES: &[(&str, &str)] = &[
    ("validation.invalid", "Uno o más campos son inválidos."),
    ("internal", "Ocurrió un error inesperado."),
    ("config.missing", "Falta configuración en el servidor."),
    ("auth.invalid_credentials", "Email o contraseña inválidos."),
    ("auth.invalid_token", "Token de autenticación inválido o ausente."),
    ("auth.suspended", "Tu cuenta está suspendida."),
    ("auth.unauthenticated", "Debes estar autenticado."),
    ("auth.password_short", "La contraseña debe tener al menos 6 caracteres."),
    ("users.not_found", "Usuario no encontrado."),
    ("users.email_exists", "El correo electrónico ya está en uso por otra cuenta."),
    ("users.email_invalid", "El email proporcionado es inválido."),
    ("users.forbidden_create", "No tienes permiso para crear usuarios."),
    ("users.admin_only_operators", "Los administradores solo pueden crear operadores."),
    ("users.hierarchy", "No puedes modificar un usuario con un rol igual o superior al tuyo."),
    ("users.admin_cannot_assign", "Los administradores no pueden asignar el rol de admin o superadmin."),
    ("users.self_suspension", "No puedes suspenderte a ti mismo."),
    ("users.role_insufficient", "No tienes permiso para realizar esta acción."),
    ("dev.production", "No disponible en producción."),
    ("dev.unauthorized", "No autorizado."),
    ("dev.missing_target", "Falta uid o email."),
    ("dev.missing_email", "Falta email."),
    ("chat.prompt_required", "Falta el \"prompt\" en la solicitud"),
    ("chat.ai_failed", "No se pudo obtener una respuesta de la IA."),
    ("chat.empty_message", "El mensaje no puede estar vacío."),
    ("conversation.not_found", "Conversación no encontrada."),
    ("lead.conversation_required", "conversationId requerido"),
    ("lead.conversation_invalid", "conversationId inválido"),
    ("lead.required", "Nombre, email y teléfono son obligatorios"),
    ("lead.email_invalid", "Email inválido"),
    ("lead.phone_short", "Teléfono demasiado corto"),
    ("summary.no_messages", "Faltan mensajes para resumir."),
    ("courses.message_required", "Falta el mensaje"),
    ("courses.sheet_failed", "Error al consultar Google Sheets"),
    ("invoice.unavailable", "La factura solo está disponible después de confirmar el pago."),
    ("invoice.font_missing", "No se pudo generar el PDF de la factura."),
    ("pagination.cursor_invalid", "Cursor de paginación inválido."),
    ("filters.date_invalid", "Fecha inválida (use AAAA-MM-DD)."),
];

const EN: &[(&str, &str)] = &[
    ("validation.invalid", "One or more fields are invalid."),
    ("internal", "An unexpected error occurred."),
    ("config.missing", "Server configuration is missing."),
    ("auth.invalid_credentials", "Invalid email or password."),
    ("auth.invalid_token", "Invalid or missing authentication token."),
    ("auth.suspended", "Your account is suspended."),
    ("auth.unauthenticated", "You must be signed in."),
    ("auth.password_short", "Password must be at least 6 characters long."),
    ("users.not_found", "User not found."),
    ("users.email_exists", "This email is already used by another account."),
    ("users.email_invalid", "The provided email is invalid."),
    ("users.forbidden_create", "You are not allowed to create users."),
    ("users.admin_only_operators", "Administrators can only create operators."),
    ("users.hierarchy", "You cannot modify a user with a role equal to or higher than yours."),
    ("users.admin_cannot_assign", "Administrators cannot assign the admin or superadmin role."),
    ("users.self_suspension", "You cannot suspend yourself."),
    ("users.role_insufficient", "You are not allowed to perform this action."),
    ("dev.production", "Not available in production."),
    ("dev.unauthorized", "Not authorized."),
    ("dev.missing_target", "Missing uid or email."),
    ("dev.missing_email", "Missing email."),
    ("chat.prompt_required", "The \"prompt\" field is missing"),
    ("chat.ai_failed", "Could not get a response from the AI."),
    ("chat.empty_message", "The message cannot be empty."),
    ("conversation.not_found", "Conversation not found."),
    ("lead.conversation_required", "conversationId is required"),
    ("lead.conversation_invalid", "conversationId is invalid"),
    ("lead.required", "Name, email and phone are required"),
    ("lead.email_invalid", "Invalid email"),
    ("lead.phone_short", "Phone number too short"),
    ("summary.no_messages", "No messages to summarize."),
    ("courses.message_required", "Missing message"),
    ("courses.sheet_failed", "Error querying Google Sheets"),
    ("invoice.unavailable", "The invoice is only available after the payment is confirmed."),
    ("invoice.font_missing", "Could not render the invoice PDF."),
    ("pagination.cursor_invalid", "Invalid pagination cursor."),
    ("filters.date_invalid", "Invalid date (use YYYY-MM-DD)."),
];

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("es", ES.iter().copied().collect());
        catalogs.insert("en", EN.iter().copied().collect());
        Self { catalogs }
    }

    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
