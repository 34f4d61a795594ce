// src/handlers/leads.rs

use std::sync::LazyLock;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        text::digits,
    },
    config::AppState,
    middleware::i18n::Locale,
    services::lead_service::NewLead,
};

const MIN_PHONE_DIGITS: usize = 7;

// Validação simples: algo@algo.algo
static LOOSE_EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".+@.+\..+").unwrap());

fn validate_phone_digits(phone: &str) -> Result<(), ValidationError> {
    if digits(phone).len() < MIN_PHONE_DIGITS {
        return Err(ValidationError::new("phone_short"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadCapturePayload {
    pub conversation_id: Option<String>,

    #[schema(example = "Juan")]
    pub first_name: Option<String>,

    #[schema(example = "Perez")]
    pub last_name: Option<String>,

    #[validate(regex(path = *LOOSE_EMAIL, message = "lead.email_invalid"))]
    #[schema(example = "juan@test.com")]
    pub email: Option<String>,

    #[validate(custom(function = "validate_phone_digits", message = "lead.phone_short"))]
    #[schema(example = "(305) 123-4567")]
    pub phone: Option<String>,

    #[serde(default)]
    pub consent: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl LeadCapturePayload {
    /// Ordem das checagens: conversa, campos obrigatórios, formato.
    pub fn into_lead(self) -> Result<(Uuid, NewLead), AppError> {
        let raw_id = present(&self.conversation_id).ok_or(AppError::InvalidArgument("lead.conversation_required"))?;
        let conversation_id =
            Uuid::parse_str(raw_id).map_err(|_| AppError::InvalidArgument("lead.conversation_invalid"))?;

        let (Some(first_name), Some(email), Some(phone)) =
            (present(&self.first_name), present(&self.email), present(&self.phone))
        else {
            return Err(AppError::InvalidArgument("lead.required"));
        };

        self.validate()?;

        let lead = NewLead {
            first_name: first_name.to_string(),
            last_name: self.last_name.clone(),
            email: email.to_string(),
            phone: phone.to_string(),
            consent: self.consent,
        };
        Ok((conversation_id, lead))
    }
}

// POST /api/lead-capture
#[utoipa::path(
    post,
    path = "/api/lead-capture",
    tag = "Leads",
    request_body = LeadCapturePayload,
    responses(
        (status = 200, description = "Lead gravado; conversa passa a Potencial"),
        (status = 400, description = "Dados ausentes, e-mail inválido ou telefone curto")
    )
)]
pub async fn capture_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LeadCapturePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (conversation_id, lead) = payload
        .into_lead()
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .lead_service
        .capture(conversation_id, lead)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: &str, phone: &str) -> LeadCapturePayload {
        LeadCapturePayload {
            conversation_id: Some(Uuid::new_v4().to_string()),
            first_name: Some("Juan".into()),
            last_name: Some("Perez".into()),
            email: Some(email.into()),
            phone: Some(phone.into()),
            consent: true,
        }
    }

    #[test]
    fn well_formed_lead_passes() {
        let (_, lead) = payload("juan@test.com", "(305) 123-4567").into_lead().unwrap();
        assert_eq!(lead.first_name, "Juan");
        assert!(lead.consent);
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["juan.test.com", "juan@test", "@"] {
            let err = payload(email, "3051234567").into_lead().unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)), "{email}");
        }
    }

    #[test]
    fn phone_needs_seven_digits() {
        let err = payload("juan@test.com", "12-34-56").into_lead().unwrap_err();
        let AppError::ValidationError(errors) = err else { panic!("expected validation error") };
        assert!(errors.field_errors().contains_key("phone"));

        assert!(payload("juan@test.com", "123-4567").into_lead().is_ok());
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let mut p = payload("juan@test.com", "3051234567");
        p.conversation_id = None;
        assert!(matches!(p.into_lead(), Err(AppError::InvalidArgument("lead.conversation_required"))));

        let mut p = payload("juan@test.com", "3051234567");
        p.conversation_id = Some("not-a-uuid".into());
        assert!(matches!(p.into_lead(), Err(AppError::InvalidArgument("lead.conversation_invalid"))));

        let mut p = payload("juan@test.com", "3051234567");
        p.first_name = Some("  ".into());
        assert!(matches!(p.into_lead(), Err(AppError::InvalidArgument("lead.required"))));
    }
}
