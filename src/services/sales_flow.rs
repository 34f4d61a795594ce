// src/services/sales_flow.rs

//! Roteiro de coleta de dados do chat de vendas.
//!
//! `sondear -> recopilar_nombre -> recopilar_email -> recopilar_phone ->
//! recopilar_estado -> verificar_datos -> esperando_pago -> finalizado`
//!
//! Tudo aqui é síncrono e sem I/O: o serviço de chat carrega o estado da
//! conversa, chama [`advance`] e decide o que persistir.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    common::text::{normalize, words},
    models::conversation::{ConversationStatus, CustomerData, SalesStage},
};

/// Acima disso a mensagem é tratada como conversa, não como resposta ao campo.
const MAX_FIELD_CHARS: usize = 60;
const MAX_FIELD_WORDS: usize = 9;

static PURCHASE_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(inscrib\w*|matricul\w*|comprar|compra|suscrib\w*|pagar|contratar)\b").unwrap()
});

// Só interrogativos: sobrenomes como "Cuesta" precisam passar na coleta
static INTERROGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(que|como|cuando|donde|cual|cuales|cuanto|cuanta|cuantos|cuantas|quien|por que|porque)\b")
        .unwrap()
});

// Dúvidas sobre o plano enquanto o pagamento está pendente
static PRICING_TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(precio|costo|cuesta|duracion|tarjeta|reembolso)\b").unwrap());

static NAME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(me llamo|mi nombre es|soy)\s+").unwrap());

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").unwrap());

// Telefone dos EUA: 10 dígitos, com ou sem +1 e separadores
static US_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+?1[\s.-]?)?\(?[2-9]\d{2}\)?[\s.-]?\d{3}[\s.-]?\d{4}$").unwrap()
});

static PAYMENT_CONFIRMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(ya pague|listo|pago realizado|ya realice el pago|ya hice el pago)\b").unwrap()
});

const NEGATIVE_WORDS: [&str; 4] = ["no", "incorrecto", "incorrectos", "mal"];

// "todavia no he pagado", "aun no estoy listo": nada de fatura
const PAYMENT_NEGATIONS: [&str; 3] = ["no", "todavia", "falta"];

/// Estado mínimo que o roteiro lê e altera.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSession {
    pub stage: SalesStage,
    pub status: ConversationStatus,
    pub customer: CustomerData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// Resposta roteirizada; a IA não é chamada.
    Reply(String),
    /// O roteiro não responde. Segue para o matcher de cursos e depois para a IA.
    Delegate,
    /// Pagamento confirmado: mostrar a fatura.
    PaymentConfirmed(String),
}

pub fn advance(session: &mut FlowSession, input: &str) -> FlowOutcome {
    let input = input.trim();

    match session.stage {
        SalesStage::Sondear => {
            if PURCHASE_INTENT.is_match(&normalize(input)) {
                session.stage = SalesStage::RecopilarNombre;
                FlowOutcome::Reply(
                    "¡Excelente decisión! Para completar tu inscripción necesito algunos datos. ¿Cuál es tu nombre completo?"
                        .into(),
                )
            } else {
                FlowOutcome::Delegate
            }
        }

        SalesStage::RecopilarNombre
        | SalesStage::RecopilarEmail
        | SalesStage::RecopilarPhone
        | SalesStage::RecopilarEstado => {
            if is_deviation(input) {
                return FlowOutcome::Delegate;
            }
            collect_field(session, input)
        }

        SalesStage::VerificarDatos => {
            let answer = words(input);
            if answer.iter().any(|w| NEGATIVE_WORDS.contains(&w.as_str())) {
                session.customer.nombre = None;
                session.customer.email = None;
                session.customer.phone = None;
                session.customer.estado = None;
                session.stage = SalesStage::RecopilarNombre;
                return FlowOutcome::Reply(
                    "Sin problema, empecemos de nuevo. ¿Cuál es tu nombre completo?".into(),
                );
            }

            session.stage = SalesStage::EsperandoPago;
            session.status = ConversationStatus::Cualificado;
            FlowOutcome::Reply(
                "¡Perfecto, tus datos están confirmados! El valor de la Suscripción Mensual es $25.00. \
                 Completa el pago y escríbeme \"ya pagué\" para emitir tu factura."
                    .into(),
            )
        }

        SalesStage::EsperandoPago => {
            let normalized = normalize(input);
            if has_question_mark(input) {
                return FlowOutcome::Delegate;
            }
            let negated = words(input).iter().any(|w| PAYMENT_NEGATIONS.contains(&w.as_str()));
            if !negated && PAYMENT_CONFIRMED.is_match(&normalized) {
                session.stage = SalesStage::Finalizado;
                session.status = ConversationStatus::Cerrado;
                return FlowOutcome::PaymentConfirmed(
                    "¡Pago recibido! Aquí tienes tu factura. ¡Gracias por tu confianza en Studyx!".into(),
                );
            }
            if INTERROGATIVE.is_match(&normalized) || PRICING_TOPIC.is_match(&normalized) {
                return FlowOutcome::Delegate;
            }
            FlowOutcome::Reply(
                "Cuando completes el pago, escríbeme \"ya pagué\" y te enviaré tu factura.".into(),
            )
        }

        SalesStage::Finalizado => FlowOutcome::Delegate,
    }
}

/// Pergunta ou desvio de assunto no meio da coleta.
pub fn is_deviation(input: &str) -> bool {
    if has_question_mark(input) {
        return true;
    }
    if input.chars().count() > MAX_FIELD_CHARS || input.split_whitespace().count() >= MAX_FIELD_WORDS {
        return true;
    }
    INTERROGATIVE.is_match(&normalize(input))
}

fn has_question_mark(input: &str) -> bool {
    input.contains('?') || input.contains('¿')
}

fn collect_field(session: &mut FlowSession, input: &str) -> FlowOutcome {
    match session.stage {
        SalesStage::RecopilarNombre => {
            let name = NAME_PREFIX.replace(input, "").trim().to_string();
            if !is_valid_name(&name) {
                return FlowOutcome::Reply(
                    "No logré entender tu nombre. ¿Podrías escribir tu nombre completo?".into(),
                );
            }
            let reply = format!("Gracias, {}. ¿Cuál es tu correo electrónico?", name);
            session.customer.nombre = Some(name);
            session.stage = SalesStage::RecopilarEmail;
            if session.status == ConversationStatus::Iniciado {
                session.status = ConversationStatus::Potencial;
            }
            FlowOutcome::Reply(reply)
        }
        SalesStage::RecopilarEmail => {
            if !EMAIL.is_match(input) {
                return FlowOutcome::Reply(
                    "Ese correo no parece válido. Escríbelo de nuevo, por ejemplo nombre@correo.com".into(),
                );
            }
            session.customer.email = Some(input.to_lowercase());
            session.stage = SalesStage::RecopilarPhone;
            FlowOutcome::Reply("Perfecto. ¿Cuál es tu número de teléfono?".into())
        }
        SalesStage::RecopilarPhone => {
            if !US_PHONE.is_match(input) {
                return FlowOutcome::Reply(
                    "Ese número no parece válido. Escribe un teléfono de 10 dígitos, por ejemplo 305 123 4567".into(),
                );
            }
            session.customer.phone = Some(input.to_string());
            session.stage = SalesStage::RecopilarEstado;
            FlowOutcome::Reply("Gracias. ¿En qué estado vives?".into())
        }
        SalesStage::RecopilarEstado => {
            if !is_valid_name(input) {
                return FlowOutcome::Reply("¿Podrías indicarme el estado donde vives?".into());
            }
            session.customer.estado = Some(input.to_string());
            session.stage = SalesStage::VerificarDatos;
            FlowOutcome::Reply(verification_summary(&session.customer))
        }
        _ => FlowOutcome::Delegate,
    }
}

// Pelo menos duas letras e nada de dígitos
fn is_valid_name(text: &str) -> bool {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 2
        && text
            .chars()
            .all(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '\'' | '-' | '.'))
}

fn verification_summary(customer: &CustomerData) -> String {
    format!(
        "Por favor confirma tus datos:\n- Nombre: {}\n- Email: {}\n- Teléfono: {}\n- Estado: {}\n¿Son correctos?",
        customer.nombre.as_deref().unwrap_or_default(),
        customer.email.as_deref().unwrap_or_default(),
        customer.phone.as_deref().unwrap_or_default(),
        customer.estado.as_deref().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(stage: SalesStage) -> FlowSession {
        FlowSession {
            stage,
            status: ConversationStatus::Iniciado,
            customer: CustomerData::default(),
        }
    }

    #[test]
    fn collects_all_fields_up_to_verification() {
        let mut session = session_at(SalesStage::RecopilarNombre);

        for input in ["Juan Perez", "juan@test.com", "3051234567", "Florida"] {
            let outcome = advance(&mut session, input);
            assert!(matches!(outcome, FlowOutcome::Reply(_)), "input {input:?} gave {outcome:?}");
        }

        assert_eq!(session.stage, SalesStage::VerificarDatos);
        assert_eq!(session.status, ConversationStatus::Potencial);
        assert_eq!(
            session.customer,
            CustomerData {
                nombre: Some("Juan Perez".into()),
                email: Some("juan@test.com".into()),
                phone: Some("3051234567".into()),
                estado: Some("Florida".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn purchase_intent_starts_collection() {
        let mut session = session_at(SalesStage::Sondear);
        assert_eq!(advance(&mut session, "Hola, buenas tardes"), FlowOutcome::Delegate);
        assert_eq!(session.stage, SalesStage::Sondear);

        let outcome = advance(&mut session, "Quiero inscribirme al curso");
        assert!(matches!(outcome, FlowOutcome::Reply(_)));
        assert_eq!(session.stage, SalesStage::RecopilarNombre);
    }

    #[test]
    fn questions_during_collection_are_delegated_without_advancing() {
        let mut session = session_at(SalesStage::RecopilarEmail);
        for input in [
            "¿para qué necesitan mi correo?",
            "cuanto cuesta el curso",
            "antes de darte mi correo quisiera saber un poco mas sobre la plataforma",
        ] {
            assert_eq!(advance(&mut session, input), FlowOutcome::Delegate);
            assert_eq!(session.stage, SalesStage::RecopilarEmail);
        }
    }

    #[test]
    fn invalid_answers_reprompt_in_place() {
        let mut session = session_at(SalesStage::RecopilarEmail);
        assert!(matches!(advance(&mut session, "juan arroba test"), FlowOutcome::Reply(_)));
        assert_eq!(session.stage, SalesStage::RecopilarEmail);
        assert!(session.customer.email.is_none());

        let mut session = session_at(SalesStage::RecopilarPhone);
        assert!(matches!(advance(&mut session, "12345"), FlowOutcome::Reply(_)));
        assert_eq!(session.stage, SalesStage::RecopilarPhone);

        assert!(matches!(advance(&mut session, "(305) 123-4567"), FlowOutcome::Reply(_)));
        assert_eq!(session.stage, SalesStage::RecopilarEstado);
    }

    #[test]
    fn name_prefix_is_stripped() {
        let mut session = session_at(SalesStage::RecopilarNombre);
        advance(&mut session, "me llamo Ana María");
        assert_eq!(session.customer.nombre.as_deref(), Some("Ana María"));
    }

    #[test]
    fn rejecting_verification_restarts_collection() {
        let mut session = session_at(SalesStage::RecopilarNombre);
        for input in ["Juan Perez", "juan@test.com", "3051234567", "Florida"] {
            advance(&mut session, input);
        }

        advance(&mut session, "No, el correo está mal");
        assert_eq!(session.stage, SalesStage::RecopilarNombre);
        assert!(session.customer.nombre.is_none());
        assert!(session.customer.email.is_none());
        assert!(session.customer.phone.is_none());
        assert!(session.customer.estado.is_none());
    }

    #[test]
    fn confirmation_then_payment_closes_the_sale() {
        let mut session = session_at(SalesStage::VerificarDatos);
        advance(&mut session, "Sí, todo correcto");
        assert_eq!(session.stage, SalesStage::EsperandoPago);
        assert_eq!(session.status, ConversationStatus::Cualificado);

        assert!(matches!(advance(&mut session, "ok"), FlowOutcome::Reply(_)));
        assert_eq!(session.stage, SalesStage::EsperandoPago);

        assert_eq!(advance(&mut session, "¿aceptan tarjeta?"), FlowOutcome::Delegate);

        let outcome = advance(&mut session, "Ya pagué");
        assert!(matches!(outcome, FlowOutcome::PaymentConfirmed(_)));
        assert_eq!(session.stage, SalesStage::Finalizado);
        assert_eq!(session.status, ConversationStatus::Cerrado);

        assert_eq!(advance(&mut session, "gracias"), FlowOutcome::Delegate);
    }

    #[test]
    fn listo_also_confirms_payment() {
        let mut session = session_at(SalesStage::EsperandoPago);
        assert!(matches!(advance(&mut session, "listo"), FlowOutcome::PaymentConfirmed(_)));
    }

    #[test]
    fn negated_payment_keeps_waiting() {
        for input in ["todavía no he pagado", "no pagué aún", "aún no estoy listo", "me falta pagar, listo mañana"] {
            let mut session = FlowSession {
                status: ConversationStatus::Cualificado,
                ..session_at(SalesStage::EsperandoPago)
            };
            let outcome = advance(&mut session, input);
            assert!(matches!(outcome, FlowOutcome::Reply(_)), "input {input:?} gave {outcome:?}");
            assert_eq!(session.stage, SalesStage::EsperandoPago);
            assert_eq!(session.status, ConversationStatus::Cualificado);
        }
    }

    #[test]
    fn bare_pagado_is_not_a_confirmation() {
        let mut session = session_at(SalesStage::EsperandoPago);
        assert!(matches!(advance(&mut session, "pagado"), FlowOutcome::Reply(_)));
        assert_eq!(session.stage, SalesStage::EsperandoPago);
    }

    #[test]
    fn pricing_words_in_a_name_are_not_a_deviation() {
        let mut session = session_at(SalesStage::RecopilarNombre);
        assert!(!is_deviation("María Cuesta"));
        assert!(matches!(advance(&mut session, "María Cuesta"), FlowOutcome::Reply(_)));
        assert_eq!(session.stage, SalesStage::RecopilarEmail);
        assert_eq!(session.customer.nombre.as_deref(), Some("María Cuesta"));
    }

    #[test]
    fn pricing_questions_while_waiting_go_to_the_ai() {
        let mut session = session_at(SalesStage::EsperandoPago);
        assert_eq!(advance(&mut session, "aceptan tarjeta de debito"), FlowOutcome::Delegate);
        assert_eq!(session.stage, SalesStage::EsperandoPago);
    }
}
