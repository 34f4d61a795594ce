// src/services/chat_service.rs

use std::sync::{Arc, LazyLock};

use rand::seq::SliceRandom;
use regex::Regex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ConversationStore, TurnUpdate},
    models::conversation::{Conversation, LeadCaptureMeta, Message, TurnResult},
    services::{
        ai_gateway::{AiGateway, GenerateRequest},
        course_matcher::{self, CourseCatalog},
        sales_flow::{self, FlowOutcome, FlowSession},
    },
};

pub const ADVISOR_NAMES: [&str; 6] = ["Sofía", "Mateo", "Valentina", "Santiago", "Camila", "Sebastián"];

pub const AI_FAILURE_REPLY: &str = "Tuve un problema para conectarme. Intenta de nuevo en un momento.";
pub const AI_FAILURE_NOTICE: &str = "Lo siento, no pude procesar tu solicitud en este momento.";

// Frases com que o modelo pede os dados de contato: o front mostra o formulário
static LEAD_REQUEST: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)completa el formulario").unwrap(),
        Regex::new(r"(?i)tus datos de contacto").unwrap(),
    ]
});

pub fn greeting(advisor_name: &str) -> String {
    format!(
        "Hola! Mi nombre es {}, del equipo de asesoramiento de Studyx. ¿Cómo puedo ayudarte?",
        advisor_name
    )
}

pub fn asks_for_lead(reply: &str) -> bool {
    LEAD_REQUEST.iter().any(|re| re.is_match(reply))
}

/// Resposta calculada para um turno, antes de persistir.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub show_invoice: bool,
    pub error_message: Option<String>,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    ai: Arc<dyn AiGateway>,
    catalog: Arc<CourseCatalog>,
    system_prompt: Arc<str>,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        ai: Arc<dyn AiGateway>,
        catalog: Arc<CourseCatalog>,
        system_prompt: Arc<str>,
    ) -> Self {
        Self { store, ai, catalog, system_prompt }
    }

    /// Abre uma sessão com um assessor sorteado e a saudação inicial.
    pub async fn start_session(&self) -> Result<Conversation, AppError> {
        let advisor = ADVISOR_NAMES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(ADVISOR_NAMES[0]);

        let conversation = self
            .store
            .create(advisor, &[Message::model(greeting(advisor))])
            .await?;

        tracing::info!("💬 Conversa {} iniciada com {}", conversation.id, advisor);
        Ok(conversation)
    }

    /// Um turno completo: mensagem do cliente -> roteiro / cursos / IA -> resposta.
    ///
    /// Falhas ao gravar são só registradas no log: o cliente recebe a resposta
    /// mesmo que o banco fique para trás.
    pub async fn handle_turn(&self, conversation_id: Uuid, text: &str) -> Result<TurnResult, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidArgument("chat.empty_message"));
        }

        let conversation = self
            .store
            .find_by_id(conversation_id)
            .await?
            .ok_or(AppError::ConversationNotFound)?;

        let mut lead = conversation.lead_meta();
        let mut session = FlowSession {
            stage: conversation.sales_stage,
            status: conversation.status,
            customer: conversation.customer(),
        };
        let before = session.clone();
        let was_requested = lead.requested;
        let mut messages = conversation.messages.0;

        messages.push(Message::user(text));
        if let Err(e) = self.store.update_messages(conversation_id, &messages).await {
            tracing::error!("Erro ao gravar a mensagem do cliente em {}: {}", conversation_id, e);
        }

        let history = &messages[..messages.len() - 1];
        let reply = self.compose_reply(&mut session, &mut lead, history, text).await;

        let reply_message = Message::model(reply.text.clone());
        messages.push(reply_message.clone());

        let update = TurnUpdate {
            messages: &messages,
            stage: session.stage,
            status: (session.status != before.status).then_some(session.status),
            customer: (session.customer != before.customer).then_some(&session.customer),
            lead_requested: lead.requested && !was_requested,
        };
        if let Err(e) = self.store.save_turn(conversation_id, update).await {
            tracing::error!("Erro ao gravar o turno da conversa {}: {}", conversation_id, e);
        }

        Ok(TurnResult {
            conversation_id,
            reply: reply_message,
            sales_stage: session.stage,
            status: session.status,
            customer_data: session.customer,
            lead_capture_requested: lead.requested,
            show_invoice: reply.show_invoice,
            error_message: reply.error_message,
        })
    }

    /// Decide a resposta sem tocar no banco. Ordem: roteiro de vendas, catálogo, IA.
    pub async fn compose_reply(
        &self,
        session: &mut FlowSession,
        lead: &mut LeadCaptureMeta,
        history: &[Message],
        text: &str,
    ) -> TurnReply {
        match sales_flow::advance(session, text) {
            FlowOutcome::Reply(text) => {
                return TurnReply { text, show_invoice: false, error_message: None };
            }
            FlowOutcome::PaymentConfirmed(text) => {
                return TurnReply { text, show_invoice: true, error_message: None };
            }
            FlowOutcome::Delegate => {}
        }

        if let Some(text) = course_matcher::answer(&self.catalog, text).reply() {
            return TurnReply { text, show_invoice: false, error_message: None };
        }

        let request = GenerateRequest {
            system_prompt: Some(self.stage_prompt(session)),
            history: history.to_vec(),
            prompt: text.to_string(),
        };

        match self.ai.generate(request).await {
            Ok(text) => {
                if asks_for_lead(&text) {
                    lead.requested = true;
                }
                TurnReply { text, show_invoice: false, error_message: None }
            }
            Err(e) => {
                tracing::error!("Erro ao obter resposta da IA: {}", e);
                TurnReply {
                    text: AI_FAILURE_REPLY.to_string(),
                    show_invoice: false,
                    error_message: Some(AI_FAILURE_NOTICE.to_string()),
                }
            }
        }
    }

    /// Chamada avulsa ao modelo (rota `/api/chat`). Erros sobem para o cliente.
    pub async fn chat_once(
        &self,
        history: Vec<Message>,
        prompt: &str,
        system_prompt: Option<String>,
    ) -> Result<String, AppError> {
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidArgument("chat.prompt_required"));
        }

        let system_prompt = system_prompt
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.system_prompt.to_string());

        self.ai
            .generate(GenerateRequest {
                system_prompt: Some(system_prompt),
                history,
                prompt: prompt.to_string(),
            })
            .await
    }

    // Durante a coleta, o modelo responde a dúvida e devolve o cliente ao roteiro
    fn stage_prompt(&self, session: &FlowSession) -> String {
        if session.stage.is_collecting() {
            format!(
                "{}\n\nEtapa actual de la venta: {}. Responde la duda del cliente en pocas líneas \
                 y luego retoma amablemente la recolección de sus datos.",
                self.system_prompt,
                session.stage.as_str()
            )
        } else {
            self.system_prompt.to_string()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use sqlx::types::Json;

    use crate::models::conversation::{ConversationStatus, CustomerData, SalesStage};

    /// Gateway de teste: devolve uma resposta fixa (ou erro) e guarda os pedidos.
    pub(crate) struct StubGateway {
        pub reply: Result<String, String>,
        pub requests: Mutex<Vec<GenerateRequest>>,
    }

    impl StubGateway {
        pub(crate) fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(text.into()), requests: Mutex::new(Vec::new()) })
        }

        pub(crate) fn failing(detail: &str) -> Arc<Self> {
            Arc::new(Self { reply: Err(detail.into()), requests: Mutex::new(Vec::new()) })
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AiGateway for StubGateway {
        async fn generate(&self, request: GenerateRequest) -> Result<String, AppError> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone().map_err(AppError::AiGateway)
        }
    }

    // Turno gravado pelo store em memória, sem os empréstimos do `TurnUpdate`
    #[derive(Debug, Clone)]
    struct SavedTurn {
        messages: Vec<Message>,
        stage: SalesStage,
        status: Option<ConversationStatus>,
        customer: Option<CustomerData>,
        lead_requested: bool,
    }

    /// Store em memória com uma única conversa. `failing_writes` faz as gravações falharem.
    struct MemoryStore {
        conversation: Option<Conversation>,
        failing_writes: bool,
        saved: Mutex<Vec<SavedTurn>>,
    }

    impl MemoryStore {
        fn with(conversation: Conversation) -> Arc<Self> {
            Arc::new(Self { conversation: Some(conversation), failing_writes: false, saved: Mutex::new(Vec::new()) })
        }

        fn broken_writes(conversation: Conversation) -> Arc<Self> {
            Arc::new(Self { conversation: Some(conversation), failing_writes: true, saved: Mutex::new(Vec::new()) })
        }

        fn empty() -> Arc<Self> {
            Arc::new(Self { conversation: None, failing_writes: false, saved: Mutex::new(Vec::new()) })
        }

        fn write_result(&self) -> Result<(), AppError> {
            if self.failing_writes {
                Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ConversationStore for MemoryStore {
        async fn create(&self, advisor_name: &str, messages: &[Message]) -> Result<Conversation, AppError> {
            self.write_result()?;
            let mut conversation = conversation_at(SalesStage::Sondear, CustomerData::default());
            conversation.advisor_name = advisor_name.to_string();
            conversation.messages = Json(messages.to_vec());
            Ok(conversation)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, AppError> {
            Ok(self.conversation.clone().filter(|c| c.id == id))
        }

        async fn update_messages(&self, _id: Uuid, _messages: &[Message]) -> Result<(), AppError> {
            self.write_result()
        }

        async fn save_turn(&self, _id: Uuid, update: TurnUpdate<'_>) -> Result<(), AppError> {
            self.write_result()?;
            self.saved.lock().unwrap().push(SavedTurn {
                messages: update.messages.to_vec(),
                stage: update.stage,
                status: update.status,
                customer: update.customer.cloned(),
                lead_requested: update.lead_requested,
            });
            Ok(())
        }
    }

    fn conversation_at(stage: SalesStage, customer: CustomerData) -> Conversation {
        let now = Utc::now();
        Conversation {
            id: Uuid::new_v4(),
            messages: Json(vec![Message::model(greeting("Sofía"))]),
            status: ConversationStatus::Iniciado,
            advisor_name: "Sofía".into(),
            sales_stage: stage,
            customer_data: (!customer.is_empty()).then(|| Json(customer)),
            lead_capture: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(ai: Arc<StubGateway>) -> ChatService {
        service_with(MemoryStore::empty(), ai)
    }

    fn service_with(store: Arc<MemoryStore>, ai: Arc<StubGateway>) -> ChatService {
        ChatService::new(
            store,
            ai,
            Arc::new(CourseCatalog::from_text("Contabilidad Avanzada\nMarketing Digital")),
            Arc::from("Eres un asesor de Studyx."),
        )
    }

    fn fresh_session() -> FlowSession {
        FlowSession {
            stage: SalesStage::Sondear,
            status: ConversationStatus::Iniciado,
            customer: CustomerData::default(),
        }
    }

    #[test]
    fn greeting_names_the_advisor() {
        assert_eq!(
            greeting("Camila"),
            "Hola! Mi nombre es Camila, del equipo de asesoramiento de Studyx. ¿Cómo puedo ayudarte?"
        );
    }

    #[tokio::test]
    async fn course_listing_never_reaches_the_ai() {
        let ai = StubGateway::replying("no debería usarse");
        let service = service(ai.clone());

        let reply = service
            .compose_reply(&mut fresh_session(), &mut LeadCaptureMeta::default(), &[], "dame los cursos")
            .await;

        assert!(reply.text.starts_with("Estos son los cursos disponibles:"));
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn lead_phrases_in_ai_reply_request_the_form() {
        let ai = StubGateway::replying("Para ayudarte mejor, completa el formulario de abajo.");
        let service = service(ai.clone());
        let mut lead = LeadCaptureMeta::default();

        let history = vec![Message::model(greeting("Mateo"))];
        let reply = service
            .compose_reply(&mut fresh_session(), &mut lead, &history, "hola, necesito ayuda")
            .await;

        assert!(lead.requested);
        assert!(!lead.completed);
        assert_eq!(reply.error_message, None);
        assert_eq!(ai.calls(), 1);
    }

    #[tokio::test]
    async fn ai_failure_becomes_an_apology_turn() {
        let service = service(StubGateway::failing("timeout"));

        let reply = service
            .compose_reply(&mut fresh_session(), &mut LeadCaptureMeta::default(), &[], "hola")
            .await;

        assert_eq!(reply.text, AI_FAILURE_REPLY);
        assert_eq!(reply.error_message.as_deref(), Some(AI_FAILURE_NOTICE));
    }

    #[tokio::test]
    async fn questions_mid_collection_carry_the_stage_to_the_ai() {
        let ai = StubGateway::replying("Claro, el curso dura 3 meses. ¿Cuál es tu correo?");
        let service = service(ai.clone());
        let mut session = FlowSession { stage: SalesStage::RecopilarEmail, ..fresh_session() };

        service
            .compose_reply(&mut session, &mut LeadCaptureMeta::default(), &[], "¿cuánto dura?")
            .await;

        assert_eq!(session.stage, SalesStage::RecopilarEmail);
        let requests = ai.requests.lock().unwrap();
        let prompt = requests[0].system_prompt.as_deref().unwrap();
        assert!(prompt.contains("recopilar_email"));
    }

    #[tokio::test]
    async fn payment_confirmation_shows_the_invoice() {
        let service = service(StubGateway::replying("-"));
        let mut session = FlowSession { stage: SalesStage::EsperandoPago, ..fresh_session() };

        let reply = service
            .compose_reply(&mut session, &mut LeadCaptureMeta::default(), &[], "ya pagué")
            .await;

        assert!(reply.show_invoice);
        assert_eq!(session.stage, SalesStage::Finalizado);
    }

    #[tokio::test]
    async fn chat_once_requires_a_prompt() {
        let service = service(StubGateway::replying("hola"));
        let err = service.chat_once(vec![], "   ", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument("chat.prompt_required")));
    }

    #[tokio::test]
    async fn failed_writes_still_return_the_reply() {
        let conversation = conversation_at(SalesStage::Sondear, CustomerData::default());
        let id = conversation.id;
        let ai = StubGateway::replying("Con gusto te ayudo a elegir un curso.");
        let service = service_with(MemoryStore::broken_writes(conversation), ai.clone());

        let result = service.handle_turn(id, "hola, busco un curso de idiomas").await.unwrap();

        assert_eq!(result.conversation_id, id);
        assert_eq!(result.reply.text, "Con gusto te ayudo a elegir un curso.");
        assert_eq!(result.error_message, None);
        assert_eq!(ai.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let service = service(StubGateway::replying("-"));
        let err = service.handle_turn(Uuid::new_v4(), "hola").await.unwrap_err();
        assert!(matches!(err, AppError::ConversationNotFound));
    }

    #[tokio::test]
    async fn turn_without_flow_changes_leaves_form_data_alone() {
        let customer = CustomerData { first_name: Some("Ana".into()), ..Default::default() };
        let conversation = conversation_at(SalesStage::Sondear, customer);
        let id = conversation.id;
        let store = MemoryStore::with(conversation);
        let service = service_with(store.clone(), StubGateway::replying("Claro, cuéntame más."));

        service.handle_turn(id, "hola").await.unwrap();

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].messages.len(), 3);
        assert_eq!(saved[0].stage, SalesStage::Sondear);
        assert_eq!(saved[0].status, None);
        assert_eq!(saved[0].customer, None);
        assert!(!saved[0].lead_requested);
    }

    #[tokio::test]
    async fn collected_name_is_written_with_the_new_status() {
        let conversation = conversation_at(SalesStage::RecopilarNombre, CustomerData::default());
        let id = conversation.id;
        let store = MemoryStore::with(conversation);
        let ai = StubGateway::replying("-");
        let service = service_with(store.clone(), ai.clone());

        let result = service.handle_turn(id, "María Cuesta").await.unwrap();

        assert_eq!(result.sales_stage, SalesStage::RecopilarEmail);
        assert_eq!(ai.calls(), 0);
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved[0].status, Some(ConversationStatus::Potencial));
        assert_eq!(
            saved[0].customer.as_ref().and_then(|c| c.nombre.as_deref()),
            Some("María Cuesta")
        );
    }
}
