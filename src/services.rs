pub mod ai_gateway;
pub mod auth;
pub mod chat_service;
pub mod conversation_service;
pub mod course_matcher;
pub mod course_sheet;
pub mod dashboard_service;
pub mod invoice_service;
pub mod lead_service;
pub mod role_guard;
pub mod sales_flow;
pub mod summary_service;
pub mod user_service;
