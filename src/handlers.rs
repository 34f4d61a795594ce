pub mod admin_conversations;
pub mod auth;
pub mod chat;
pub mod courses;
pub mod dashboard;
pub mod dev;
pub mod invoices;
pub mod leads;
pub mod users;
