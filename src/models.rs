pub mod auth;
pub mod conversation;
pub mod dashboard;
pub mod invoice;
