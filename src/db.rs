pub mod user_repo;
pub use user_repo::UserRepository;
pub mod conversation_repo;
pub use conversation_repo::{ConversationFilter, ConversationRepository, ConversationStore, TurnUpdate};
