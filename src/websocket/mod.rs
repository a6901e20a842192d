pub mod handler;
pub mod session;
pub mod msg_get_document_handler;
pub mod msg_join_handler;
pub mod msg_switch_handler;
pub mod msg_changes_handler;
pub mod msg_save_handler;
