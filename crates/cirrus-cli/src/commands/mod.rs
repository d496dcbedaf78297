pub mod ask;
pub mod chat;
pub mod guides;
pub mod history;
pub mod status;
pub mod utils;
