pub mod backup;
pub mod card_ops;
pub mod layout;
pub mod progress;
pub mod project_ops;
pub mod search;
pub mod views;
