pub mod board;
pub mod card;
pub mod config;
pub mod layout;
pub mod project;
pub mod snapshot;
pub mod time;

pub use board::*;
pub use card::*;
pub use config::*;
pub use layout::*;
pub use project::*;
pub use snapshot::*;
pub use time::*;
