pub mod config_io;
pub mod local_cache;
pub mod lock;
pub mod remote;
pub mod session_io;
