pub mod app;
pub mod config;
pub mod events;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use app::App;
pub use config::{AppConfig, ConfigManager};
pub use events::{Event, EventBroadcaster};
pub use logging::{LogConfig, LogGuard};
pub use session::FileTokenStore;
