//! ADR Reporting Portal: core library.
//! Records, validation, the in-memory store, the deadline calendar and the chat assistants.

pub mod ai_bridge;
pub mod assistant;
pub mod calendar;
pub mod config;
pub mod error;
pub mod intent_router;
pub mod models;
pub mod reference;
pub mod statistics;
pub mod store;
pub mod validation;

pub use ai_bridge::{CompletionService, OpenRouterCompletion};
pub use assistant::{AiAssistant, AiReply, CONNECTION_ERROR};
pub use calendar::{seed_deadlines, DeadlineCalendar};
pub use config::{AiSettings, PortalConfig, SeedConfig};
pub use error::{CompletionError, ConfigError, FieldError, StoreError, ValidationErrors};
pub use intent_router::{ChatReply, ChatRouter};
pub use statistics::{drug_statistics, DrugStatistics};
pub use store::PortalStore;
pub use validation::Validate;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
