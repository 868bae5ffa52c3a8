// Calendar integration components, leaves first
pub mod token_cache;
pub mod authorization;
pub mod google_calendar;
pub mod notifier;
pub mod integration;

pub use authorization::AuthorizationClient;
pub use google_calendar::CalendarClient;
pub use integration::{CalendarAction, CalendarIntegration};
pub use token_cache::TokenCache;
