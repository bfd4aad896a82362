/// Owner check and operator-identity capture
pub mod auth;
/// Menu label → command mapping
pub mod commands;
/// Session controller endpoints
pub mod handlers;
/// Reply keyboards
pub mod keyboards;
/// Send helpers
pub mod messaging;
/// Onboarding-reply flood protection
pub mod onboarding_cache;
/// Wizard state
pub mod state;

pub use auth::AuthGuard;
pub use onboarding_cache::OnboardingCache;
