//! Session validation and role authorization for axum routes.
//!
//! A [`SessionGate`] resolves the session cookie against a [`SessionStore`]
//! once per request; [`require_role`] and [`optional_auth`] turn that into a
//! single decision and expose the result to handlers through
//! [`CurrentSession`] / [`MaybeSession`].

pub mod config;
pub mod cookies;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod metrics;
pub mod middleware;
pub mod record;
pub mod roles;
pub mod store;
pub mod token;

pub use config::{CookieSameSite, CookieSettings, GateConfig, DEFAULT_COOKIE_NAME};
pub use cookies::{clear_session_cookie, session_cookie, session_token_from_headers};
pub use error::{AuthError, AuthResult, AuthenticationReason, StoreError};
pub use extractors::{CurrentSession, MaybeSession};
pub use gate::{AuthorizationDecision, SessionGate};
pub use middleware::{optional_auth, require_role, RoleGuard};
pub use record::{AuthStatus, SessionContext, SessionRecord, SessionUser, UserSummary};
pub use roles::{Role, UnknownRole, ROLE_HIERARCHY};
pub use store::{InMemorySessionStore, SessionStore};
pub use token::{generate_session_token, hash_session_token};
