pub mod authorizer;
pub mod error;
pub mod events;
pub mod ports;
pub mod request;
pub mod service;
pub mod validation;

pub use authorizer::{UpdateOutcome, UserUpdateAuthorizer};
pub use error::UserError;
pub use events::{BroadcastEventSink, UserEvent, UserEventKind};
pub use ports::{PasswordHasher, RoleRepository, SchoolRepository, UserEventSink, UserRepository};
pub use request::{ActorContext, EffectFlags, NewUser, UserFieldRemoval, UserUpdateRequest};
pub use service::UserService;
