#![allow(dead_code)]

//! In-memory collaborators for driving the user service without Postgres.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use central_server::app::AppState;
use central_server::auth::JwtKeys;
use central_server::database::models::{Role, UserRecord};
use central_server::database::DatabaseError;
use central_server::permissions::{default_roles, PermissionChecker, RolePermissions};
use central_server::users::{
    ActorContext, BroadcastEventSink, PasswordHasher, RoleRepository, SchoolRepository,
    UserError, UserEvent, UserEventKind, UserEventSink, UserRepository, UserService,
};

pub const PASSWORD: &str = "Password1";

/// Ordered record of repository writes, shared by the user and school fakes
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub struct MemoryUsers {
    users: Mutex<HashMap<Uuid, UserRecord>>,
    log: CallLog,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn count_by_role(&self, role_id: i32, active_only: bool) -> Result<i64, DatabaseError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.role_id == role_id && (!active_only || !u.deactivated))
            .count() as i64)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, DatabaseError> {
        let mut users: Vec<_> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by_key(|u| u.date_created);
        Ok(users)
    }

    async fn insert(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        self.log.lock().unwrap().push(format!("insert:{}", user.id));
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            return Err(DatabaseError::NotFound(format!("user {}", user.id)));
        }
        self.log.lock().unwrap().push(format!("save:{}", user.id));
        users.insert(user.id, user.clone());
        Ok(())
    }
}

pub struct MemorySchools {
    ids: HashSet<i32>,
    log: CallLog,
}

#[async_trait]
impl SchoolRepository for MemorySchools {
    async fn exists(&self, school_id: i32) -> Result<bool, DatabaseError> {
        Ok(self.ids.contains(&school_id))
    }

    async fn clear_assigned_noted_by(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        self.log.lock().unwrap().push(format!("clear_noted_by:{}", user_id));
        Ok(())
    }
}

pub struct MemoryRoles {
    roles: Vec<Role>,
}

#[async_trait]
impl RoleRepository for MemoryRoles {
    async fn exists(&self, role_id: i32) -> Result<bool, DatabaseError> {
        Ok(self.roles.iter().any(|r| r.id == role_id))
    }

    async fn list(&self) -> Result<Vec<Role>, DatabaseError> {
        Ok(self.roles.clone())
    }
}

/// Reversible stand-in for argon2 so tests stay fast
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, UserError> {
        Ok(format!("hashed:{}", plaintext))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        hash == format!("hashed:{}", plaintext)
    }
}

/// Grants every permission, leaving only the business rules in play
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn is_allowed(&self, _permission: &str, _actor: &ActorContext) -> bool {
        true
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UserEvent>>,
}

impl RecordingSink {
    pub fn kinds(&self) -> Vec<UserEventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl UserEventSink for RecordingSink {
    async fn publish(&self, event: UserEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct Harness {
    pub service: Arc<UserService>,
    pub users: Arc<MemoryUsers>,
    pub events: Arc<RecordingSink>,
    pub log: CallLog,
    created: Mutex<i64>,
}

impl Harness {
    /// Role-based permissions, schools 1 to 3, the four default roles
    pub fn new() -> Self {
        Self::with_permissions(Arc::new(RolePermissions))
    }

    pub fn with_permissions(permissions: Arc<dyn PermissionChecker>) -> Self {
        let log: CallLog = Arc::default();
        let users = Arc::new(MemoryUsers {
            users: Mutex::default(),
            log: log.clone(),
        });
        let schools = Arc::new(MemorySchools {
            ids: [1, 2, 3].into_iter().collect(),
            log: log.clone(),
        });
        let roles = Arc::new(MemoryRoles { roles: default_roles() });
        let events = Arc::new(RecordingSink::default());

        let service = UserService::new(
            users.clone(),
            schools,
            roles,
            permissions,
            Arc::new(PlainHasher),
            events.clone(),
        );

        Self {
            service: Arc::new(service),
            users,
            events,
            log,
            created: Mutex::new(0),
        }
    }

    /// Seed a user directly into the store, bypassing the service
    pub fn add_user(&self, username: &str, role_id: i32) -> UserRecord {
        let mut created = self.created.lock().unwrap();
        *created += 1;
        let date_created = Utc::now() - Duration::days(30) + Duration::seconds(*created);

        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: format!("hashed:{}", PASSWORD),
            email: Some(format!("{}@school.example", username)),
            email_verified: true,
            name_first: Some("Test".to_string()),
            name_middle: None,
            name_last: Some("User".to_string()),
            position: Some("Staff".to_string()),
            school_id: Some(1),
            role_id,
            deactivated: false,
            finished_tutorials: Vec::new(),
            force_update_info: false,
            date_created,
            last_modified: date_created,
        };
        self.users.users.lock().unwrap().insert(user.id, user.clone());
        user
    }

    pub fn stored(&self, id: Uuid) -> UserRecord {
        self.users.users.lock().unwrap()[&id].clone()
    }

    pub fn set_deactivated(&self, id: Uuid, deactivated: bool) {
        if let Some(user) = self.users.users.lock().unwrap().get_mut(&id) {
            user.deactivated = deactivated;
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn state(&self) -> AppState {
        AppState {
            users: self.service.clone(),
            jwt: JwtKeys::new("integration-test-secret", 1),
            events: BroadcastEventSink::new(16),
        }
    }
}

pub fn actor(user: &UserRecord) -> ActorContext {
    ActorContext {
        user_id: user.id,
        role_id: user.role_id,
    }
}
