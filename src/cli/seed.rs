use anyhow::Context;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::config;
use crate::database::{DatabaseManager, PgRoleRepository};
use crate::permissions::{default_roles, TOP_ADMIN_ROLE_ID};
use crate::users::{ActorContext, NewUser};

pub async fn handle(username: String, password: String) -> anyhow::Result<()> {
    let config = config();
    let pool = DatabaseManager::pool()
        .await
        .context("failed to connect to the database")?;

    let inserted = PgRoleRepository::new(pool.clone())
        .ensure(&default_roles())
        .await
        .context("failed to insert default roles")?;
    tracing::info!("Inserted {} missing role(s)", inserted);

    let state = AppState::from_pool(pool, config);
    let users = state.users;

    let has_top_admin = users
        .list()
        .await?
        .iter()
        .any(|user| user.role_id == TOP_ADMIN_ROLE_ID && !user.deactivated);

    if has_top_admin {
        println!("An active Superintendent already exists, skipping account creation");
    } else {
        // No account exists yet to act as, so the system acts with top-admin rights
        let system = ActorContext {
            user_id: Uuid::nil(),
            role_id: TOP_ADMIN_ROLE_ID,
        };
        let user = users
            .create(
                NewUser {
                    username,
                    password,
                    role_id: TOP_ADMIN_ROLE_ID,
                    email: None,
                    name_first: None,
                    name_middle: None,
                    name_last: None,
                    position: Some("Superintendent".to_string()),
                    school_id: None,
                },
                &system,
                true,
            )
            .await
            .context("failed to create Superintendent")?;
        println!("Created Superintendent `{}` ({})", user.username, user.id);
    }

    DatabaseManager::close().await;
    Ok(())
}
