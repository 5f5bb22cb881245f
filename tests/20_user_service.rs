mod common;

use anyhow::Result;
use central_server::users::{NewUser, UserError, UserEventKind, UserFieldRemoval, UserUpdateRequest};

use common::{actor, Harness, PASSWORD};

fn new_user(username: &str, role_id: i32) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: PASSWORD.to_string(),
        role_id,
        email: Some(format!("{}@school.example", username)),
        name_first: Some("New".to_string()),
        name_middle: None,
        name_last: Some("Hire".to_string()),
        position: Some("Principal".to_string()),
        school_id: Some(3),
    }
}

#[tokio::test]
async fn create_hashes_password_and_emits_event() -> Result<()> {
    let h = Harness::new();
    let admin = actor(&h.add_user("admin", 1));

    let user = h.service.create(new_user("new_principal", 3), &admin, false).await?;

    assert_eq!(user.password, format!("hashed:{}", PASSWORD));
    assert!(!user.email_verified);
    assert!(!user.deactivated);
    assert_eq!(h.stored(user.id).username, "new_principal");
    assert_eq!(h.events.kinds(), vec![UserEventKind::UserCreated]);
    Ok(())
}

#[tokio::test]
async fn create_without_email_is_verified() -> Result<()> {
    let h = Harness::new();
    let admin = actor(&h.add_user("admin", 1));

    let user = h
        .service
        .create(NewUser { email: None, ..new_user("no_mail", 4) }, &admin, false)
        .await?;

    assert!(user.email_verified);
    Ok(())
}

#[tokio::test]
async fn create_rejects_bad_input() -> Result<()> {
    let h = Harness::new();
    let admin = actor(&h.add_user("admin", 1));
    h.add_user("existing", 3);

    let err = h.service.create(new_user("existing", 3), &admin, false).await.unwrap_err();
    assert!(matches!(err, UserError::Conflict { field: "username", .. }));

    let err = h.service.create(new_user("x!", 3), &admin, false).await.unwrap_err();
    assert!(matches!(err, UserError::Validation { field: "username", .. }));

    let weak = NewUser { password: "short1A".to_string(), ..new_user("weak_pass", 3) };
    let err = h.service.create(weak, &admin, false).await.unwrap_err();
    assert!(matches!(err, UserError::Validation { field: "password", .. }));

    let err = h.service.create(new_user("no_role", 9), &admin, false).await.unwrap_err();
    assert!(matches!(err, UserError::NotFound { what: "Role" }));

    let no_school = NewUser { school_id: Some(42), ..new_user("no_school", 3) };
    let err = h.service.create(no_school, &admin, false).await.unwrap_err();
    assert!(matches!(err, UserError::NotFound { what: "School" }));

    assert!(h.writes().is_empty());
    Ok(())
}

#[tokio::test]
async fn create_cannot_grant_a_higher_role() -> Result<()> {
    let h = Harness::new();
    let administrator = actor(&h.add_user("administrator", 2));

    let err = h
        .service
        .create(new_user("escalated", 1), &administrator, false)
        .await
        .unwrap_err();
    match err {
        UserError::PermissionDenied { field, reason } => {
            assert_eq!(field, "roleId");
            assert_eq!(reason, "Cannot create a user with a higher role.");
        }
        other => panic!("expected permission denied, got {:?}", other),
    }
    assert!(h.writes().is_empty());

    // Same level and below are fine
    h.service.create(new_user("peer_admin", 2), &administrator, false).await?;
    h.service.create(new_user("principal_2", 3), &administrator, false).await?;
    Ok(())
}

#[tokio::test]
async fn update_events_follow_commit() -> Result<()> {
    let h = Harness::new();
    let admin = h.add_user("admin", 1);
    let target = h.add_user("principal", 3);

    let request = UserUpdateRequest {
        email: Some("fresh@school.example".to_string()),
        ..UserUpdateRequest::for_user(target.id)
    };
    h.service.update(&request, &actor(&admin)).await?;

    assert_eq!(
        h.events.kinds(),
        vec![
            UserEventKind::UserUpdated,
            UserEventKind::EmailUpdated,
            UserEventKind::ProfileUpdated,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn deactivation_emits_deactivated_event() -> Result<()> {
    let h = Harness::new();
    let admin = h.add_user("admin", 1);
    let target = h.add_user("principal", 3);

    let request = UserUpdateRequest {
        deactivated: Some(true),
        ..UserUpdateRequest::for_user(target.id)
    };
    h.service.update(&request, &actor(&admin)).await?;

    assert!(h.stored(target.id).deactivated);
    assert_eq!(
        h.events.kinds(),
        vec![UserEventKind::UserDeactivated, UserEventKind::ProfileUpdated]
    );
    Ok(())
}

#[tokio::test]
async fn remove_fields_clears_selected_values() -> Result<()> {
    let h = Harness::new();
    let target = h.add_user("principal", 3);

    let removal = UserFieldRemoval {
        id: target.id,
        email: true,
        position: true,
        school_id: true,
        ..Default::default()
    };
    let user = h.service.remove_fields(&removal).await?;

    assert_eq!(user.email, None);
    assert!(!user.email_verified);
    assert_eq!(user.position, None);
    assert_eq!(user.school_id, None);
    assert_eq!(user.name_first, target.name_first);
    assert_eq!(
        h.writes(),
        vec![
            format!("clear_noted_by:{}", target.id),
            format!("save:{}", target.id),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn remove_fields_for_unknown_user_fails() -> Result<()> {
    let h = Harness::new();

    let removal = UserFieldRemoval {
        id: uuid::Uuid::new_v4(),
        email: true,
        ..Default::default()
    };
    let err = h.service.remove_fields(&removal).await.unwrap_err();

    assert!(matches!(err, UserError::NotFound { what: "User" }));
    Ok(())
}

#[tokio::test]
async fn authenticate_checks_password_and_status() -> Result<()> {
    let h = Harness::new();
    let user = h.add_user("principal", 3);

    let found = h.service.authenticate("principal", PASSWORD).await?;
    assert_eq!(found.id, user.id);

    let err = h.service.authenticate("principal", "Wrong1234").await.unwrap_err();
    assert!(matches!(err, UserError::Unauthorized(_)));

    let err = h.service.authenticate("nobody", PASSWORD).await.unwrap_err();
    assert!(matches!(err, UserError::Unauthorized(_)));

    h.set_deactivated(user.id, true);
    let err = h.service.authenticate("principal", PASSWORD).await.unwrap_err();
    assert!(matches!(err, UserError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn list_returns_oldest_first() -> Result<()> {
    let h = Harness::new();
    let first = h.add_user("first", 1);
    let second = h.add_user("second", 3);

    let users = h.service.list().await?;
    let ids: Vec<_> = users.iter().map(|u| u.id).collect();

    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(h.service.list_roles().await?.len(), 4);
    Ok(())
}
