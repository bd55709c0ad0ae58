//! Tests for RoleStore operations over the in-memory engine.

use tessera::model::Role;

use crate::helpers::stores;

fn sample_role(name: &str) -> Role {
    let mut role = Role::new();
    role.set_name(name.to_string());
    role.set_normalized_name(name.to_uppercase());
    role
}

#[tokio::test]
async fn test_create_and_find_round_trip() {
    let (_, roles) = stores();
    let role = sample_role("Admin");
    roles.create_role(&role).await.unwrap();

    let by_id = roles.find_by_id(role.id()).await.unwrap().unwrap();
    assert_eq!(by_id, role);

    let by_name = roles.find_by_name("ADMIN").await.unwrap().unwrap();
    assert_eq!(by_name.id(), role.id());

    assert!(roles.find_by_name("NOBODY").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_normalized_name_is_rejected() {
    let (_, roles) = stores();
    let first = sample_role("Admin");
    roles.create_role(&first).await.unwrap();

    let mut second = Role::new();
    second.set_name("admin".to_string());
    second.set_normalized_name("ADMIN".to_string());

    let err = roles.create_role(&second).await.unwrap_err();
    assert!(err.is_duplicate());

    // First role unaffected, no second row written
    assert_eq!(
        roles.find_by_name("ADMIN").await.unwrap().unwrap().id(),
        first.id()
    );
    assert!(roles.find_by_id(second.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_requires_normalized_name() {
    let (_, roles) = stores();
    let mut role = Role::new();
    role.set_name("Admin".to_string());

    let err = roles.create_role(&role).await.unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn test_rename_moves_the_marker() {
    let (_, roles) = stores();
    let mut role = sample_role("Admin");
    roles.create_role(&role).await.unwrap();

    role.set_name("Administrator".to_string());
    role.set_normalized_name("ADMINISTRATOR".to_string());
    roles.update_role(&role).await.unwrap();

    assert!(roles.find_by_name("ADMIN").await.unwrap().is_none());
    assert_eq!(
        roles
            .find_by_name("ADMINISTRATOR")
            .await
            .unwrap()
            .unwrap()
            .id(),
        role.id()
    );

    // The old name is claimable again
    roles.create_role(&sample_role("Admin")).await.unwrap();
}

#[tokio::test]
async fn test_rename_collision_is_rejected() {
    let (_, roles) = stores();
    let admin = sample_role("Admin");
    let mut auditor = sample_role("Auditor");
    roles.create_role(&admin).await.unwrap();
    roles.create_role(&auditor).await.unwrap();

    auditor.set_normalized_name("ADMIN".to_string());
    let err = roles.update_role(&auditor).await.unwrap_err();
    assert!(err.is_duplicate());

    let stored = roles.find_by_id(auditor.id()).await.unwrap().unwrap();
    assert_eq!(stored.normalized_name(), Some("AUDITOR"));
}

#[tokio::test]
async fn test_update_missing_role_is_not_found() {
    let (_, roles) = stores();
    let role = sample_role("Ghost");
    let err = roles.update_role(&role).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_role_is_idempotent_and_frees_the_name() {
    let (_, roles) = stores();
    let role = sample_role("Admin");
    roles.create_role(&role).await.unwrap();

    roles.delete_role(role.id()).await.unwrap();
    roles.delete_role(role.id()).await.unwrap();

    assert!(roles.find_by_id(role.id()).await.unwrap().is_none());
    assert!(roles.find_by_name("ADMIN").await.unwrap().is_none());

    roles.create_role(&sample_role("Admin")).await.unwrap();
}

#[tokio::test]
async fn test_role_deletion_does_not_touch_user_memberships() {
    let (users, roles) = stores();
    let role = sample_role("Admin");
    roles.create_role(&role).await.unwrap();

    let mut user = crate::helpers::sample_user("Alice");
    users.create_user(&mut user).await.unwrap();
    users.add_role(user.id(), "Admin").await.unwrap();

    // Membership is by role name; deleting the role entity leaves the
    // user's membership and the index untouched
    roles.delete_role(role.id()).await.unwrap();
    assert_eq!(users.find_by_role("Admin").await.unwrap().len(), 1);
}
