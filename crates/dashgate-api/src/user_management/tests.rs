//! Tests for user management system

#[cfg(test)]
mod tests {
    use crate::auth::password::{PasswordHasher, test_hasher};
    use crate::error::ApiError;
    use crate::rbac::Role;
    use crate::user_management::manager::UserManager;
    use crate::user_management::models::{CreateUserRequest, SafeUser, SortField, SortOrder, StoreError, UpdateUserRequest, UserChanges, UserQuery, UserRecord};
    use crate::user_management::store::{MemoryUserStore, UserStore};
    use std::sync::Arc;

    fn record(email: &str, name: Option<&str>, role: Role) -> UserRecord {
        UserRecord::new(email.to_string(), "hash".to_string(), name.map(str::to_string), role)
    }

    fn setup() -> (Arc<MemoryUserStore>, UserManager) {
        let store = Arc::new(MemoryUserStore::new());
        let hasher: Arc<dyn PasswordHasher> = Arc::new(test_hasher());
        let manager = UserManager::new(store.clone(), hasher);
        (store, manager)
    }

    async fn add(store: &MemoryUserStore, email: &str, role: Role) -> SafeUser {
        SafeUser::from(store.insert(record(email, None, role)).await.unwrap())
    }

    fn create_request(email: &str, role: Option<Role>) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            name: Some("New User".to_string()),
            role,
        }
    }

    #[tokio::test]
    async fn test_user_store_operations() {
        let store = MemoryUserStore::new();
        let user = store.insert(record("test@example.com", Some("Test"), Role::Member)).await.unwrap();

        let by_id = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "test@example.com");

        let by_email = store.find_by_email("test@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let duplicate = store.insert(record("test@example.com", None, Role::Viewer)).await;
        assert_eq!(duplicate.unwrap_err(), StoreError::EmailExists { email: "test@example.com".to_string() });

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_update_moves_email_index() {
        let store = MemoryUserStore::new();
        let a = store.insert(record("a@example.com", None, Role::Member)).await.unwrap();
        store.insert(record("b@example.com", None, Role::Member)).await.unwrap();

        let collision = store
            .update(&a.id, None, UserChanges {
                email: Some("b@example.com".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(collision, Err(StoreError::EmailExists { .. })));

        let updated = store
            .update(&a.id, None, UserChanges {
                email: Some("c@example.com".to_string()),
                name: Some(Some("Carol".to_string())),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.email, "c@example.com");
        assert_eq!(updated.name.as_deref(), Some("Carol"));
        assert!(updated.updated_at >= updated.created_at);

        assert!(store.find_by_email("a@example.com").await.unwrap().is_none());
        assert_eq!(store.find_by_email("c@example.com").await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_store_guards_last_super_admin() {
        let store = MemoryUserStore::new();
        let root = store.insert(record("root@example.com", None, Role::SuperAdmin)).await.unwrap();

        assert_eq!(store.delete(&root.id, None).await.unwrap_err(), StoreError::LastSuperAdmin);

        let demote = store
            .update(&root.id, None, UserChanges {
                role: Some(Role::Admin),
                ..Default::default()
            })
            .await;
        assert_eq!(demote.unwrap_err(), StoreError::LastSuperAdmin);

        let second = store.insert(record("root2@example.com", None, Role::SuperAdmin)).await.unwrap();
        store.delete(&root.id, None).await.unwrap();
        assert_eq!(store.count_by_role(Role::SuperAdmin).await.unwrap(), 1);
        assert_eq!(store.delete(&second.id, None).await.unwrap_err(), StoreError::LastSuperAdmin);
    }

    #[tokio::test]
    async fn test_store_list_filters_and_paginates() {
        let store = MemoryUserStore::new();
        store.insert(record("alice@example.com", Some("Alice"), Role::Admin)).await.unwrap();
        store.insert(record("bob@example.com", Some("Bob"), Role::Editor)).await.unwrap();
        store.insert(record("carol@corp.io", Some("Carol Alison"), Role::Editor)).await.unwrap();
        store.insert(record("dave@corp.io", None, Role::Viewer)).await.unwrap();

        let query = UserQuery {
            search: Some("ALI".to_string()),
            sort: SortField::Email,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let page = store.list(&query).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.users[0].email, "alice@example.com");
        assert_eq!(page.users[1].email, "carol@corp.io");

        let query = UserQuery {
            role: Some(Role::Editor),
            ..Default::default()
        };
        assert_eq!(store.list(&query).await.unwrap().total, 2);

        let query = UserQuery {
            page: 2,
            limit: 3,
            sort: SortField::Email,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let page = store.list(&query).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].email, "dave@corp.io");

        let query = UserQuery {
            page: 9,
            ..Default::default()
        };
        assert!(store.list(&query).await.unwrap().users.is_empty());
    }

    #[tokio::test]
    async fn test_create_defaults_to_lowest_role() {
        let (store, manager) = setup();
        let admin = add(&store, "admin@example.com", Role::Admin).await;

        let created = manager.create_user(&admin, create_request("  New@Example.com ", None)).await.unwrap();
        assert_eq!(created.role, Role::Viewer);
        assert_eq!(created.email, "new@example.com");

        let stored = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert!(test_hasher().verify("password123", &stored.password_hash));
    }

    #[tokio::test]
    async fn test_create_requires_authority_over_role() {
        let (store, manager) = setup();
        let admin = add(&store, "admin@example.com", Role::Admin).await;
        let before = store.count().await.unwrap();

        for role in [Role::Admin, Role::SuperAdmin] {
            let result = manager.create_user(&admin, create_request("x@example.com", Some(role))).await;
            assert!(matches!(result, Err(ApiError::Forbidden { .. })), "admin created {}", role);
        }
        assert_eq!(store.count().await.unwrap(), before);

        let editor = add(&store, "editor@example.com", Role::Editor).await;
        let result = manager.create_user(&editor, create_request("y@example.com", Some(Role::Viewer))).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_and_bad_input() {
        let (store, manager) = setup();
        let root = add(&store, "root@example.com", Role::SuperAdmin).await;

        let result = manager.create_user(&root, create_request("ROOT@example.com", None)).await;
        assert!(matches!(result, Err(ApiError::Conflict { .. })));

        let mut short = create_request("short@example.com", None);
        short.password = "short".to_string();
        assert!(matches!(manager.create_user(&root, short).await, Err(ApiError::Validation { .. })));

        let result = manager.create_user(&root, create_request("not-an-email", None)).await;
        assert!(matches!(result, Err(ApiError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_viewer_cannot_list() {
        let (store, manager) = setup();
        let viewer = add(&store, "viewer@example.com", Role::Viewer).await;
        let editor = add(&store, "editor@example.com", Role::Editor).await;

        let result = manager.list_users(&viewer, &UserQuery::default()).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));

        let page = manager.list_users(&editor, &UserQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_update_checks_current_and_proposed_role() {
        let (store, manager) = setup();
        let admin = add(&store, "admin@example.com", Role::Admin).await;
        let peer = add(&store, "peer@example.com", Role::Admin).await;
        let member = add(&store, "member@example.com", Role::Member).await;

        let rename = UpdateUserRequest {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let result = manager.update_user(&admin, &peer.id, rename.clone()).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));

        let promote = UpdateUserRequest {
            role: Some(Role::Admin),
            name: Some("Promoted".to_string()),
            ..Default::default()
        };
        let result = manager.update_user(&admin, &member.id, promote).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));

        let unchanged = store.find_by_id(&member.id).await.unwrap().unwrap();
        assert_eq!(unchanged.role, Role::Member);
        assert_eq!(unchanged.name, None);

        let updated = manager.update_user(&admin, &member.id, rename).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Renamed"));
    }

    #[tokio::test]
    async fn test_update_password_and_email() {
        let (store, manager) = setup();
        let root = add(&store, "root@example.com", Role::SuperAdmin).await;
        let editor = add(&store, "editor@example.com", Role::Editor).await;
        add(&store, "taken@example.com", Role::Viewer).await;

        let collision = UpdateUserRequest {
            email: Some("Taken@example.com".to_string()),
            ..Default::default()
        };
        let result = manager.update_user(&root, &editor.id, collision).await;
        assert!(matches!(result, Err(ApiError::Conflict { .. })));

        let change = UpdateUserRequest {
            email: Some("editor2@example.com".to_string()),
            password: Some("new-password".to_string()),
            ..Default::default()
        };
        manager.update_user(&root, &editor.id, change).await.unwrap();

        let stored = store.find_by_email("editor2@example.com").await.unwrap().unwrap();
        assert!(test_hasher().verify("new-password", &stored.password_hash));

        let empty = manager.update_user(&root, &editor.id, UpdateUserRequest::default()).await;
        assert!(matches!(empty, Err(ApiError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_last_super_admin_cannot_be_demoted() {
        let (store, manager) = setup();
        let root = add(&store, "root@example.com", Role::SuperAdmin).await;

        let demote = UpdateUserRequest {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let result = manager.update_user(&root, &root.id, demote).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));
        assert_eq!(store.count_by_role(Role::SuperAdmin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_self_deletion_refused() {
        let (store, manager) = setup();
        let root = add(&store, "root@example.com", Role::SuperAdmin).await;
        add(&store, "root2@example.com", Role::SuperAdmin).await;

        let result = manager.delete_user(&root, &root.id).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));
        assert!(store.find_by_id(&root.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_last_super_admin_cannot_be_deleted() {
        let (store, manager) = setup();
        let root = add(&store, "root@example.com", Role::SuperAdmin).await;
        let other = add(&store, "other@example.com", Role::SuperAdmin).await;

        manager.delete_user(&root, &other.id).await.unwrap();
        assert_eq!(store.count_by_role(Role::SuperAdmin).await.unwrap(), 1);

        // An actor that still holds a stale super_admin snapshot
        let ghost = SafeUser { id: "ghost".to_string(), ..root.clone() };
        let result = manager.delete_user(&ghost, &root.id).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));
        assert!(store.find_by_id(&root.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_admin_cannot_delete() {
        let (store, manager) = setup();
        let admin = add(&store, "admin@example.com", Role::Admin).await;
        let viewer = add(&store, "viewer@example.com", Role::Viewer).await;

        let result = manager.delete_user(&admin, &viewer.id).await;
        assert!(matches!(result, Err(ApiError::Forbidden { .. })));

        let root = add(&store, "root@example.com", Role::SuperAdmin).await;
        manager.delete_user(&root, &viewer.id).await.unwrap();
        assert!(matches!(manager.delete_user(&root, &viewer.id).await, Err(ApiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_deletes_keep_one_super_admin() {
        let (store, manager) = setup();
        let a = add(&store, "a@example.com", Role::SuperAdmin).await;
        let b = add(&store, "b@example.com", Role::SuperAdmin).await;

        let (first, second) = tokio::join!(manager.delete_user(&a, &b.id), manager.delete_user(&b, &a.id));

        assert!(first.is_ok() ^ second.is_ok());
        assert_eq!(store.count_by_role(Role::SuperAdmin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_refuses_write_when_role_moved() {
        let store = MemoryUserStore::new();
        let user = store.insert(record("e@example.com", None, Role::Editor)).await.unwrap();

        let promoted = store
            .update(&user.id, Some(Role::Editor), UserChanges {
                role: Some(Role::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let stale = store
            .update(&user.id, Some(Role::Editor), UserChanges {
                password_hash: Some("other-hash".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(stale.unwrap_err(), StoreError::RoleChanged { user_id: user.id.clone() });
        assert_eq!(store.delete(&user.id, Some(Role::Editor)).await.unwrap_err(), StoreError::RoleChanged { user_id: user.id.clone() });

        let stored = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, user.password_hash);
        assert_eq!(stored.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_concurrent_promotion_blocks_stale_edit() {
        let (store, manager) = setup();
        let root = add(&store, "root@example.com", Role::SuperAdmin).await;
        let admin = add(&store, "admin@example.com", Role::Admin).await;
        let editor = add(&store, "editor@example.com", Role::Editor).await;
        let original_hash = store.find_by_id(&editor.id).await.unwrap().unwrap().password_hash;

        let reset = UpdateUserRequest {
            password: Some("taken-over-1".to_string()),
            ..Default::default()
        };
        let promote = UpdateUserRequest {
            role: Some(Role::Admin),
            ..Default::default()
        };

        let (reset_result, promote_result) = tokio::join!(manager.update_user(&admin, &editor.id, reset), manager.update_user(&root, &editor.id, promote));

        let stored = store.find_by_id(&editor.id).await.unwrap().unwrap();
        assert!(promote_result.is_ok());
        assert_eq!(stored.role, Role::Admin);

        // The admin may only have changed the password while the target was still an editor
        match reset_result {
            Ok(updated) => assert_eq!(updated.role, Role::Editor),
            Err(e) => {
                assert!(matches!(e, ApiError::Forbidden { .. }));
                assert_eq!(stored.password_hash, original_hash);
            }
        }
    }

    #[tokio::test]
    async fn test_seed_runs_only_on_empty_store() {
        let (store, manager) = setup();

        let seeded = manager.seed_super_admin("Root@Example.com", "bootstrap-pass", Some("Root")).await.unwrap().unwrap();
        assert_eq!(seeded.role, Role::SuperAdmin);
        assert_eq!(seeded.email, "root@example.com");

        assert!(manager.seed_super_admin("other@example.com", "bootstrap-pass", None).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
