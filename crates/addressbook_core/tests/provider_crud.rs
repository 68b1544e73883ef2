use addressbook_core::{
    AddressBookProvider, ChangeRegistry, Comparison, ContentValues, Operation, ProviderError,
    QueryRequest, ResourceKind, ResourceUri, RouteTable, Selection, Session, SortKey, Store,
};
use rusqlite::types::Value;
use std::sync::Arc;

fn provider() -> AddressBookProvider {
    AddressBookProvider::new(
        Arc::new(Store::open_in_memory().unwrap()),
        RouteTable::address_book(),
        Arc::new(ChangeRegistry::new()),
    )
}

fn uri(raw: &str) -> ResourceUri {
    ResourceUri::parse(raw).unwrap()
}

fn create_user(provider: &AddressBookProvider, username: &str) -> i64 {
    let values = ContentValues::new()
        .with_text("username", username)
        .with_text("password", "hash");
    let new_uri = provider
        .insert(&Session::anonymous(), &uri("/users"), &values)
        .unwrap();
    new_uri.last_segment().parse().unwrap()
}

fn add_contact(provider: &AddressBookProvider, session: &Session, name: &str) -> ResourceUri {
    let values = ContentValues::new()
        .with_text("name", name)
        .with_text("email", format!("{}@example.com", name.to_lowercase()));
    provider.insert(session, &uri("/contacts"), &values).unwrap()
}

fn names(provider: &AddressBookProvider, session: &Session, target: &str) -> Vec<String> {
    provider
        .query(session, &uri(target), &QueryRequest::new().sorted_by(SortKey::asc("name")))
        .unwrap()
        .map(|row| row.get_text("name").unwrap_or_default().to_string())
        .collect()
}

#[test]
fn inserted_contact_is_queryable_by_returned_id() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));

    let new_uri = add_contact(&provider, &session, "Grace");
    let id: i64 = new_uri.last_segment().parse().unwrap();
    assert_eq!(new_uri, uri("/contacts").with_appended_id(id));

    let rows: Vec<_> = provider
        .query(&session, &new_uri, &QueryRequest::new())
        .unwrap()
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id(), Some(id));
    assert_eq!(rows[0].get_text("email"), Some("grace@example.com"));
    assert_eq!(rows[0].get_i64("user_id"), session.user_id());
}

#[test]
fn contacts_collection_is_scoped_to_session_user() {
    let provider = provider();
    let ada = Session::for_user(create_user(&provider, "ada"));
    let bob = Session::for_user(create_user(&provider, "bob"));

    add_contact(&provider, &ada, "Grace");
    add_contact(&provider, &ada, "Alan");
    add_contact(&provider, &bob, "Linus");

    assert_eq!(names(&provider, &ada, "/contacts"), vec!["Alan", "Grace"]);
    assert_eq!(names(&provider, &bob, "/contacts"), vec!["Linus"]);
}

#[test]
fn caller_selection_is_anded_with_user_scope() {
    let provider = provider();
    let ada = Session::for_user(create_user(&provider, "ada"));
    let bob = Session::for_user(create_user(&provider, "bob"));
    add_contact(&provider, &ada, "Grace");
    add_contact(&provider, &bob, "Grace");

    let request = QueryRequest::new()
        .with_projection(["_id", "user_id"])
        .with_selection(Selection::text_eq("name", "Grace"));
    let rows: Vec<_> = provider
        .query(&ada, &uri("/contacts"), &request)
        .unwrap()
        .collect();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].columns(), ["_id", "user_id"]);
    assert_eq!(rows[0].get_i64("user_id"), ada.user_id());
}

#[test]
fn contacts_collection_requires_a_session() {
    let provider = provider();
    let anonymous = Session::anonymous();

    let query_err = provider
        .query(&anonymous, &uri("/contacts"), &QueryRequest::new())
        .unwrap_err();
    assert!(matches!(query_err, ProviderError::NoActiveSession { .. }));

    let insert_err = provider
        .insert(
            &anonymous,
            &uri("/contacts"),
            &ContentValues::new().with_text("name", "x"),
        )
        .unwrap_err();
    assert!(matches!(insert_err, ProviderError::NoActiveSession { .. }));
}

#[test]
fn insert_rejects_contacts_for_another_user() {
    let provider = provider();
    let ada = Session::for_user(create_user(&provider, "ada"));
    let bob_id = create_user(&provider, "bob");

    let values = ContentValues::new()
        .with_text("name", "Grace")
        .with_integer("user_id", bob_id);
    let err = provider.insert(&ada, &uri("/contacts"), &values).unwrap_err();
    assert!(matches!(
        err,
        ProviderError::UserScopeMismatch { requested: Value::Integer(id), .. } if id == bob_id
    ));

    let own = ContentValues::new()
        .with_text("name", "Grace")
        .with_integer("user_id", ada.user_id().unwrap());
    provider.insert(&ada, &uri("/contacts"), &own).unwrap();
}

#[test]
fn update_missing_contact_returns_zero_without_notification() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));
    let target = uri("/contacts/4242");
    let watcher = provider
        .query(&session, &target, &QueryRequest::new())
        .unwrap();

    let changed = provider
        .update(
            &session,
            &target,
            &ContentValues::new().with_text("name", "X"),
            None,
        )
        .unwrap();

    assert_eq!(changed, 0);
    assert!(!watcher.is_stale());
}

#[test]
fn update_changes_one_row_and_respects_selection() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));
    let contact = add_contact(&provider, &session, "Grace");
    let values = ContentValues::new().with_text("city", "Arlington");

    let mismatched = Selection::text_eq("name", "Somebody Else");
    assert_eq!(
        provider
            .update(&session, &contact, &values, Some(&mismatched))
            .unwrap(),
        0
    );

    assert_eq!(provider.update(&session, &contact, &values, None).unwrap(), 1);
    let row = provider
        .query(&session, &contact, &QueryRequest::new())
        .unwrap()
        .next()
        .unwrap();
    assert_eq!(row.get_text("city"), Some("Arlington"));
    assert_eq!(row.get_text("name"), Some("Grace"));
}

#[test]
fn update_without_values_is_rejected() {
    let provider = provider();
    let err = provider
        .update(
            &Session::anonymous(),
            &uri("/contacts/1"),
            &ContentValues::new(),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ProviderError::EmptyValues { .. }));
}

#[test]
fn delete_then_query_returns_empty_sequence() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));
    let contact = add_contact(&provider, &session, "Grace");

    assert_eq!(provider.delete(&session, &contact, None).unwrap(), 1);
    assert_eq!(
        provider
            .query(&session, &contact, &QueryRequest::new())
            .unwrap()
            .count(),
        0
    );
    assert_eq!(provider.delete(&session, &contact, None).unwrap(), 0);
}

#[test]
fn user_inserts_return_distinct_positive_ids() {
    let provider = provider();
    let values = ContentValues::new()
        .with_text("username", "a")
        .with_text("password", "b");

    let first = provider
        .insert(&Session::anonymous(), &uri("/users"), &values)
        .unwrap();
    let second = provider
        .insert(&Session::anonymous(), &uri("/users"), &values)
        .unwrap();

    let first_id: i64 = first.last_segment().parse().unwrap();
    let second_id: i64 = second.last_segment().parse().unwrap();
    assert!(first_id > 0);
    assert_ne!(first_id, second_id);
    assert_eq!(first, uri(&format!("/users/{first_id}")));
}

#[test]
fn contact_ids_are_not_reused_after_delete() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));
    let first = add_contact(&provider, &session, "Grace");
    provider.delete(&session, &first, None).unwrap();

    let second = add_contact(&provider, &session, "Grace");
    assert_ne!(first, second);
}

#[test]
fn users_collection_returns_every_user() {
    let provider = provider();
    create_user(&provider, "ada");
    create_user(&provider, "bob");

    let rows: Vec<_> = provider
        .query(
            &Session::for_user(1),
            &uri("/users"),
            &QueryRequest::new().sorted_by(SortKey::desc("username")),
        )
        .unwrap()
        .collect();
    let usernames: Vec<_> = rows
        .iter()
        .map(|row| row.get_text("username").unwrap())
        .collect();
    assert_eq!(usernames, vec!["bob", "ada"]);
}

#[test]
fn collection_mutations_are_not_allowed() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));
    add_contact(&provider, &session, "Grace");

    let err = provider
        .delete(&session, &uri("/contacts"), None)
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::OperationNotAllowed {
            operation: Operation::Delete,
            kind: ResourceKind::Contacts,
            ..
        }
    ));
    assert_eq!(names(&provider, &session, "/contacts"), vec!["Grace"]);

    let update_err = provider
        .update(
            &session,
            &uri("/users"),
            &ContentValues::new().with_text("password", "x"),
            None,
        )
        .unwrap_err();
    assert!(matches!(update_err, ProviderError::OperationNotAllowed { .. }));

    let insert_err = provider
        .insert(
            &session,
            &uri("/contacts/1"),
            &ContentValues::new().with_text("name", "x"),
        )
        .unwrap_err();
    assert!(matches!(insert_err, ProviderError::OperationNotAllowed { .. }));
}

#[test]
fn unknown_resources_are_classification_faults() {
    let provider = provider();
    let session = Session::for_user(1);

    for raw in ["/users/1", "/contacts/abc", "/groups"] {
        let err = provider
            .query(&session, &uri(raw), &QueryRequest::new())
            .unwrap_err();
        assert!(
            matches!(err, ProviderError::UnsupportedResource { .. }),
            "`{raw}` should be unsupported, got {err}"
        );
    }
}

#[test]
fn unknown_columns_never_reach_sql() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));

    let insert_err = provider
        .insert(
            &session,
            &uri("/contacts"),
            &ContentValues::new().with_text("name) VALUES ('x'); --", "x"),
        )
        .unwrap_err();
    assert!(matches!(insert_err, ProviderError::UnknownColumn { .. }));

    let sort_err = provider
        .query(
            &session,
            &uri("/contacts"),
            &QueryRequest::new().sorted_by(SortKey::asc("password")),
        )
        .unwrap_err();
    assert!(matches!(
        sort_err,
        ProviderError::UnknownColumn {
            table: "contacts",
            ..
        }
    ));
}

#[test]
fn contact_for_missing_user_fails_to_insert() {
    let provider = provider();
    let err = provider
        .insert(
            &Session::for_user(77),
            &uri("/contacts"),
            &ContentValues::new().with_text("name", "Orphan"),
        )
        .unwrap_err();

    match err {
        ProviderError::InsertFailed { uri: target, source } => {
            assert_eq!(target, uri("/contacts"));
            assert!(source.is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn selection_on_unknown_column_is_rejected() {
    let provider = provider();
    let err = provider
        .query(
            &Session::anonymous(),
            &uri("/users"),
            &QueryRequest::new().with_selection(Selection::eq("1) OR (1", 1_i64)),
        )
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownColumn { table: "users", .. }));
}

#[test]
fn single_contact_delete_never_widens_past_its_row() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));
    for name in ["Grace", "Alan", "Linus"] {
        add_contact(&provider, &session, name);
    }

    let hostile = Selection::new().and("name", Comparison::NotEq, "0) OR (1".to_string());
    let removed = provider
        .delete(&session, &uri("/contacts/999"), Some(&hostile))
        .unwrap();

    assert_eq!(removed, 0);
    assert_eq!(
        names(&provider, &session, "/contacts"),
        vec!["Alan", "Grace", "Linus"]
    );
}

#[test]
fn selection_cannot_reach_another_users_contacts() {
    let provider = provider();
    let ada = Session::for_user(create_user(&provider, "ada"));
    let bob = Session::for_user(create_user(&provider, "bob"));
    add_contact(&provider, &ada, "Grace");
    add_contact(&provider, &bob, "Linus");

    let wide = Selection::new()
        .and("user_id", Comparison::NotEq, Value::Null)
        .and("name", Comparison::Like, "%".to_string());
    let rows: Vec<_> = provider
        .query(&ada, &uri("/contacts"), &QueryRequest::new().with_selection(wide))
        .unwrap()
        .collect();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_text("name"), Some("Grace"));
    assert_eq!(rows[0].get_i64("user_id"), ada.user_id());
}

#[test]
fn insert_rejects_caller_supplied_row_id() {
    let provider = provider();
    let values = ContentValues::new()
        .with_text("username", "a")
        .with_integer("_id", 0);

    let err = provider
        .insert(&Session::anonymous(), &uri("/users"), &values)
        .unwrap_err();

    assert!(matches!(
        err,
        ProviderError::ReadOnlyColumn {
            table: "users",
            column: "_id"
        }
    ));
    assert_eq!(
        provider
            .query(&Session::anonymous(), &uri("/users"), &QueryRequest::new())
            .unwrap()
            .count(),
        0
    );
}

#[test]
fn update_cannot_move_a_contact_to_another_id() {
    let provider = provider();
    let session = Session::for_user(create_user(&provider, "ada"));
    let contact = add_contact(&provider, &session, "Grace");

    let err = provider
        .update(
            &session,
            &contact,
            &ContentValues::new().with_integer("_id", 500),
            None,
        )
        .unwrap_err();

    assert!(matches!(err, ProviderError::ReadOnlyColumn { .. }));
    assert_eq!(
        provider
            .query(&session, &contact, &QueryRequest::new())
            .unwrap()
            .count(),
        1
    );
}
