use addressbook_core::{
    AddressBookProvider, ChangeObserver, ChangeRegistry, ContentValues, QueryRequest,
    ResourceUri, Session, StoreConfig,
};
use std::sync::{Arc, Mutex};

struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl ChangeObserver for Recorder {
    fn on_change(&self, uri: &ResourceUri) {
        self.seen.lock().unwrap().push(uri.to_string());
    }
}

fn uri(raw: &str) -> ResourceUri {
    ResourceUri::parse(raw).unwrap()
}

fn setup() -> (AddressBookProvider, Session) {
    let provider =
        AddressBookProvider::open(&StoreConfig::in_memory(), Arc::new(ChangeRegistry::new()))
            .unwrap();
    let user = provider
        .insert(
            &Session::anonymous(),
            &uri("/users"),
            &ContentValues::new().with_text("username", "ada"),
        )
        .unwrap();
    let session = Session::for_user(user.last_segment().parse().unwrap());
    (provider, session)
}

#[test]
fn successful_mutations_notify_their_paths() {
    let (provider, session) = setup();
    let recorder = Recorder::new();
    provider
        .changes()
        .register(uri("/contacts"), true, recorder.clone());

    let contact = provider
        .insert(
            &session,
            &uri("/contacts"),
            &ContentValues::new().with_text("name", "Grace"),
        )
        .unwrap();
    provider
        .update(
            &session,
            &contact,
            &ContentValues::new().with_text("phone", "555-0100"),
            None,
        )
        .unwrap();
    provider.delete(&session, &contact, None).unwrap();

    assert_eq!(
        recorder.seen(),
        vec![
            "/contacts".to_string(),
            contact.to_string(),
            contact.to_string()
        ]
    );
}

#[test]
fn zero_effect_mutations_and_failures_stay_silent() {
    let (provider, session) = setup();
    let recorder = Recorder::new();
    provider
        .changes()
        .register(uri("/contacts"), true, recorder.clone());

    provider.delete(&session, &uri("/contacts/404"), None).unwrap();
    provider
        .update(
            &session,
            &uri("/contacts/404"),
            &ContentValues::new().with_text("name", "X"),
            None,
        )
        .unwrap();
    let _ = provider.delete(&session, &uri("/contacts"), None).unwrap_err();

    assert!(recorder.seen().is_empty());
}

#[test]
fn query_cursor_goes_stale_after_change_on_its_path() {
    let (provider, session) = setup();
    let contacts = uri("/contacts");

    let cursor = provider
        .query(&session, &contacts, &QueryRequest::new())
        .unwrap();
    let users_cursor = provider
        .query(&session, &uri("/users"), &QueryRequest::new())
        .unwrap();
    assert_eq!(cursor.remaining(), 0);
    assert!(!cursor.is_stale());

    provider
        .insert(
            &session,
            &contacts,
            &ContentValues::new().with_text("name", "Grace"),
        )
        .unwrap();

    assert!(cursor.is_stale());
    assert!(!users_cursor.is_stale());

    let refreshed = provider
        .query(&session, &contacts, &QueryRequest::new())
        .unwrap();
    assert_eq!(refreshed.remaining(), 1);
    assert!(!refreshed.is_stale());
}

#[test]
fn collection_cursor_sees_single_row_edits() {
    let (provider, session) = setup();
    let contact = provider
        .insert(
            &session,
            &uri("/contacts"),
            &ContentValues::new().with_text("name", "Grace"),
        )
        .unwrap();
    let list = provider
        .query(&session, &uri("/contacts"), &QueryRequest::new())
        .unwrap();

    provider
        .update(
            &session,
            &contact,
            &ContentValues::new().with_text("name", "Grace Hopper"),
            None,
        )
        .unwrap();

    assert!(list.is_stale());
}

#[test]
fn dropped_cursors_leave_the_registry() {
    let (provider, session) = setup();
    let registry = Arc::clone(provider.changes());

    let cursor = provider
        .query(&session, &uri("/contacts"), &QueryRequest::new())
        .unwrap();
    assert_eq!(registry.len(), 1);

    drop(cursor);
    assert!(registry.is_empty());
}
