use crate::auth::{AuthError, AuthService};
use crate::catalog::{BookForm, CatalogGateway, CatalogView, Direction, Record, SortKey};
use crate::config::Config;
use crate::error::AppError;
use crate::session::{SessionGate, SessionState};
use crate::store::Store;

const PLACEHOLDER: &str = "https://via.placeholder.com/150";

fn test_store() -> Store {
    Store::open_memory().unwrap()
}

fn test_auth(store: Store) -> AuthService {
    AuthService::new(store, SessionGate::new(), 30, true)
}

fn test_view() -> (Store, CatalogView) {
    let store = test_store();
    let gateway = CatalogGateway::new(store.clone(), "books");
    let view = CatalogView::new(gateway, PLACEHOLDER);
    view.load().unwrap();
    (store, view)
}

fn form(title: &str, author: &str) -> BookForm {
    BookForm {
        title: title.to_string(),
        author: author.to_string(),
        publish_date: "2020-01-15".to_string(),
        page_count: 100,
        image: Some("data:image/png;base64,AAAA".to_string()),
    }
}

fn seeded_view(titles_and_pages: &[(&str, u32)]) -> CatalogView {
    let (_, view) = test_view();
    for (title, pages) in titles_and_pages {
        let mut f = form(title, "Author");
        f.page_count = *pages;
        view.submit(&f, None).unwrap();
    }
    view
}

// ========== DOCUMENT STORE ==========

#[test]
fn store_read_absent_document() {
    let store = test_store();
    assert!(store.read_document("books").unwrap().is_none());
    assert!(!store.document_exists("books").unwrap());
}

#[test]
fn store_write_and_read_document() {
    let store = test_store();
    store.write_document("books", r#"{"books":[]}"#).unwrap();

    let body = store.read_document("books").unwrap().unwrap();
    assert_eq!(body, r#"{"books":[]}"#);
    assert!(store.document_exists("books").unwrap());
}

#[test]
fn store_write_replaces_wholesale() {
    let store = test_store();
    store.write_document("books", "first").unwrap();
    store.write_document("books", "second").unwrap();

    assert_eq!(store.read_document("books").unwrap().unwrap(), "second");
}

// ========== GATEWAY ==========

#[test]
fn gateway_fetch_absent_is_empty_catalog() {
    let store = test_store();
    let gateway = CatalogGateway::new(store, "books");

    assert!(gateway.fetch_all().unwrap().is_empty());
}

#[test]
fn gateway_ensure_initialized_is_idempotent() {
    let store = test_store();
    let gateway = CatalogGateway::new(store.clone(), "books");

    gateway.ensure_initialized().unwrap();
    let first = gateway.fetch_all().unwrap();

    gateway.ensure_initialized().unwrap();
    let second = gateway.fetch_all().unwrap();

    assert_eq!(first, second);
    assert!(store.document_exists("books").unwrap());
}

#[test]
fn gateway_ensure_initialized_keeps_existing_records() {
    let (_, view) = test_view();
    view.submit(&form("Dune", "Frank Herbert"), None).unwrap();

    // A second start must not wipe the catalog back to empty.
    view.load().unwrap();
    assert_eq!(view.len(), 1);
}

#[test]
fn gateway_replace_all_round_trip() {
    let store = test_store();
    let gateway = CatalogGateway::new(store, "books");

    let records = vec![Record {
        id: "1".to_string(),
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        publish_date: 19650801,
        page_count: 412,
        image_ref: PLACEHOLDER.to_string(),
    }];

    gateway.replace_all(&records).unwrap();
    assert_eq!(gateway.fetch_all().unwrap(), records);
}

// ========== VIEW MODEL ==========

#[test]
fn view_submit_appends_with_fresh_id() {
    let (_, view) = test_view();
    let before = view.len();

    let record = view.submit(&form("Dune", "Frank Herbert"), None).unwrap();
    assert!(!record.id.is_empty());

    view.load().unwrap();
    assert_eq!(view.len(), before + 1);
    assert_eq!(view.records().last().unwrap().id, record.id);
}

#[test]
fn view_submit_edit_replaces_in_place() {
    let view = seeded_view(&[("First", 100), ("Second", 200)]);
    let first_id = view.records()[0].id.clone();

    let mut edit = form("First Edition", "New Author");
    edit.image = None;
    let updated = view.submit(&edit, Some(&first_id)).unwrap();

    assert_eq!(updated.id, first_id);
    assert_eq!(view.len(), 2);
    assert_eq!(view.records()[0].title, "First Edition");
    assert_eq!(view.records()[0].id, first_id);
}

#[test]
fn view_submit_edit_keeps_existing_image() {
    let (_, view) = test_view();
    let created = view.submit(&form("Dune", "Frank Herbert"), None).unwrap();

    let mut edit = form("Dune", "Frank Herbert");
    edit.image = None;
    let updated = view.submit(&edit, Some(&created.id)).unwrap();

    assert_eq!(updated.image_ref, created.image_ref);
}

#[test]
fn view_submit_edit_of_vanished_record_keeps_id() {
    // The record was deleted by another session between render and save; the
    // edit is appended back under the ID it was addressed with.
    let (_, view) = test_view();

    let saved = view
        .submit(&form("Dune", "Frank Herbert"), Some("ghost-id"))
        .unwrap();
    assert_eq!(saved.id, "ghost-id");
    assert_eq!(view.len(), 1);
    assert_eq!(view.records()[0].id, "ghost-id");
}

#[test]
fn view_submit_invalid_form_mutates_nothing() {
    let (store, view) = test_view();
    let before_doc = store.read_document("books").unwrap();

    let bad = form("D", "Frank Herbert");
    assert!(view.submit(&bad, None).is_err());

    assert_eq!(store.read_document("books").unwrap(), before_doc);
    assert!(view.is_empty());
}

#[test]
fn view_create_without_image_fails() {
    let (_, view) = test_view();
    let mut f = form("Dune", "Frank Herbert");
    f.image = None;

    match view.submit(&f, None).unwrap_err() {
        AppError::Validation { field, reason } => {
            assert_eq!(field, "image");
            assert_eq!(reason, "missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn view_delete_removes_record() {
    let view = seeded_view(&[("First", 100), ("Second", 200)]);
    let id = view.records()[0].id.clone();

    view.delete(&id).unwrap();
    assert_eq!(view.len(), 1);
    assert!(view.get(&id).is_none());
}

#[test]
fn view_delete_missing_id_is_success() {
    let view = seeded_view(&[("First", 100)]);

    view.delete("no-such-id").unwrap();
    assert_eq!(view.len(), 1);
}

#[test]
fn view_sorted_by_page_count_desc() {
    // AA=100, BB=50, CC=200 pages; descending order is CC, AA, BB.
    let view = seeded_view(&[("AA", 100), ("BB", 50), ("CC", 200)]);

    let sorted = view.sorted_filtered(Some(SortKey::PageCount), Direction::Desc, "");
    let titles: Vec<&str> = sorted.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["CC", "AA", "BB"]);
}

#[test]
fn view_sort_is_stable_on_equal_keys() {
    let view = seeded_view(&[("First", 100), ("Second", 100), ("Third", 100)]);

    let sorted = view.sorted_filtered(Some(SortKey::PageCount), Direction::Asc, "");
    let titles: Vec<&str> = sorted.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
}

#[test]
fn view_no_sort_key_keeps_current_order() {
    let view = seeded_view(&[("Zebra", 1), ("Apple", 2)]);

    let unsorted = view.sorted_filtered(None, Direction::Asc, "");
    let titles: Vec<&str> = unsorted.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Zebra", "Apple"]);
}

#[test]
fn view_search_is_case_insensitive() {
    let view = seeded_view(&[("Dune", 412), ("Foundation", 255)]);

    let found = view.sorted_filtered(None, Direction::Asc, "dUn");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Dune");
}

#[test]
fn view_search_matches_author_too() {
    let (_, view) = test_view();
    view.submit(&form("Dune", "Frank Herbert"), None).unwrap();
    view.submit(&form("Foundation", "Isaac Asimov"), None)
        .unwrap();

    let found = view.sorted_filtered(None, Direction::Asc, "asimov");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Foundation");
}

#[test]
fn view_move_before_reorders_in_memory() {
    let view = seeded_view(&[("AA", 1), ("BB", 2), ("CC", 3)]);
    let ids: Vec<String> = view.records().iter().map(|r| r.id.clone()).collect();

    view.move_before(&ids[2], &ids[0]);
    let titles: Vec<String> = view.records().iter().map(|r| r.title.clone()).collect();
    assert_eq!(titles, ["CC", "AA", "BB"]);
}

#[test]
fn view_move_before_noop_cases() {
    let view = seeded_view(&[("AA", 1), ("BB", 2)]);
    let before = view.records();
    let ids: Vec<String> = before.iter().map(|r| r.id.clone()).collect();

    view.move_before(&ids[0], &ids[0]);
    view.move_before("missing", &ids[0]);
    view.move_before(&ids[0], "missing");

    assert_eq!(view.records(), before);
}

#[test]
fn view_reload_discards_manual_reorder() {
    let view = seeded_view(&[("AA", 1), ("BB", 2)]);
    let ids: Vec<String> = view.records().iter().map(|r| r.id.clone()).collect();

    view.move_before(&ids[1], &ids[0]);
    assert_eq!(view.records()[0].id, ids[1]);

    view.load().unwrap();
    assert_eq!(view.records()[0].id, ids[0]);
}

// ========== AUTH ==========

#[test]
fn auth_register_and_login() {
    let auth = test_auth(test_store());

    let user = auth.register("alice@example.com", "password123").unwrap();
    assert_eq!(user.email, "alice@example.com");

    let (logged_in, token) = auth.login("alice@example.com", "password123").unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(!token.is_empty());
}

#[test]
fn auth_duplicate_email_rejected() {
    let auth = test_auth(test_store());
    auth.register("alice@example.com", "password123").unwrap();

    match auth.register("alice@example.com", "different1").unwrap_err() {
        AppError::Auth(AuthError::EmailAlreadyInUse) => {}
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn auth_unknown_user_and_wrong_password() {
    let auth = test_auth(test_store());
    auth.register("bob@example.com", "password123").unwrap();

    match auth.login("ghost@example.com", "password123").unwrap_err() {
        AppError::Auth(AuthError::UserNotFound) => {}
        other => panic!("unexpected error: {other}"),
    }

    match auth.login("bob@example.com", "wrongpass").unwrap_err() {
        AppError::Auth(AuthError::WrongPassword) => {}
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn auth_weak_password_and_invalid_email() {
    let auth = test_auth(test_store());

    match auth.register("carl@example.com", "abc").unwrap_err() {
        AppError::Auth(AuthError::WeakPassword) => {}
        other => panic!("unexpected error: {other}"),
    }

    match auth.register("not-an-email", "password123").unwrap_err() {
        AppError::Auth(AuthError::InvalidEmail) => {}
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn auth_registration_disabled() {
    let auth = AuthService::new(test_store(), SessionGate::new(), 30, false);

    assert!(auth.register("new@example.com", "password123").is_err());
}

#[test]
fn auth_validate_and_logout() {
    let auth = test_auth(test_store());
    auth.register("dora@example.com", "password123").unwrap();
    let (_, token) = auth.login("dora@example.com", "password123").unwrap();

    let user = auth.validate_token(&token).unwrap().unwrap();
    assert_eq!(user.email, "dora@example.com");
    assert!(auth.validate_token("invalid_token").unwrap().is_none());

    auth.logout(&token).unwrap();
    assert!(auth.validate_token(&token).unwrap().is_none());
}

#[test]
fn auth_change_password() {
    let auth = test_auth(test_store());
    auth.register("eve@example.com", "oldpass1").unwrap();

    auth.change_password("eve@example.com", "newpass1").unwrap();

    assert!(auth.login("eve@example.com", "oldpass1").is_err());
    assert!(auth.login("eve@example.com", "newpass1").is_ok());
}

#[test]
fn auth_drives_session_gate() {
    let auth = test_auth(test_store());
    assert_eq!(auth.gate().current(), SessionState::Loading);

    auth.restore(None).unwrap();
    assert_eq!(auth.gate().current(), SessionState::Unauthenticated);

    auth.register("fay@example.com", "password123").unwrap();
    let (user, token) = auth.login("fay@example.com", "password123").unwrap();
    assert_eq!(auth.gate().current(), SessionState::Authenticated(user.id));

    auth.logout(&token).unwrap();
    assert_eq!(auth.gate().current(), SessionState::Unauthenticated);
}

#[test]
fn auth_restore_with_valid_token() {
    let store = test_store();
    let auth = test_auth(store.clone());
    auth.register("gus@example.com", "password123").unwrap();
    let (user, token) = auth.login("gus@example.com", "password123").unwrap();

    // A second service over the same store, as after a restart: restoring the
    // cached token moves its fresh gate straight to authenticated.
    let restored = AuthService::new(store, SessionGate::new(), 30, true);
    restored.restore(Some(&token)).unwrap();
    assert_eq!(
        restored.gate().current(),
        SessionState::Authenticated(user.id)
    );
}

// ========== CONFIG ==========

#[test]
fn config_parse_toml() {
    let toml = r#"
[server]
bind = "127.0.0.1:9090"
title = "Test Catalog"

[database]
path = "/tmp/test.db"

[auth]
registration = "disabled"
session_days = 7

[catalog]
document_id = "shared-books"
placeholder_image = "https://example.com/cover.png"
max_image_bytes = 1048576
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9090);
    assert_eq!(config.server.title, "Test Catalog");
    assert!(!config.auth.registration_enabled());
    assert_eq!(config.auth.session_days, 7);
    assert_eq!(config.catalog.document_id, "shared-books");
    assert_eq!(config.catalog.max_image_bytes, 1_048_576);
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8080);
    assert!(config.auth.registration_enabled());
    assert_eq!(config.catalog.document_id, "books");
    assert_eq!(config.catalog.max_image_bytes, 5 * 1024 * 1024);
    assert_eq!(config.catalog.placeholder_image, PLACEHOLDER);
}

#[test]
fn config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[server]\ntitle = \"From File\"\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.server.title, "From File");
}

// ========== CONCURRENT SESSIONS (documented limitation) ==========

#[test]
fn racing_replace_all_is_last_writer_wins() {
    let store = test_store();
    let gateway_a = CatalogGateway::new(store.clone(), "books");
    let gateway_b = CatalogGateway::new(store, "books");
    gateway_a.ensure_initialized().unwrap();

    // Both sessions snapshot the same (empty) catalog, then write
    // independently; the later write silently discards the earlier one.
    let snapshot_a = gateway_a.fetch_all().unwrap();
    let snapshot_b = gateway_b.fetch_all().unwrap();

    let record = |id: &str, title: &str| Record {
        id: id.to_string(),
        title: title.to_string(),
        author: "Author".to_string(),
        publish_date: 20200101,
        page_count: 10,
        image_ref: PLACEHOLDER.to_string(),
    };

    let mut catalog_a = snapshot_a;
    catalog_a.push(record("a", "From A"));
    gateway_a.replace_all(&catalog_a).unwrap();

    let mut catalog_b = snapshot_b;
    catalog_b.push(record("b", "From B"));
    gateway_b.replace_all(&catalog_b).unwrap();

    let final_catalog = gateway_a.fetch_all().unwrap();
    assert_eq!(final_catalog.len(), 1);
    assert_eq!(final_catalog[0].id, "b");
}
