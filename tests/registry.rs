//! Registry and locator behaviour against on-disk application descriptors.

use std::sync::{Arc, Mutex};
use std::thread;

use tokio::sync::mpsc;

use websocket_server::error::{ActivationError, ConfigurationError, LocateError};
use websocket_server::handler::connection::Outbound;
use websocket_server::handler::{Connection, Handler, Message};
use websocket_server::registry::{Application, ApplicationManagers, HandlerManagerFactory};
use websocket_server::HandlerManager;

mod common;

/// Name the handler answers with.
fn name_of(handler: &Arc<dyn Handler>) -> String {
    let (tx, mut rx) = mpsc::unbounded_channel();
    handler.on_message(&Connection::new("test", "/", tx), Message::Text("who".into()));
    match rx.try_recv().unwrap() {
        Outbound::Message(Message::Text(name)) => name,
        other => panic!("unexpected reply {other:?}"),
    }
}

fn activate(descriptor: Option<&str>) -> (tempfile::TempDir, Arc<HandlerManager>, Arc<Mutex<Vec<String>>>) {
    let tmp = tempfile::tempdir().unwrap();
    if let Some(descriptor) = descriptor {
        common::write_descriptor(tmp.path(), descriptor);
    }
    let log = Arc::new(Mutex::new(Vec::new()));
    let factory = HandlerManagerFactory::new(Arc::new(common::test_types(log.clone())));
    let manager = factory
        .activate(&Application::new("app", tmp.path()), &ApplicationManagers::new())
        .unwrap();
    (tmp, manager, log)
}

fn try_activate(descriptor: &str) -> (Result<Arc<HandlerManager>, ActivationError>, Vec<String>) {
    let tmp = tempfile::tempdir().unwrap();
    common::write_descriptor(tmp.path(), descriptor);
    let log = Arc::new(Mutex::new(Vec::new()));
    let factory = HandlerManagerFactory::new(Arc::new(common::test_types(log.clone())));
    let result = factory.create(&Application::new("app", tmp.path()));
    let log = log.lock().unwrap().clone();
    (result, log)
}

const CHAT_FIRST: &str = r#"
[[handler]]
handler-name = "chatHandler"
handler-class = "test.Name"

[[handler]]
handler-name = "adminHandler"
handler-class = "test.Name"

[[handler-mapping]]
url-pattern = "/chat/*"
handler-name = "chatHandler"

[[handler-mapping]]
url-pattern = "/chat/admin/*"
handler-name = "adminHandler"
"#;

const ADMIN_FIRST: &str = r#"
[[handler]]
handler-name = "chatHandler"
handler-class = "test.Name"

[[handler]]
handler-name = "adminHandler"
handler-class = "test.Name"

[[handler-mapping]]
url-pattern = "/chat/admin/*"
handler-name = "adminHandler"

[[handler-mapping]]
url-pattern = "chat/*"
handler-name = "chatHandler"
"#;

#[test]
fn test_initialize_builds_every_handler_and_mapping_in_order() {
    let (_tmp, manager, log) = activate(Some(
        r#"
        [[handler]]
        handler-name = "a"
        handler-class = "test.Name"

        [[handler]]
        handler-name = "b"
        handler-class = "echo"

        [[handler]]
        handler-name = "c"
        handler-class = "broadcast"

        [[handler-mapping]]
        url-pattern = "/z"
        handler-name = "c"

        [[handler-mapping]]
        url-pattern = "/y/*"
        handler-name = "a"

        [[handler-mapping]]
        url-pattern = "x"
        handler-name = "b"

        [[handler-mapping]]
        url-pattern = "/w"
        handler-name = "a"
        "#,
    ));

    assert_eq!(manager.handlers().handler_count(), 3);
    let mappings: Vec<(String, String)> = manager
        .handler_mappings()
        .iter()
        .map(|m| (m.url_pattern().to_string(), m.handler_name().to_string()))
        .collect();
    assert_eq!(
        mappings,
        [
            ("/z".to_string(), "c".to_string()),
            ("/y/*".to_string(), "a".to_string()),
            ("/x".to_string(), "b".to_string()),
            ("/w".to_string(), "a".to_string()),
        ]
    );
    assert_eq!(*log.lock().unwrap(), ["a"]);
}

/// Configuration pitfall: a broad pattern declared first shadows a more
/// specific one declared later.
#[test]
fn test_declaration_order_not_specificity_decides() {
    let (_tmp, manager, _) = activate(Some(CHAT_FIRST));

    let handler = manager.locate(&"/chat/admin/login").unwrap();
    assert_eq!(name_of(&handler), "chatHandler");
}

#[test]
fn test_specific_pattern_declared_first() {
    let (_tmp, manager, _) = activate(Some(ADMIN_FIRST));

    assert_eq!(name_of(&manager.locate(&"/chat/admin/login").unwrap()), "adminHandler");
    assert_eq!(name_of(&manager.locate(&"/chat/general").unwrap()), "chatHandler");

    match manager.locate(&"/other") {
        Err(LocateError::NotFound { path }) => assert_eq!(path, "/other"),
        Err(other) => panic!("unexpected error {other}"),
        Ok(handler) => panic!("unexpected match {}", name_of(&handler)),
    }
}

#[test]
fn test_handler_without_mappings_is_never_located() {
    let (_tmp, manager, _) = activate(Some(
        r#"
        [[handler]]
        handler-name = "lonely"
        handler-class = "test.Name"
        "#,
    ));

    assert!(manager.handler("lonely").is_some());
    for path in ["/", "/lonely", "/a/b/c"] {
        assert!(matches!(manager.locate(&path), Err(LocateError::NotFound { .. })));
    }
}

#[test]
fn test_missing_application_folder_gives_empty_registry() {
    let tmp = tempfile::tempdir().unwrap();
    let factory = HandlerManagerFactory::new(Arc::new(common::test_types(Default::default())));

    let manager = factory
        .create(&Application::new("ghost", tmp.path().join("not-deployed")))
        .unwrap();

    assert_eq!(manager.handlers().handler_count(), 0);
    assert!(manager.handler_mappings().is_empty());
    assert!(manager.locate(&"/anything").is_err());
}

#[test]
fn test_undeclared_handler_reference_instantiates_nothing() {
    let (result, log) = try_activate(
        r#"
        [[handler]]
        handler-name = "chatHandler"
        handler-class = "test.Name"

        [[handler-mapping]]
        url-pattern = "/admin/*"
        handler-name = "adminHandler"
        "#,
    );

    assert!(matches!(
        result,
        Err(ActivationError::Configuration(ConfigurationError::UnknownHandler { .. }))
    ));
    assert!(log.is_empty(), "handlers were initialized: {log:?}");
}

#[test]
fn test_missing_handler_class_aborts_activation() {
    let (result, log) = try_activate(
        r#"
        [[handler]]
        handler-name = "ok"
        handler-class = "test.Name"

        [[handler]]
        handler-name = "classless"
        "#,
    );

    assert!(matches!(
        result,
        Err(ActivationError::Configuration(ConfigurationError::MissingHandlerClass { .. }))
    ));
    assert!(log.is_empty());
}

#[test]
fn test_duplicate_handler_name_keeps_first_declaration() {
    let (_tmp, manager, log) = activate(Some(
        r#"
        [[handler]]
        handler-name = "chatHandler"
        handler-class = "test.Name"

        [[handler]]
        handler-name = "chatHandler"
        handler-class = "echo"

        [[handler-mapping]]
        url-pattern = "/chat/*"
        handler-name = "chatHandler"
        "#,
    ));

    assert_eq!(manager.handlers().handler_count(), 1);
    assert_eq!(*log.lock().unwrap(), ["chatHandler"]);
    // An echo handler would answer "who".
    assert_eq!(name_of(&manager.locate(&"/chat/x").unwrap()), "chatHandler");
}

#[test]
fn test_concurrent_locate_is_consistent() {
    let (_tmp, manager, _) = activate(Some(ADMIN_FIRST));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let manager = manager.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let (path, expected) = if i % 2 == 0 {
                        ("/chat/admin/login", "adminHandler")
                    } else {
                        ("/chat/general", "chatHandler")
                    };
                    assert_eq!(name_of(&manager.locate(&path).unwrap()), expected);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}
