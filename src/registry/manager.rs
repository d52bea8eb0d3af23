//! Per-application handler registry.
//!
//! # Responsibilities
//! - Load the application's descriptor and instantiate its handlers once
//! - Hold handlers, ordered mappings and application init parameters
//! - Resolve requests through the injected locator
//!
//! # Design Decisions
//! - Single writer, many readers: tables are built off to the side and
//!   published with one atomic store, so readers never see a partial table
//! - Reads (`locate`, `handler`) are lock-free snapshot loads
//! - Writers (`add_handler`, `replace_handlers`, `reload`) serialize on a
//!   mutex held only around the swap itself
//! - Mappings bind to handler names; every published table has all names
//!   present, so a matching pattern always yields a handler

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::descriptor::InitParameters;
use crate::config::loader::load_descriptor;
use crate::error::{ActivationError, ConfigurationError, LocateError};
use crate::handler::{Handler, HandlerConfig, HandlerContext, HandlerTypes};
use crate::registry::table::{HandlerTable, MappingEntry};
use crate::routing::{HandlerRequest, ResourceLocator};

/// The live handler registry of one deployed application.
pub struct HandlerManager {
    application: String,
    webapp_path: PathBuf,
    types: Arc<HandlerTypes>,
    locator: Arc<dyn ResourceLocator>,
    table: ArcSwap<HandlerTable>,
    init_parameters: DashMap<String, String>,
    initialized: AtomicBool,
    /// Serializes table swaps.
    writer: Mutex<()>,
}

impl HandlerManager {
    /// An empty, uninitialized registry.
    pub fn new(
        application: impl Into<String>,
        webapp_path: impl Into<PathBuf>,
        types: Arc<HandlerTypes>,
        locator: Arc<dyn ResourceLocator>,
    ) -> Self {
        Self {
            application: application.into(),
            webapp_path: webapp_path.into(),
            types,
            locator,
            table: ArcSwap::from_pointee(HandlerTable::empty()),
            init_parameters: DashMap::new(),
            initialized: AtomicBool::new(false),
            writer: Mutex::new(()),
        }
    }

    /// Load the descriptor, instantiate and initialize every handler, then
    /// publish the table. Runs once; a second call is rejected.
    pub fn initialize(self: &Arc<Self>) -> Result<(), ActivationError> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(ActivationError::AlreadyInitialized {
                webapp_path: self.webapp_path.clone(),
            });
        }

        let staged = self.build_table()?;
        self.commit(staged);

        let table = self.table.load();
        tracing::info!(
            application = %self.application,
            handlers = table.handler_count(),
            mappings = table.mappings().len(),
            "Handler registry initialized"
        );
        Ok(())
    }

    /// Re-read the descriptor and swap in a freshly built handler set.
    ///
    /// On error the current table and init parameters stay as they were.
    pub fn reload(self: &Arc<Self>) -> Result<(), ActivationError> {
        let staged = match self.build_table() {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!(
                    application = %self.application,
                    error = %e,
                    "Reload failed, keeping current handlers"
                );
                return Err(e);
            }
        };

        self.commit(staged);
        tracing::info!(application = %self.application, "Handler registry reloaded");
        Ok(())
    }

    /// Build a complete table without touching any live state.
    fn build_table(self: &Arc<Self>) -> Result<Staged, ActivationError> {
        let Some(descriptor) = load_descriptor(&self.webapp_path)? else {
            return Ok(Staged {
                table: HandlerTable::empty(),
                context: None,
            });
        };

        // Every type must be known before anything is constructed.
        if let Some(unknown) = descriptor
            .handlers
            .iter()
            .find(|h| !self.types.contains(&h.class))
        {
            return Err(ConfigurationError::UnknownHandlerClass {
                handler: unknown.name.clone(),
                class: unknown.class.clone(),
            }
            .into());
        }

        let staged = Arc::new(StagedContext {
            registry: Arc::downgrade(self),
            webapp_path: self.webapp_path.clone(),
            parameters: descriptor.context_parameters,
            published: AtomicBool::new(false),
        });
        let context: Arc<dyn HandlerContext> = staged.clone();
        let weak_context = Arc::downgrade(&context);

        let mut handlers: HashMap<String, Arc<dyn Handler>> = HashMap::new();
        for declared in descriptor.handlers {
            let mut instance = self.types.instantiate(&declared.class).ok_or_else(|| {
                ConfigurationError::UnknownHandlerClass {
                    handler: declared.name.clone(),
                    class: declared.class.clone(),
                }
            })?;

            let config = HandlerConfig::new(
                weak_context.clone(),
                declared.name.clone(),
                self.webapp_path.clone(),
                declared.init_parameters,
            );
            instance
                .init(config)
                .map_err(|source| ActivationError::HandlerInitialization {
                    handler: declared.name.clone(),
                    source,
                })?;

            tracing::debug!(
                application = %self.application,
                handler = %declared.name,
                class = %declared.class,
                "Handler initialized"
            );
            handlers.insert(declared.name, Arc::from(instance));
        }

        let mappings = descriptor
            .mappings
            .into_iter()
            .map(|m| MappingEntry::new(m.url_pattern, m.handler_name))
            .collect();

        let table = HandlerTable::new(handlers, mappings)?.with_context(context);
        Ok(Staged {
            table,
            context: Some(staged),
        })
    }

    /// Publish a built table, then apply its context parameters.
    fn commit(&self, staged: Staged) {
        self.publish(staged.table);
        if let Some(context) = staged.context {
            for (name, value) in context.parameters.iter() {
                self.add_init_parameter(name, value);
            }
            context.published.store(true, Ordering::Release);
        }
    }

    fn publish(&self, table: HandlerTable) {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.table.store(Arc::new(table));
    }

    /// Insert or overwrite a handler. Visible to every later `locate`.
    pub fn add_handler(&self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        let name = name.into();
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let next = self.table.load().with_handler(name.clone(), handler);
        self.table.store(Arc::new(next));
        tracing::debug!(application = %self.application, handler = %name, "Handler added");
    }

    /// Swap in a whole new handler set, keeping the mappings.
    ///
    /// Rejected if any mapping would reference a handler not in `handlers`.
    pub fn replace_handlers(
        &self,
        handlers: HashMap<String, Arc<dyn Handler>>,
    ) -> Result<(), ActivationError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let next = self.table.load().with_handlers(handlers)?;
        self.table.store(Arc::new(next));
        tracing::info!(application = %self.application, "Handler set replaced");
        Ok(())
    }

    /// The handler registered under `name`. Never creates one.
    pub fn handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.table.load().handler(name)
    }

    /// Snapshot of the currently published table.
    pub fn handlers(&self) -> Arc<HandlerTable> {
        self.table.load_full()
    }

    /// Mappings in declaration order.
    pub fn handler_mappings(&self) -> Vec<MappingEntry> {
        self.table.load().mappings().to_vec()
    }

    pub fn add_init_parameter(&self, name: impl Into<String>, value: impl Into<String>) {
        self.init_parameters.insert(name.into(), value.into());
    }

    pub fn init_parameter(&self, name: &str) -> Option<String> {
        self.init_parameters.get(name).map(|v| v.value().clone())
    }

    /// Resolve the handler responsible for `request`.
    pub fn locate(&self, request: &dyn HandlerRequest) -> Result<Arc<dyn Handler>, LocateError> {
        let table = self.table.load();
        self.locator.locate(&table, request)
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn webapp_path(&self) -> &Path {
        &self.webapp_path
    }

    pub fn locator(&self) -> &Arc<dyn ResourceLocator> {
        &self.locator
    }

    /// True once `initialize` has been called, whether or not it succeeded.
    ///
    /// A failed `initialize` publishes nothing and cannot be retried; use
    /// [`reload`](Self::reload) once the descriptor is fixed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

/// A table built off to the side, not yet published.
struct Staged {
    table: HandlerTable,
    context: Option<Arc<StagedContext>>,
}

/// What handlers of a new table see as their registry.
///
/// Until the table is published, the descriptor's context parameters shadow
/// the live ones without being applied to the registry. Afterwards every
/// lookup goes straight to the registry.
struct StagedContext {
    registry: Weak<HandlerManager>,
    webapp_path: PathBuf,
    parameters: InitParameters,
    published: AtomicBool,
}

impl HandlerContext for StagedContext {
    fn webapp_path(&self) -> &Path {
        &self.webapp_path
    }

    fn init_parameter(&self, name: &str) -> Option<String> {
        if !self.published.load(Ordering::Acquire) {
            if let Some(value) = self.parameters.get(name) {
                return Some(value.to_string());
            }
        }
        self.registry.upgrade()?.init_parameter(name)
    }

    fn handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.registry.upgrade()?.handler(name)
    }
}

impl std::fmt::Debug for HandlerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerManager")
            .field("application", &self.application)
            .field("webapp_path", &self.webapp_path)
            .field("table", &**self.table.load())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::config::loader::descriptor_path;
    use crate::error::HandlerInitError;
    use crate::handler::connection::Outbound;
    use crate::handler::{Connection, Message};
    use crate::routing::HandlerLocator;

    /// Records what it was initialized with.
    #[derive(Default)]
    struct Probe {
        name: String,
        context_greeting: Option<String>,
        own_param: Option<String>,
    }

    impl Handler for Probe {
        fn init(&mut self, config: HandlerConfig) -> Result<(), HandlerInitError> {
            self.name = config.handler_name().to_string();
            self.own_param = config.init_parameter("color").map(str::to_string);
            self.context_greeting = config
                .context()
                .and_then(|ctx| ctx.init_parameter("greeting"));
            if config.init_parameter("fail").is_some() {
                return Err(HandlerInitError::new("told to fail"));
            }
            Ok(())
        }

        fn on_message(&self, conn: &Connection, _message: Message) {
            conn.send(format!(
                "{}|{}|{}",
                self.name,
                self.own_param.as_deref().unwrap_or("-"),
                self.context_greeting.as_deref().unwrap_or("-")
            ));
        }
    }

    fn types() -> Arc<HandlerTypes> {
        let mut types = HandlerTypes::with_builtins();
        types.register("probe", || Box::new(Probe::default()));
        Arc::new(types)
    }

    fn manager_with(descriptor: &str) -> (tempfile::TempDir, Arc<HandlerManager>) {
        let tmp = tempfile::tempdir().unwrap();
        let path = descriptor_path(tmp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, descriptor).unwrap();
        let manager = Arc::new(HandlerManager::new(
            "app",
            tmp.path(),
            types(),
            Arc::new(HandlerLocator),
        ));
        (tmp, manager)
    }

    const CHAT: &str = r#"
        [[context-param]]
        param-name = "greeting"
        param-value = "hello"

        [[handler]]
        handler-name = "chatHandler"
        handler-class = "probe"
        [[handler.init-param]]
        param-name = "color"
        param-value = "blue"

        [[handler-mapping]]
        url-pattern = "/chat/*"
        handler-name = "chatHandler"
    "#;

    #[test]
    fn test_second_initialize_is_rejected() {
        let (_tmp, manager) = manager_with(CHAT);
        manager.initialize().unwrap();
        assert!(manager.is_initialized());
        assert!(matches!(
            manager.initialize(),
            Err(ActivationError::AlreadyInitialized { .. })
        ));
        assert_eq!(manager.handlers().handler_count(), 1);
    }

    #[test]
    fn test_context_params_visible_during_handler_init() {
        let (_tmp, manager) = manager_with(CHAT);
        manager.initialize().unwrap();
        assert_eq!(manager.init_parameter("greeting").as_deref(), Some("hello"));

        let handler = manager.locate(&"/chat/general").unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        handler.on_message(&Connection::new("app", "/chat/general", tx), "ping".into());
        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Message(Message::Text("chatHandler|blue|hello".into()))
        );
    }

    #[test]
    fn test_unknown_class_fails_before_any_instantiation() {
        let (_tmp, manager) = manager_with(
            r#"
            [[handler]]
            handler-name = "a"
            handler-class = "probe"
            [[handler.init-param]]
            param-name = "fail"
            param-value = "yes"

            [[handler]]
            handler-name = "b"
            handler-class = "com.example.Missing"
            "#,
        );

        // `a` would fail its init; the unknown class of `b` must win.
        match manager.initialize() {
            Err(ActivationError::Configuration(ConfigurationError::UnknownHandlerClass {
                handler,
                class,
            })) => {
                assert_eq!(handler, "b");
                assert_eq!(class, "com.example.Missing");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(manager.handlers().handler_count(), 0);
    }

    #[test]
    fn test_handler_init_failure_is_fatal() {
        let (_tmp, manager) = manager_with(
            r#"
            [[handler]]
            handler-name = "broken"
            handler-class = "probe"
            [[handler.init-param]]
            param-name = "fail"
            param-value = "yes"
            "#,
        );

        assert!(matches!(
            manager.initialize(),
            Err(ActivationError::HandlerInitialization { handler, .. }) if handler == "broken"
        ));
        assert!(manager.handler("broken").is_none());
    }

    #[test]
    fn test_add_handler_overwrites_and_is_located() {
        let (_tmp, manager) = manager_with(CHAT);
        manager.initialize().unwrap();

        let replacement: Arc<dyn Handler> = Arc::new(Probe::default());
        manager.add_handler("chatHandler", replacement.clone());

        let located = manager.locate(&"/chat/general").unwrap();
        assert!(std::ptr::addr_eq(Arc::as_ptr(&located), Arc::as_ptr(&replacement)));
    }

    #[test]
    fn test_replace_handlers_rejects_dangling_mapping() {
        let (_tmp, manager) = manager_with(CHAT);
        manager.initialize().unwrap();
        let before = manager.handler("chatHandler").unwrap();

        let err = manager.replace_handlers(HashMap::new()).unwrap_err();
        assert!(matches!(err, ActivationError::DanglingMapping { handler, .. } if handler == "chatHandler"));

        let still = manager.handler("chatHandler").unwrap();
        assert!(std::ptr::addr_eq(Arc::as_ptr(&before), Arc::as_ptr(&still)));
    }

    #[test]
    fn test_reload_swaps_in_new_instances() {
        let (tmp, manager) = manager_with(CHAT);
        manager.initialize().unwrap();
        let before = manager.handler("chatHandler").unwrap();

        manager.reload().unwrap();
        let after = manager.handler("chatHandler").unwrap();
        assert!(!std::ptr::addr_eq(Arc::as_ptr(&before), Arc::as_ptr(&after)));

        // A broken descriptor keeps the last good table.
        fs::write(descriptor_path(tmp.path()), "[[handler]]\nhandler-name = \"x\"\n").unwrap();
        assert!(manager.reload().is_err());
        let kept = manager.handler("chatHandler").unwrap();
        assert!(std::ptr::addr_eq(Arc::as_ptr(&after), Arc::as_ptr(&kept)));
    }

    fn reply(handler: &Arc<dyn Handler>) -> String {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        handler.on_message(&Connection::new("app", "/", tx), "ping".into());
        match rx.try_recv().unwrap() {
            Outbound::Message(Message::Text(text)) => text,
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_reload_shows_new_context_params_to_new_handlers() {
        let (tmp, manager) = manager_with(CHAT);
        manager.initialize().unwrap();

        fs::write(descriptor_path(tmp.path()), CHAT.replace("\"hello\"", "\"bonjour\"")).unwrap();
        manager.reload().unwrap();

        assert_eq!(manager.init_parameter("greeting").as_deref(), Some("bonjour"));
        let handler = manager.locate(&"/chat/general").unwrap();
        assert_eq!(reply(&handler), "chatHandler|blue|bonjour");
    }

    #[test]
    fn test_failed_reload_leaves_init_parameters_untouched() {
        let (tmp, manager) = manager_with(CHAT);
        manager.initialize().unwrap();

        fs::write(
            descriptor_path(tmp.path()),
            r#"
            [[context-param]]
            param-name = "greeting"
            param-value = "changed"

            [[context-param]]
            param-name = "added"
            param-value = "yes"

            [[handler]]
            handler-name = "broken"
            handler-class = "probe"
            [[handler.init-param]]
            param-name = "fail"
            param-value = "yes"
            "#,
        )
        .unwrap();

        assert!(matches!(
            manager.reload(),
            Err(ActivationError::HandlerInitialization { .. })
        ));
        assert_eq!(manager.init_parameter("greeting").as_deref(), Some("hello"));
        assert_eq!(manager.init_parameter("added"), None);
        assert!(manager.handler("chatHandler").is_some());
    }

    #[test]
    fn test_failed_initialize_counts_as_initialized_but_publishes_nothing() {
        let (tmp, manager) = manager_with(
            r#"
            [[handler]]
            handler-name = "broken"
            handler-class = "probe"
            [[handler.init-param]]
            param-name = "fail"
            param-value = "yes"
            "#,
        );

        assert!(manager.initialize().is_err());
        assert!(manager.is_initialized());
        assert_eq!(manager.handlers().handler_count(), 0);
        assert!(matches!(
            manager.initialize(),
            Err(ActivationError::AlreadyInitialized { .. })
        ));

        fs::write(descriptor_path(tmp.path()), CHAT).unwrap();
        manager.reload().unwrap();
        assert!(manager.handler("chatHandler").is_some());
    }
}
