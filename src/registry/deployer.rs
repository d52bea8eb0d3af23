//! Application discovery and concurrent activation.
//!
//! # Data Flow
//! ```text
//! webapps_dir/
//!     → discover_applications (one Application per subdirectory)
//!     → activate_all: one blocking worker per application
//!         → HandlerManagerFactory::activate
//!         → every worker joined; a panic counts as a failure
//!     → ActivationReport
//! ```

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::error::ActivationError;
use crate::registry::factory::{Application, ApplicationManagers, HandlerManagerFactory};

/// Every direct subdirectory of `webapps_dir`, named after the directory.
///
/// Application paths are canonical, so they compare equal to the absolute
/// paths file-system events report.
pub fn discover_applications(webapps_dir: &Path) -> io::Result<Vec<Application>> {
    let webapps_dir = fs::canonicalize(webapps_dir)?;
    let mut applications = Vec::new();
    for entry in fs::read_dir(&webapps_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %entry.path().display(), "Skipping application with non UTF-8 name");
            continue;
        };
        applications.push(Application::new(name, entry.path()));
    }
    applications.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(applications)
}

/// Outcome of activating a batch of applications.
#[derive(Debug, Default)]
pub struct ActivationReport {
    pub activated: Vec<String>,
    pub failed: Vec<(String, ActivationError)>,
}

impl ActivationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Activate all applications concurrently.
///
/// Descriptor reads block, so each application is activated on the blocking
/// pool. A failing application is reported and skipped; the rest proceed.
/// Every application ends up in exactly one of `activated` or `failed`.
pub async fn activate_all(
    factory: Arc<HandlerManagerFactory>,
    managers: Arc<ApplicationManagers>,
    applications: Vec<Application>,
) -> ActivationReport {
    let workers: Vec<_> = applications
        .into_iter()
        .map(|application| {
            let factory = factory.clone();
            let managers = managers.clone();
            let name = application.name.clone();
            let worker = tokio::task::spawn_blocking(move || {
                factory.activate(&application, &managers).map(|_| ())
            });
            (name, worker)
        })
        .collect();

    let mut report = ActivationReport::default();
    for (name, worker) in workers {
        match worker.await {
            Ok(Ok(())) => report.activated.push(name),
            Ok(Err(e)) => report.failed.push((name, e)),
            Err(e) => {
                tracing::error!(application = %name, error = %e, "Activation worker panicked");
                let error = ActivationError::Aborted {
                    application: name.clone(),
                    message: e.to_string(),
                };
                report.failed.push((name, error));
            }
        }
    }
    report.activated.sort_unstable();

    tracing::info!(
        activated = report.activated.len(),
        failed = report.failed.len(),
        "Application activation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::descriptor_path;
    use crate::handler::HandlerTypes;

    #[test]
    fn test_discovery_lists_directories_only() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("b")).unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        fs::write(tmp.path().join("README"), "not an app").unwrap();

        let names: Vec<_> = discover_applications(tmp.path())
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_discovery_yields_absolute_paths_for_relative_dir() {
        let tmp = tempfile::tempdir_in(".").unwrap();
        let relative = Path::new(tmp.path().file_name().unwrap());
        fs::create_dir(relative.join("chat")).unwrap();

        let apps = discover_applications(relative).unwrap();
        assert!(apps[0].webapp_path.is_absolute());
        assert_eq!(apps[0].webapp_path, fs::canonicalize(relative.join("chat")).unwrap());
    }

    #[tokio::test]
    async fn test_one_bad_application_does_not_block_others() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["alpha", "beta", "broken"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        let bad = descriptor_path(&tmp.path().join("broken"));
        fs::create_dir_all(bad.parent().unwrap()).unwrap();
        fs::write(&bad, "[[handler]]\nhandler-name = \"x\"\n").unwrap();

        let factory = Arc::new(HandlerManagerFactory::new(Arc::new(HandlerTypes::with_builtins())));
        let managers = Arc::new(ApplicationManagers::new());
        let report = activate_all(
            factory,
            managers.clone(),
            discover_applications(tmp.path()).unwrap(),
        )
        .await;

        assert_eq!(report.activated, ["alpha", "beta"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert_eq!(managers.applications(), ["alpha", "beta"]);
    }

    struct Explodes;

    impl crate::handler::Handler for Explodes {
        fn init(
            &mut self,
            _config: crate::handler::HandlerConfig,
        ) -> Result<(), crate::error::HandlerInitError> {
            panic!("init exploded");
        }

        fn on_message(&self, _conn: &crate::handler::Connection, _message: crate::handler::Message) {}
    }

    #[tokio::test]
    async fn test_panicking_activation_is_reported_as_failure() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("calm")).unwrap();
        let descriptor = descriptor_path(&tmp.path().join("volatile"));
        fs::create_dir_all(descriptor.parent().unwrap()).unwrap();
        fs::write(
            &descriptor,
            "[[handler]]\nhandler-name = \"boom\"\nhandler-class = \"explodes\"\n",
        )
        .unwrap();

        let mut types = HandlerTypes::with_builtins();
        types.register("explodes", || Box::new(Explodes));
        let factory = Arc::new(HandlerManagerFactory::new(Arc::new(types)));
        let managers = Arc::new(ApplicationManagers::new());
        let report = activate_all(
            factory,
            managers.clone(),
            discover_applications(tmp.path()).unwrap(),
        )
        .await;

        assert!(!report.is_success());
        assert_eq!(report.activated, ["calm"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "volatile");
        assert!(matches!(report.failed[0].1, ActivationError::Aborted { .. }));
        assert_eq!(managers.applications(), ["calm"]);
    }
}
