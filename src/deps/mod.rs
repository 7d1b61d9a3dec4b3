//! Dependency resolution orchestration
//!
//! Coordinates are handed to a [`DependencyResolver`] one at a time. The
//! resolver answers through a callback, possibly from another thread; the
//! orchestrator blocks on a single-slot channel until that answer arrives
//! before starting the next coordinate, so at most one resolution is ever in
//! flight.
//!
//! Individual failures never abort the batch. They are returned as
//! [`DependencyFailure`] values, one per well-formed coordinate that did not
//! end up in the enabled-library list.

mod resolver;

pub use resolver::LocalRepositoryResolver;

use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::models::{DependencyCoordinate, DependencyFailure};
use crate::registry::{CancellationToken, ProgressSink};
use crate::storage::{LocalLibrary, LocalLibraryList};

/// Terminal answer of a resolver for one coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Names of the artifacts now present in the shared local-libs directory
    Resolved(Vec<String>),
    /// The artifact exists but could not be fetched
    DownloadFailed(String),
    /// No repository has the artifact
    NotFound,
}

/// Completion callback handed to a resolver
pub type ResolutionCallback = Box<dyn FnOnce(Resolution) + Send + 'static>;

/// External artifact resolver
///
/// Implementations may call `on_complete` from any thread. Dropping it
/// without calling it counts as an interrupted resolution.
pub trait DependencyResolver {
    fn resolve(&self, coordinate: &DependencyCoordinate, on_complete: ResolutionCallback);
}

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Drives a batch of coordinates through a resolver into a project's
/// enabled-library list
pub struct DependencyOrchestrator<'a> {
    resolver: &'a dyn DependencyResolver,
    libraries: LocalLibraryList,
    local_libs_dir: PathBuf,
    poll_interval: Duration,
}

impl<'a> DependencyOrchestrator<'a> {
    pub fn new(
        resolver: &'a dyn DependencyResolver,
        libraries: LocalLibraryList,
        local_libs_dir: PathBuf,
    ) -> Self {
        Self {
            resolver,
            libraries,
            local_libs_dir,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// How often a pending resolution re-checks the cancellation token
    #[cfg(test)]
    fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Resolve every well-formed declaration in order
    ///
    /// Progress counts every declaration, malformed ones included. Once the
    /// token is cancelled no further resolution starts, and the pending and
    /// remaining coordinates are all recorded as interrupted.
    pub fn resolve_all<S: AsRef<str>>(
        &self,
        declarations: &[S],
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Vec<DependencyFailure> {
        let total = declarations.len();
        let mut failures = Vec::new();

        for (index, raw) in declarations.iter().enumerate() {
            let raw = raw.as_ref();
            progress.report(&format!(
                "Resolving dependency {}/{}: {}",
                index + 1,
                total,
                raw
            ));

            let coordinate = match raw.parse::<DependencyCoordinate>() {
                Ok(coordinate) => coordinate,
                Err(e) => {
                    warn!(declaration = raw, "{}", e);
                    continue;
                }
            };

            let failure = if cancel.is_cancelled() {
                Some(DependencyFailure::Interrupted { coordinate })
            } else {
                match self.await_resolution(&coordinate, cancel) {
                    Some(Resolution::Resolved(artifacts)) => self.record(&coordinate, &artifacts),
                    Some(Resolution::DownloadFailed(reason)) => {
                        Some(DependencyFailure::DownloadFailed { coordinate, reason })
                    }
                    Some(Resolution::NotFound) => Some(DependencyFailure::NotFound { coordinate }),
                    None => Some(DependencyFailure::Interrupted { coordinate }),
                }
            };

            if let Some(failure) = failure {
                warn!("{}", failure);
                failures.push(failure);
            }
        }

        info!(
            total,
            failed = failures.len(),
            "dependency resolution finished"
        );
        failures
    }

    fn await_resolution(
        &self,
        coordinate: &DependencyCoordinate,
        cancel: &CancellationToken,
    ) -> Option<Resolution> {
        let (tx, rx) = bounded(1);
        self.resolver.resolve(
            coordinate,
            Box::new(move |resolution| {
                // The receiver is gone only if the wait was abandoned
                let _ = tx.send(resolution);
            }),
        );

        loop {
            match rx.recv_timeout(self.poll_interval) {
                Ok(resolution) => return Some(resolution),
                Err(RecvTimeoutError::Timeout) if cancel.is_cancelled() => return None,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn record(
        &self,
        coordinate: &DependencyCoordinate,
        artifacts: &[String],
    ) -> Option<DependencyFailure> {
        let dependency = coordinate.to_string();
        let entries = artifacts
            .iter()
            .map(|name| LocalLibrary::for_artifact(&self.local_libs_dir, name, &dependency));

        match self.libraries.append(entries) {
            Ok(()) => {
                debug!(dependency = %dependency, artifacts = artifacts.len(), "dependency enabled");
                None
            }
            Err(e) => Some(DependencyFailure::Unrecorded {
                coordinate: coordinate.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::thread;
    use tempfile::TempDir;

    /// Answers from a fixed table on a background thread
    struct TableResolver {
        answers: HashMap<String, Resolution>,
        calls: Mutex<Vec<String>>,
    }

    impl TableResolver {
        fn new(answers: &[(&str, Resolution)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl DependencyResolver for TableResolver {
        fn resolve(&self, coordinate: &DependencyCoordinate, on_complete: ResolutionCallback) {
            let key = coordinate.to_string();
            self.calls.lock().unwrap().push(key.clone());
            let answer = self.answers.get(&key).cloned();
            thread::spawn(move || {
                // No entry: drop the callback unanswered
                if let Some(answer) = answer {
                    on_complete(answer);
                }
            });
        }
    }

    /// Keeps every callback without ever answering
    #[derive(Default)]
    struct StalledResolver {
        pending: Mutex<Vec<ResolutionCallback>>,
    }

    impl DependencyResolver for StalledResolver {
        fn resolve(&self, _coordinate: &DependencyCoordinate, on_complete: ResolutionCallback) {
            self.pending.lock().unwrap().push(on_complete);
        }
    }

    fn setup() -> (TempDir, LocalLibraryList, PathBuf) {
        let temp = TempDir::new().unwrap();
        let list = LocalLibraryList::new(temp.path().join("local_library"));
        list.clear().unwrap();
        let libs = temp.path().join("local_libs");
        (temp, list, libs)
    }

    #[test]
    fn test_malformed_and_failed_items_do_not_stop_the_batch() {
        let (_temp, list, libs) = setup();
        let resolver = TableResolver::new(&[
            ("a:b:1.0", Resolution::NotFound),
            ("c:d:2.0", Resolution::Resolved(vec!["d-2.0".into()])),
        ]);
        let messages = Mutex::new(Vec::new());
        let progress = |m: &str| messages.lock().unwrap().push(m.to_string());

        let orchestrator = DependencyOrchestrator::new(&resolver, list.clone(), libs);
        let failures = orchestrator.resolve_all(
            &["a:b:1.0", "bad-format", "c:d:2.0"],
            &progress,
            &CancellationToken::new(),
        );

        assert_eq!(*resolver.calls.lock().unwrap(), vec!["a:b:1.0", "c:d:2.0"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].to_string(), "Artifact not found: a:b:1.0");
        assert_eq!(
            *messages.lock().unwrap(),
            vec![
                "Resolving dependency 1/3: a:b:1.0",
                "Resolving dependency 2/3: bad-format",
                "Resolving dependency 3/3: c:d:2.0",
            ]
        );

        let enabled = list.load().unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "d-2.0");
        assert_eq!(enabled[0].dependency.as_deref(), Some("c:d:2.0"));
    }

    #[test]
    fn test_download_failure_keeps_reason() {
        let (_temp, list, libs) = setup();
        let resolver = TableResolver::new(&[(
            "x:y:3",
            Resolution::DownloadFailed("connection reset".into()),
        )]);

        let failures = DependencyOrchestrator::new(&resolver, list, libs).resolve_all(
            &["x:y:3"],
            &|_: &str| {},
            &CancellationToken::new(),
        );

        assert_eq!(
            failures,
            vec![DependencyFailure::DownloadFailed {
                coordinate: DependencyCoordinate::new("x", "y", "3"),
                reason: "connection reset".into(),
            }]
        );
    }

    #[test]
    fn test_dropped_callback_is_interrupted() {
        let (_temp, list, libs) = setup();
        let resolver = TableResolver::new(&[("c:d:2.0", Resolution::Resolved(vec!["d".into()]))]);

        let failures = DependencyOrchestrator::new(&resolver, list.clone(), libs).resolve_all(
            &["a:b:1.0", "c:d:2.0"],
            &|_: &str| {},
            &CancellationToken::new(),
        );

        assert!(matches!(
            failures.as_slice(),
            [DependencyFailure::Interrupted { .. }]
        ));
        assert_eq!(list.load().unwrap().len(), 1);
    }

    #[test]
    fn test_cancel_while_waiting() {
        let (_temp, list, libs) = setup();
        let resolver = StalledResolver::default();
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                cancel.cancel();
            })
        };

        let failures = DependencyOrchestrator::new(&resolver, list, libs)
            .with_poll_interval(Duration::from_millis(5))
            .resolve_all(&["a:b:1.0", "c:d:2.0"], &|_: &str| {}, &cancel);
        canceller.join().unwrap();

        // The pending item is interrupted and the second never starts
        assert_eq!(resolver.pending.lock().unwrap().len(), 1);
        assert_eq!(
            failures,
            vec![
                DependencyFailure::Interrupted {
                    coordinate: DependencyCoordinate::new("a", "b", "1.0"),
                },
                DependencyFailure::Interrupted {
                    coordinate: DependencyCoordinate::new("c", "d", "2.0"),
                },
            ]
        );
    }

    /// Resolves the first request and cancels the batch while doing so
    struct CancellingResolver {
        cancel: CancellationToken,
        calls: Mutex<Vec<String>>,
    }

    impl DependencyResolver for CancellingResolver {
        fn resolve(&self, coordinate: &DependencyCoordinate, on_complete: ResolutionCallback) {
            self.calls.lock().unwrap().push(coordinate.to_string());
            self.cancel.cancel();
            on_complete(Resolution::Resolved(vec![coordinate.artifact.clone()]));
        }
    }

    #[test]
    fn test_cancel_after_first_item_accounts_for_every_coordinate() {
        let (_temp, list, libs) = setup();
        let cancel = CancellationToken::new();
        let resolver = CancellingResolver {
            cancel: cancel.clone(),
            calls: Mutex::new(Vec::new()),
        };
        let declarations = ["a:b:1.0", "c:d:2.0", "e:f:3.0"];

        let failures = DependencyOrchestrator::new(&resolver, list.clone(), libs).resolve_all(
            &declarations,
            &|_: &str| {},
            &cancel,
        );

        assert_eq!(*resolver.calls.lock().unwrap(), vec!["a:b:1.0"]);
        let enabled = list.load().unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled.len() + failures.len(), declarations.len());
        assert_eq!(
            failures,
            vec![
                DependencyFailure::Interrupted {
                    coordinate: DependencyCoordinate::new("c", "d", "2.0"),
                },
                DependencyFailure::Interrupted {
                    coordinate: DependencyCoordinate::new("e", "f", "3.0"),
                },
            ]
        );
    }
}
