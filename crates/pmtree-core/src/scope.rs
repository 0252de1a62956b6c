use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::PmError;
use crate::state::State;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkFailure {
    pub scope: String,
    pub message: String,
    pub panicked: bool,
}

/// Cancellable group of concurrent work tied to part of a node's life.
///
/// Work is cancelled cooperatively: once the token fires, a launched future
/// is dropped at its next suspension point. A failing or panicking task is
/// recorded in [`WorkScope::failures`] and never cancels anything else.
#[derive(Clone)]
pub struct WorkScope {
    name: Arc<str>,
    token: CancellationToken,
    failures: State<Vec<WorkFailure>>,
}

impl WorkScope {
    pub(crate) fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
            failures: State::new(Vec::new()),
        }
    }

    /// Narrower scope cancelled together with `self`, or on its own.
    pub(crate) fn child(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            token: self.token.child_token(),
            failures: State::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn failures(&self) -> State<Vec<WorkFailure>> {
        self.failures.clone()
    }

    pub(crate) fn cancel(&self) {
        if self.is_active() {
            log::trace!("cancelling work scope {}", self.name);
            self.token.cancel();
        }
    }

    pub fn launch<F>(&self, work: F) -> Result<JoinHandle<()>, PmError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.launch_fallible(async move {
            work.await;
            Ok::<(), Infallible>(())
        })
    }

    /// Spawns `work` on the ambient tokio runtime. The returned handle
    /// completes once the work finished, failed or was cancelled.
    pub fn launch_fallible<F, E>(&self, work: F) -> Result<JoinHandle<()>, PmError>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| PmError::NoRuntime)?;
        if !self.is_active() {
            return Err(PmError::ScopeCancelled {
                scope: self.name.to_string(),
            });
        }

        let token = self.token.clone();
        let task = runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Ok(()),
                outcome = work => outcome.map_err(|err| err.to_string()),
            }
        });

        let failures = self.failures.clone();
        let scope = Arc::clone(&self.name);
        Ok(runtime.spawn(async move {
            let failure = match task.await {
                Ok(Ok(())) => None,
                Ok(Err(message)) => Some(WorkFailure {
                    scope: scope.to_string(),
                    message,
                    panicked: false,
                }),
                Err(err) if err.is_panic() => Some(WorkFailure {
                    scope: scope.to_string(),
                    message: err.to_string(),
                    panicked: true,
                }),
                Err(_) => None,
            };
            if let Some(failure) = failure {
                log::error!("work in scope {} failed: {}", failure.scope, failure.message);
                failures.update(|all| all.push(failure));
            }
        }))
    }
}

impl fmt::Debug for WorkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkScope")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod tests;
