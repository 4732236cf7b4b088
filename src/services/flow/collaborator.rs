//! Collaborator Calls
//!
//! Wraps every external narrative call with a per-attempt timeout, bounded
//! retries with exponential backoff for transient failures, and
//! cancellation. Invalid output is never retried.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use qa_auditor_llm::{LlmError, LlmResult};

use crate::models::{CollaboratorSettings, IssueKind};

/// Why a collaborator call produced no usable result.
#[derive(Debug, Clone, PartialEq)]
pub enum CollaboratorFailure {
    /// Every attempt timed out
    Timeout { attempts: u32 },
    /// The collaborator answered with output that broke its contract
    Invalid(LlmError),
    /// Non-transient error, or transient errors exhausted the retry budget
    Failed { error: LlmError, attempts: u32 },
    /// The run was cancelled while the call was pending
    Cancelled,
}

impl CollaboratorFailure {
    /// Issue kind recorded for a degraded interaction.
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            CollaboratorFailure::Timeout { .. } => IssueKind::CollaboratorTimeout,
            CollaboratorFailure::Invalid(_) => IssueKind::CollaboratorInvalid,
            CollaboratorFailure::Failed { .. } => IssueKind::CollaboratorFailed,
            CollaboratorFailure::Cancelled => IssueKind::Cancelled,
        }
    }
}

impl std::fmt::Display for CollaboratorFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollaboratorFailure::Timeout { attempts } => {
                write!(f, "timed out on all {} attempt(s)", attempts)
            }
            CollaboratorFailure::Invalid(e) => write!(f, "invalid output: {}", e),
            CollaboratorFailure::Failed { error, attempts } => {
                write!(f, "failed after {} attempt(s): {}", attempts, error)
            }
            CollaboratorFailure::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of one attempt.
enum Attempt<T> {
    Done(T),
    TimedOut,
    Error(LlmError),
}

/// Run `op` under the timeout/retry policy in `settings`.
///
/// `label` identifies the call in logs (e.g. "analysis INT-7").
pub async fn call_with_retry<T, F, Fut>(
    settings: &CollaboratorSettings,
    token: &CancellationToken,
    label: &str,
    mut op: F,
) -> Result<T, CollaboratorFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LlmResult<T>>,
{
    let max_retries = settings.max_retries;
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..=max_retries {
        if token.is_cancelled() {
            return Err(CollaboratorFailure::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(CollaboratorFailure::Cancelled),
            result = tokio::time::timeout(settings.timeout(), op()) => match result {
                Ok(Ok(value)) => Attempt::Done(value),
                Ok(Err(e)) => Attempt::Error(e),
                Err(_) => Attempt::TimedOut,
            },
        };

        let wait = match outcome {
            Attempt::Done(value) => return Ok(value),
            Attempt::Error(e) if e.is_invalid_output() => {
                return Err(CollaboratorFailure::Invalid(e));
            }
            Attempt::Error(e) if !e.is_retryable() => {
                return Err(CollaboratorFailure::Failed {
                    error: e,
                    attempts: attempt + 1,
                });
            }
            Attempt::Error(e) => {
                let delay = settings.backoff(attempt);
                let wait = e
                    .retry_after_secs()
                    .map_or(delay, |r| delay.max(Duration::from_secs(r)));
                if attempt < max_retries {
                    warn!(
                        "[Collaborator] {}: {} on attempt {}/{}, retrying in {}ms",
                        label,
                        e,
                        attempt + 1,
                        max_retries + 1,
                        wait.as_millis()
                    );
                }
                last_error = Some(e);
                wait
            }
            Attempt::TimedOut => {
                if attempt < max_retries {
                    warn!(
                        "[Collaborator] {}: timed out after {}ms on attempt {}/{}",
                        label,
                        settings.timeout_ms,
                        attempt + 1,
                        max_retries + 1
                    );
                }
                last_error = None;
                settings.backoff(attempt)
            }
        };

        if attempt < max_retries {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(CollaboratorFailure::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    let attempts = max_retries + 1;
    Err(match last_error {
        Some(error) => CollaboratorFailure::Failed { error, attempts },
        None => CollaboratorFailure::Timeout { attempts },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_settings() -> CollaboratorSettings {
        CollaboratorSettings {
            timeout_ms: 50,
            max_retries: 2,
            retry_backoff_ms: 1,
            max_backoff_ms: 5,
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let token = CancellationToken::new();
        let result = call_with_retry(&fast_settings(), &token, "t", || async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = call_with_retry(&fast_settings(), &token, "t", move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(LlmError::NetworkError {
                        message: "reset".to_string(),
                    })
                } else {
                    Ok("ok")
                }
            }
        })
        .await;
        assert_eq!(result, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = call_with_retry(&fast_settings(), &token, "t", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(LlmError::ServerError {
                    message: "503".to_string(),
                    status: Some(503),
                })
            }
        })
        .await;
        assert!(matches!(
            result,
            Err(CollaboratorFailure::Failed { attempts: 3, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_output_not_retried() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = call_with_retry(&fast_settings(), &token, "t", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::schema("empathy score 140 is outside [0, 100]")) }
        })
        .await;
        assert!(matches!(result, Err(CollaboratorFailure::Invalid(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            result.unwrap_err().issue_kind(),
            IssueKind::CollaboratorInvalid
        );
    }

    #[tokio::test]
    async fn test_timeouts() {
        let token = CancellationToken::new();
        let result: Result<(), _> = call_with_retry(&fast_settings(), &token, "t", || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(CollaboratorFailure::Timeout { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let token = CancellationToken::new();
        token.cancel();
        let result = call_with_retry(&fast_settings(), &token, "t", || async { Ok(1) }).await;
        assert_eq!(result, Err(CollaboratorFailure::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_during_call() {
        let token = CancellationToken::new();
        let settings = CollaboratorSettings {
            timeout_ms: 10_000,
            ..fast_settings()
        };
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let result: Result<(), _> = call_with_retry(&settings, &token, "t", || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(CollaboratorFailure::Cancelled));
    }
}
