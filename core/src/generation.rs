//! Text generation with a bounded retry on rate limiting.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// A backend that turns a prompt into generated text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait before retry `n` is `backoff_step * n`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_step * retry
    }
}

/// Whether an error looks like the provider throttling us.
///
/// Matches `429`, `rate` or `quota` anywhere in the error chain, ignoring case.
#[must_use]
pub fn is_rate_limited(err: &anyhow::Error) -> bool {
    let text = format!("{err:#}").to_lowercase();
    ["429", "rate", "quota"].iter().any(|needle| text.contains(needle))
}

/// Run `generator` until it succeeds, a non rate-limit error occurs, or the
/// attempts run out.
///
/// Never fails: errors are rendered into the returned text. `on_notice` is
/// told about every rate-limited attempt that will be retried.
pub async fn generate_with_retry<G, F>(
    generator: &G,
    prompt: &str,
    policy: RetryPolicy,
    mut on_notice: F,
) -> String
where
    G: TextGenerator + ?Sized,
    F: FnMut(&str),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match generator.generate(prompt).await {
            Ok(text) => return text,
            Err(e) => e,
        };

        if !is_rate_limited(&err) {
            warn!(attempt, error = %format!("{err:#}"), "text generation failed");
            return format!("Error: {err:#}");
        }

        if attempt >= max_attempts {
            warn!(attempts = attempt, "text generation rate limit persisted");
            return format!(
                "Warning: text generation rate limit reached after {attempt} attempts.\n\n\
                 Full error: `{err:#}`\n\n\
                 The free tier allows only a few requests per minute. \
                 Please wait about 60 seconds and try again."
            );
        }

        let wait = policy.backoff(attempt);
        warn!(
            attempt,
            wait_secs = wait.as_secs(),
            "rate limited, retrying"
        );
        on_notice(&format!(
            "Rate limit hit. Waiting {}s before retry ({attempt}/{})...",
            wait.as_secs(),
            max_attempts - 1
        ));
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}
