use crate::ai::retry::{evaluate_retry, RetryPolicy};
use crate::ai::{RemoteTranslator, TranslationPrompt, TranslationRequest};
use crate::time::Sleeper;
use log::{debug, error, info, warn};
use std::ops::Range;
use std::time::Duration;
use thiserror::Error;

/// Result for one slot of a client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTranslation {
    Translated(String),
    /// A single text the service kept answering with the wrong element count.
    Degraded,
}

impl SlotTranslation {
    pub fn as_str(&self) -> &str {
        match self {
            SlotTranslation::Translated(text) => text,
            SlotTranslation::Degraded => "",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            SlotTranslation::Translated(text) => text,
            SlotTranslation::Degraded => String::new(),
        }
    }
}

/// The remote call kept failing; none of the texts have a translation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("translation of {texts} text(s) failed after {attempts} attempt(s): {last_error}")]
pub struct BatchFailure {
    pub texts: usize,
    pub attempts: u32,
    pub last_error: String,
}

enum Reply {
    Matched(Vec<String>),
    Mismatch,
}

/// Sends batches to a [`RemoteTranslator`] and enforces the one-output-per-input
/// contract.
pub struct TranslationClient {
    remote: Box<dyn RemoteTranslator>,
    prompt: TranslationPrompt,
    policy: RetryPolicy,
    request_delay: Duration,
    sleeper: Box<dyn Sleeper>,
    remote_calls: u64,
}

impl TranslationClient {
    pub fn new(
        remote: Box<dyn RemoteTranslator>,
        prompt: TranslationPrompt,
        policy: RetryPolicy,
        request_delay: Duration,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            remote,
            prompt,
            policy,
            request_delay,
            sleeper,
            remote_calls: 0,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn prompt(&self) -> &TranslationPrompt {
        &self.prompt
    }

    /// Number of remote invocations so far, retries included.
    pub fn remote_calls(&self) -> u64 {
        self.remote_calls
    }

    /// Translates `texts`, returning exactly one slot per input.
    ///
    /// When the reply does not hold one string per input, the range is split
    /// in half (first half `n / 2`) and both halves are resolved depth-first,
    /// left before right. A single text that still mismatches is degraded.
    /// If any sub-request exhausts its retries the whole call fails.
    pub fn call(
        &mut self,
        texts: &[String],
        target_lang: &str,
    ) -> Result<Vec<SlotTranslation>, BatchFailure> {
        let mut resolved = Vec::with_capacity(texts.len());
        let mut pending: Vec<Range<usize>> = vec![0..texts.len()];

        while let Some(range) = pending.pop() {
            if range.is_empty() {
                continue;
            }

            let slice = &texts[range.clone()];
            match self.request_with_retries(slice, target_lang)? {
                Reply::Matched(translations) => {
                    resolved.extend(translations.into_iter().map(SlotTranslation::Translated));
                }
                Reply::Mismatch if slice.len() == 1 => {
                    warn!("Giving up on a single text after a count mismatch; leaving it empty.");
                    resolved.push(SlotTranslation::Degraded);
                }
                Reply::Mismatch => {
                    let midpoint = range.start + slice.len() / 2;
                    warn!(
                        "Retrying with smaller batches: {} + {} texts.",
                        midpoint - range.start,
                        range.end - midpoint
                    );
                    pending.push(midpoint..range.end);
                    pending.push(range.start..midpoint);
                }
            }
        }

        Ok(resolved)
    }

    fn request_with_retries(
        &mut self,
        texts: &[String],
        target_lang: &str,
    ) -> Result<Reply, BatchFailure> {
        let prompt = self
            .prompt
            .render(texts, target_lang)
            .map_err(|err| BatchFailure {
                texts: texts.len(),
                attempts: 0,
                last_error: err.to_string(),
            })?;
        let request = TranslationRequest {
            texts,
            target_lang,
            prompt,
        };

        info!("Sending translation request for {} texts.", texts.len());
        let mut attempts_made = 0;
        loop {
            attempts_made += 1;
            self.remote_calls += 1;

            match self.remote.translate(&request) {
                Ok(reply) => {
                    debug!("Received API response (attempt {attempts_made}): {reply}");
                    self.sleeper.sleep(self.request_delay);
                    return Ok(match parse_reply(&reply) {
                        Some(translations) if translations.len() == texts.len() => {
                            info!("Successfully translated {} texts.", texts.len());
                            Reply::Matched(translations)
                        }
                        Some(translations) => {
                            error!(
                                "Translation count mismatch: expected {}, got {} (attempt {attempts_made})",
                                texts.len(),
                                translations.len()
                            );
                            Reply::Mismatch
                        }
                        None => {
                            error!(
                                "Reply is not a JSON array of strings (attempt {attempts_made}): {reply}"
                            );
                            Reply::Mismatch
                        }
                    });
                }
                Err(err) => {
                    error!(
                        "Error during translation attempt {attempts_made}/{} with {}: {err}",
                        self.policy.max_attempts,
                        self.remote.name()
                    );
                    let decision = evaluate_retry(&err, self.policy, attempts_made);
                    if let Some(backoff) = decision.quota_backoff {
                        warn!("Quota exhausted; backing off for {backoff:?}.");
                        self.sleeper.sleep(backoff);
                    }
                    if !decision.should_retry {
                        error!("Max retries reached. Returning no result for {} texts.", texts.len());
                        return Err(BatchFailure {
                            texts: texts.len(),
                            attempts: attempts_made,
                            last_error: err.to_string(),
                        });
                    }
                    self.sleeper.sleep(decision.delay);
                }
            }
        }
    }
}

/// Parses a reply as a JSON array of strings, tolerating a Markdown code fence.
fn parse_reply(reply: &str) -> Option<Vec<String>> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|body| body.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str::<Vec<String>>(unfenced.trim()).ok()
}
