//! Scripted inference provider for deterministic analyzer tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use notelens_core::sync::IgnoreLock;
use notelens_core::{Error, GenerateRequest, InferenceProvider, Result};

/// Inference provider that replays a fixed sequence of responses.
///
/// Records every prompt it receives and counts calls, so tests can assert
/// exactly how many backend round-trips an analyzer made and what it asked
/// for. Once the scripted replies run out, the fallback reply repeats; with
/// no fallback, further calls fail like an unreachable backend.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

enum ScriptedReply {
    Text(String),
    Failure(String),
}

impl ScriptedProvider {
    /// Creates a provider that replays `replies` in order.
    #[must_use]
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|reply| ScriptedReply::Text(reply.into()))
                    .collect(),
            ),
            fallback: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Creates a provider that returns the same reply forever.
    #[must_use]
    pub fn repeating<S: Into<String>>(reply: S) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(reply.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queues a backend failure after the already-queued replies.
    #[must_use]
    pub fn then_failure<S: Into<String>>(self, message: S) -> Self {
        self.replies
            .lock_ignore_poison()
            .push_back(ScriptedReply::Failure(message.into()));
        self
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock_ignore_poison().clone()
    }
}

#[async_trait]
impl InferenceProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock_ignore_poison()
            .push(request.prompt.clone());

        let next = self.replies.lock_ignore_poison().pop_front();
        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Failure(message)) => Err(Error::Provider(message)),
            None => match &self.fallback {
                Some(reply) => Ok(reply.clone()),
                None => Err(Error::Provider("scripted replies exhausted".to_owned())),
            },
        }
    }
}
