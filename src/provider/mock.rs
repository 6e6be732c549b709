//! Deterministic in-process providers.
//!
//! `HashEmbedder` maps each lowercase word to a bucket chosen by its blake3
//! hash, so texts sharing words land close together. `ScriptedCompletion`
//! answers from a fixed reply or a queued failure. Both count their calls.

use super::{ChatMessage, CompletionClient, CompletionOptions, EmbeddingClient};
use crate::error::ProviderError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Bag-of-words embedder with hashed buckets.
pub struct HashEmbedder {
    dims: usize,
    calls: AtomicUsize,
    texts_embedded: AtomicUsize,
    failure: Mutex<Option<ProviderError>>,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims: dims.max(1),
            calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Number of `embed` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of individual texts embedded so far
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with `err` (None restores success).
    pub fn fail_with(&self, err: Option<ProviderError>) {
        *self.failure.lock() = err;
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = blake3::hash(word.to_lowercase().as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as usize
                % self.dims;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn model(&self) -> &str {
        "hash-bow"
    }
}

/// Completion fake returning a fixed reply.
pub struct ScriptedCompletion {
    reply: String,
    calls: AtomicUsize,
    failures: Mutex<VecDeque<ProviderError>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queue a failure for the next call.
    pub fn push_failure(&self, err: ProviderError) {
        self.failures.lock().push_back(err);
    }

    /// Sleep this long before answering every later call.
    pub fn stall_for(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Messages received by every call so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(messages.to_vec());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.reply.clone())
    }
}
