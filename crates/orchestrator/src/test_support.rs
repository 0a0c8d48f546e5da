//! Scripted provider double for orchestrator tests

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use credential_pool::{CredentialPool, PoolSettings};
use provider::{ApiKey, CallError, ChunkStream, GenerationRequest, TextProvider};
use tokio::time::Instant;

pub(crate) fn keys(n: usize) -> Vec<ApiKey> {
    (0..n)
        .map(|i| ApiKey::new(format!("AIzaSyTestKey{i:04}")))
        .collect()
}

pub(crate) fn pool(n: usize) -> CredentialPool {
    CredentialPool::new(keys(n), PoolSettings::default())
}

/// One scripted provider response, consumed in call order.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Reply(String),
    /// Reply with the prompt that was sent.
    Echo,
    Fail(CallError),
    /// Never answer.
    Hang,
    Stream(Vec<StreamItem>),
}

#[derive(Debug, Clone)]
pub(crate) enum StreamItem {
    Chunk(String),
    Fail(CallError),
    Hang,
}

pub(crate) fn reply(text: &str) -> Step {
    Step::Reply(text.to_string())
}

pub(crate) fn chunks(parts: &[&str]) -> Step {
    Step::Stream(
        parts
            .iter()
            .map(|p| StreamItem::Chunk(p.to_string()))
            .collect(),
    )
}

pub(crate) fn rate_limited() -> CallError {
    CallError::RateLimited {
        daily: false,
        message: "Resource has been exhausted".into(),
    }
}

pub(crate) fn daily_quota() -> CallError {
    CallError::RateLimited {
        daily: true,
        message: "Quota exceeded for requests per day".into(),
    }
}

pub(crate) fn forbidden() -> CallError {
    CallError::Unauthorized("API key not valid".into())
}

pub(crate) fn server_fault() -> CallError {
    CallError::Server {
        status: Some(503),
        message: "The model is overloaded".into(),
    }
}

/// What the orchestrator sent on one call.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub key: String,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub model: Option<String>,
    pub json_mode: bool,
    pub at: Instant,
}

pub(crate) struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    repeat: Option<Step>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            repeat: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `step`.
    pub fn repeating(step: Step) -> Self {
        Self {
            repeat: Some(step),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn keys_used(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.key).collect()
    }

    fn record(&self, key: &ApiKey, request: &GenerationRequest) -> Step {
        self.calls.lock().unwrap().push(RecordedCall {
            key: key.expose().clone(),
            prompt: request.prompt.clone(),
            temperature: request.config.temperature,
            model: request.config.model.clone(),
            json_mode: request.config.json_mode,
            at: Instant::now(),
        });
        let next = self.steps.lock().unwrap().pop_front();
        next.or_else(|| self.repeat.clone())
            .unwrap_or_else(|| Step::Fail(CallError::Server {
                status: None,
                message: "script exhausted".into(),
            }))
    }
}

fn scripted_stream(items: Vec<StreamItem>) -> ChunkStream {
    Box::pin(async_stream::stream! {
        for item in items {
            match item {
                StreamItem::Chunk(text) => yield Ok(text),
                StreamItem::Fail(err) => {
                    yield Err(err);
                    return;
                }
                StreamItem::Hang => std::future::pending::<()>().await,
            }
        }
    })
}

impl TextProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn generate<'a>(
        &'a self,
        key: &'a ApiKey,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = provider::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            match self.record(key, request) {
                Step::Reply(text) => Ok(text),
                Step::Echo => Ok(request.prompt.clone()),
                Step::Fail(err) => Err(err),
                Step::Hang => std::future::pending().await,
                Step::Stream(_) => panic!("stream step scripted for a non-streaming call"),
            }
        })
    }

    fn generate_stream<'a>(
        &'a self,
        key: &'a ApiKey,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = provider::Result<ChunkStream>> + Send + 'a>> {
        Box::pin(async move {
            match self.record(key, request) {
                Step::Stream(items) => Ok(scripted_stream(items)),
                Step::Reply(text) => Ok(scripted_stream(vec![StreamItem::Chunk(text)])),
                Step::Echo => Ok(scripted_stream(vec![StreamItem::Chunk(
                    request.prompt.clone(),
                )])),
                Step::Fail(err) => Err(err),
                Step::Hang => std::future::pending().await,
            }
        })
    }
}
