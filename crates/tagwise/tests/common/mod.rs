use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tagwise_core::{ChatMessage, Metadata, ProviderConfig};
use tagwise_upstream::{Provider, UpstreamClient, UpstreamError};

/// Provider answering from a fixed script, recording every request
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, UpstreamError>>>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, UpstreamError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::Transport("script exhausted".to_string())))
    }
}

pub fn client_for(provider: &Arc<ScriptedProvider>) -> UpstreamClient {
    let provider: Arc<dyn Provider> = provider.clone();
    UpstreamClient::new(provider, &ProviderConfig::default())
}

pub fn sample_metadata() -> Vec<Metadata> {
    let todos: [(&[&str], &[&str]); 4] = [
        (&["groceries", "errands"], &[]),
        (&["work"], &["q3-report"]),
        (&["work", "meetings"], &[]),
        (&["groceries"], &["weekend"]),
    ];
    todos
        .iter()
        .map(|(ai, user)| {
            let mut meta = Metadata::new();
            meta.merge_tags(*ai, *user);
            meta
        })
        .collect()
}
