//! Scripted chat transports shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use feda::BatchClassifier;
use feda::llm::{ChatRequest, ChatTransport, CompletionClient, LlmError, RetryPolicy};
use serde_json::{Value, json};

/// Replays canned replies in order; fails with HTTP 500 once they run out.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatTransport for ScriptedTransport {
    fn send(&self, _request: &ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::Http { status: 500 }))
    }
}

/// Reads the feedback array out of the prompt and answers by keyword.
pub struct KeywordTransport {
    calls: AtomicUsize,
}

impl KeywordTransport {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatTransport for KeywordTransport {
    fn send(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &request.messages[1].content;
        let start = prompt.find("FEEDBACK ITEMS:").unwrap() + "FEEDBACK ITEMS:".len();
        let end = prompt.rfind("JSON OUTPUT:").unwrap();
        let texts: Vec<String> = serde_json::from_str(prompt[start..end].trim()).unwrap();

        let results: Vec<Value> = texts.iter().map(|t| classify(t)).collect();
        Ok(serde_json::to_string_pretty(&results).unwrap())
    }
}

fn classify(text: &str) -> Value {
    let lowered = text.to_lowercase();
    if lowered.contains("crash") {
        json!({"sentiment": "negative", "category": "Bug & Issues", "subcategory": "Functional Bugs", "details": ["crash"], "summary": "App crashes repeatedly"})
    } else if lowered.contains("login") {
        json!({"sentiment": "negative", "category": "Bug", "subcategory": "login_error", "details": ["Login Error"], "summary": "User cannot log in."})
    } else if lowered.contains("slow") {
        json!({"sentiment": "bad", "category": "Performance", "subcategory": "Speed", "details": [], "summary": "The app is slow to respond"})
    } else if lowered.contains("theme") {
        json!({"sentiment": "neutral", "category": "Feature Requests", "subcategory": "Customization", "details": ["theming"], "summary": "User asks for more themes"})
    } else {
        json!({"sentiment": "positive", "category": "User Satisfaction", "subcategory": "Positive Feedback", "details": ["praise"], "summary": "User is happy with the app"})
    }
}

pub fn classifier(transport: Arc<dyn ChatTransport>) -> BatchClassifier {
    BatchClassifier::new(
        CompletionClient::new(transport).with_retry_policy(RetryPolicy::immediate(3)),
    )
}
