// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing prompts: "present an informational choice with N labeled
//! options and return the selected index".

use async_trait::async_trait;
use thiserror::Error;

/// Errors from dialog operations
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("dialog has no options")]
    NoOptions,

    #[error("dialog failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Warning,
    Error,
}

/// A modal choice. `default` is returned when the user dismisses the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoicePrompt {
    pub kind: DialogKind,
    pub title: String,
    pub message: String,
    pub detail: String,
    pub options: Vec<String>,
    pub default: usize,
}

impl ChoicePrompt {
    pub fn new(kind: DialogKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            detail: String::new(),
            options: vec!["OK".to_string()],
            default: 0,
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_option(mut self, default: usize) -> Self {
        self.default = default;
        self
    }

    /// Message and detail joined for single-body surfaces.
    pub fn body(&self) -> String {
        if self.detail.is_empty() {
            self.message.clone()
        } else {
            format!("{}\n\n{}", self.message, self.detail)
        }
    }

    /// Clamp an answer to a valid option index, falling back to the default.
    pub fn resolve(&self, index: usize) -> usize {
        if index < self.options.len() {
            index
        } else {
            self.default.min(self.options.len().saturating_sub(1))
        }
    }
}

/// Capability for presenting a blocking choice to the user.
#[async_trait]
pub trait DialogAdapter: Clone + Send + Sync + 'static {
    /// Present the prompt and wait for the selected option index.
    async fn present_choice(&self, prompt: &ChoicePrompt) -> Result<usize, DialogError>;
}

/// Desktop prompts through the notification daemon.
///
/// On freedesktop systems the options become notification actions and the
/// call blocks until one is invoked or the notification is closed. Elsewhere
/// the notification is informational only and the default option is returned.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopDialogAdapter;

impl DesktopDialogAdapter {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            // Pre-set the bundle identifier so mac-notification-sys skips its
            // AppleScript lookup, which blocks without Automation permission.
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl DialogAdapter for DesktopDialogAdapter {
    async fn present_choice(&self, prompt: &ChoicePrompt) -> Result<usize, DialogError> {
        if prompt.options.is_empty() {
            return Err(DialogError::NoOptions);
        }
        let prompt = prompt.clone();
        tokio::task::spawn_blocking(move || {
            tracing::info!(title = %prompt.title, options = ?prompt.options, "presenting dialog");
            show_blocking(&prompt).map(|index| prompt.resolve(index))
        })
        .await
        .map_err(|e| DialogError::Failed(e.to_string()))?
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn show_blocking(prompt: &ChoicePrompt) -> Result<usize, DialogError> {
    let mut notification = notify_rust::Notification::new();
    notification
        .summary(&prompt.title)
        .body(&prompt.body())
        .timeout(notify_rust::Timeout::Never);
    for (i, label) in prompt.options.iter().enumerate() {
        notification.action(&i.to_string(), label);
    }
    let handle = notification.show().map_err(|e| DialogError::Failed(e.to_string()))?;

    let mut chosen = prompt.default;
    handle.wait_for_action(|action| {
        // "__closed" and unknown identifiers keep the default
        if let Ok(i) = action.parse::<usize>() {
            chosen = i;
        }
    });
    Ok(chosen)
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn show_blocking(prompt: &ChoicePrompt) -> Result<usize, DialogError> {
    notify_rust::Notification::new()
        .summary(&prompt.title)
        .body(&prompt.body())
        .show()
        .map_err(|e| DialogError::Failed(e.to_string()))?;
    Ok(prompt.default)
}

/// Non-interactive prompts: logs the prompt and answers with its default.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessDialogAdapter;

#[async_trait]
impl DialogAdapter for HeadlessDialogAdapter {
    async fn present_choice(&self, prompt: &ChoicePrompt) -> Result<usize, DialogError> {
        if prompt.options.is_empty() {
            return Err(DialogError::NoOptions);
        }
        let answer = prompt.resolve(prompt.default);
        tracing::warn!(
            title = %prompt.title,
            text = %prompt.message,
            detail = %prompt.detail,
            answer = %prompt.options[answer],
            "dialog (headless)"
        );
        Ok(answer)
    }
}

/// Routes prompts to the desktop or headless adapter, chosen at startup.
#[derive(Clone, Copy, Debug)]
pub enum DialogRouter {
    Desktop(DesktopDialogAdapter),
    Headless(HeadlessDialogAdapter),
}

impl DialogRouter {
    pub fn new(headless: bool) -> Self {
        if headless {
            DialogRouter::Headless(HeadlessDialogAdapter)
        } else {
            DialogRouter::Desktop(DesktopDialogAdapter::new())
        }
    }
}

#[async_trait]
impl DialogAdapter for DialogRouter {
    async fn present_choice(&self, prompt: &ChoicePrompt) -> Result<usize, DialogError> {
        match self {
            DialogRouter::Desktop(d) => d.present_choice(prompt).await,
            DialogRouter::Headless(h) => h.present_choice(prompt).await,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ChoicePrompt, DialogAdapter, DialogError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    /// Recorded prompt and the answer given
    #[derive(Debug, Clone)]
    pub struct PromptCall {
        pub prompt: ChoicePrompt,
        pub answer: usize,
    }

    #[derive(Default)]
    struct FakeDialogState {
        answers: VecDeque<usize>,
        calls: Vec<PromptCall>,
        fail: bool,
        delay: Option<Duration>,
    }

    /// Fake dialog adapter: answers from a script, then with each prompt's default.
    #[derive(Clone, Default)]
    pub struct FakeDialogAdapter {
        inner: Arc<Mutex<FakeDialogState>>,
    }

    impl FakeDialogAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue answers returned by subsequent prompts, in order.
        pub fn with_answers(answers: impl IntoIterator<Item = usize>) -> Self {
            let fake = Self::default();
            fake.inner.lock().answers.extend(answers);
            fake
        }

        /// Make every prompt fail.
        pub fn failing() -> Self {
            let fake = Self::default();
            fake.inner.lock().fail = true;
            fake
        }

        /// Hold every prompt open for `delay` before answering.
        pub fn slow(self, delay: Duration) -> Self {
            self.inner.lock().delay = Some(delay);
            self
        }

        pub fn calls(&self) -> Vec<PromptCall> {
            self.inner.lock().calls.clone()
        }

        pub fn titles(&self) -> Vec<String> {
            self.inner.lock().calls.iter().map(|c| c.prompt.title.clone()).collect()
        }
    }

    #[async_trait]
    impl DialogAdapter for FakeDialogAdapter {
        async fn present_choice(&self, prompt: &ChoicePrompt) -> Result<usize, DialogError> {
            let delay = self.inner.lock().delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let mut inner = self.inner.lock();
            if inner.fail {
                return Err(DialogError::Failed("fake failure".to_string()));
            }
            let scripted = inner.answers.pop_front().unwrap_or(prompt.default);
            let answer = prompt.resolve(scripted);
            inner.calls.push(PromptCall { prompt: prompt.clone(), answer });
            Ok(answer)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDialogAdapter, PromptCall};

#[cfg(test)]
#[path = "dialog_tests.rs"]
mod tests;
