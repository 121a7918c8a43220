//! Admin review classification
//!
//! Turns free-text reviews into one of the catalog's ranking labels using
//! the configured LLM.

use cinerank_core::ranking::{allowed_rankings, render_prompt, resolve_label};
use cinerank_core::{LlmClient, Ranking};
use std::sync::Arc;

use crate::error::AppError;

pub struct ReviewRanker {
    llm: Arc<dyn LlmClient>,
    template: String,
}

impl ReviewRanker {
    pub fn new(llm: Arc<dyn LlmClient>, template: impl Into<String>) -> Self {
        Self {
            llm,
            template: template.into(),
        }
    }

    /// Classify `review` against `catalog`
    ///
    /// The reply must exactly name one of the non-sentinel rankings once
    /// surrounding whitespace is trimmed. Anything else is an upstream error.
    pub async fn classify(&self, catalog: &[Ranking], review: &str) -> Result<Ranking, AppError> {
        if allowed_rankings(catalog).is_empty() {
            return Err(AppError::Internal(
                "Ranking catalog has no assignable labels".to_string(),
            ));
        }

        let prompt = render_prompt(&self.template, catalog, review);
        let reply = self.llm.generate(&prompt).await?;
        let label = reply.trim();

        tracing::debug!(model = self.llm.model(), label, "Classifier replied");

        resolve_label(catalog, label)
            .ok_or_else(|| AppError::Upstream(format!("Classifier returned unknown label: {label:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cinerank_core::ranking::{NOT_APPLICABLE_VALUE, UNRANKED_VALUE};
    use cinerank_core::Result;
    use std::sync::Mutex;

    /// Replies with a fixed string and remembers the last prompt
    struct Scripted {
        reply: String,
        last_prompt: Mutex<Option<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LlmClient for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn catalog() -> Vec<Ranking> {
        vec![
            Ranking::new("Unranked", UNRANKED_VALUE),
            Ranking::new("Positive", 10),
            Ranking::new("Negative", 30),
            Ranking::new("Not_Ranked", NOT_APPLICABLE_VALUE),
        ]
    }

    #[tokio::test]
    async fn test_classify_trims_and_resolves() {
        let llm = Scripted::new("  Positive\n");
        let ranker = ReviewRanker::new(llm.clone(), "Choose from {rankings}: ");

        let ranking = ranker.classify(&catalog(), "Great movie").await.unwrap();
        assert_eq!(ranking, Ranking::new("Positive", 10));

        let prompt = llm.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, "Choose from Positive,Negative: Great movie");
    }

    #[tokio::test]
    async fn test_unknown_label_is_upstream_error() {
        let ranker = ReviewRanker::new(Scripted::new("Mixed"), "{rankings}");
        assert!(matches!(
            ranker.classify(&catalog(), "Hmm").await,
            Err(AppError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_sentinel_label_is_rejected() {
        let ranker = ReviewRanker::new(Scripted::new("Not_Ranked"), "{rankings}");
        assert!(matches!(
            ranker.classify(&catalog(), "Hmm").await,
            Err(AppError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_internal_error() {
        let llm = Scripted::new("Positive");
        let ranker = ReviewRanker::new(llm.clone(), "{rankings}");
        let sentinels_only = vec![Ranking::not_ranked()];

        assert!(matches!(
            ranker.classify(&sentinels_only, "Hmm").await,
            Err(AppError::Internal(_))
        ));
        assert!(llm.last_prompt.lock().unwrap().is_none());
    }
}
