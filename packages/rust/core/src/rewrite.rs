//! Style-transfer rewrite of the original article.

use tracing::{info, instrument};

use contentlift_shared::{
    Article, ContentLiftError, ReferenceArticle, Result, RewriteResult, first_success,
};

use crate::collector::ReferencePair;
use crate::gemini::{GenerationConfig, GenerativeModel};

/// Build the rewrite prompt. Reference order is preserved as
/// "Reference 1" and "Reference 2".
pub fn build_prompt(article: &Article, references: &ReferencePair) -> String {
    let [first, second] = references;

    format!(
        "You are an expert content writer and SEO specialist.

TASK: Rewrite the ORIGINAL ARTICLE below to match the style, formatting, and quality of the TOP-RANKING REFERENCE ARTICLES.

ORIGINAL ARTICLE:
Title: {title}
Content:
{body}

{reference_1}

{reference_2}

INSTRUCTIONS:
1. Analyze the writing style, tone, structure, and formatting of the reference articles
2. Rewrite the original article to match that style while keeping the same core topic
3. Use similar heading structures (H2, H3) as the reference articles
4. Match the depth and comprehensiveness of the reference articles
5. Improve SEO optimization based on how the reference articles are structured
6. Keep the content engaging, informative, and well-organized
7. Use markdown formatting for headings (##, ###)
8. Make it at least as detailed as the reference articles

OUTPUT FORMAT (in markdown):
# [Improved Title]

[Introduction paragraph]

## [First Main Section]

[Content...]

### [Subsection if needed]

[Content...]

## [Second Main Section]

[Content...]

[Continue with more sections as appropriate...]

## Conclusion

[Concluding thoughts]

---

ONLY output the rewritten article content in markdown format. Do NOT include any meta-commentary or explanations.",
        title = article.title,
        body = article.body(),
        reference_1 = reference_block(1, first),
        reference_2 = reference_block(2, second),
    )
}

fn reference_block(position: usize, reference: &ReferenceArticle) -> String {
    format!(
        "REFERENCE ARTICLE {position} (Top Ranking):\nTitle: {}\nURL: {}\nContent:\n{}",
        reference.title, reference.url, reference.content
    )
}

/// Rewrites an article by trying each configured model in order.
pub struct RewriteEngine {
    model: Box<dyn GenerativeModel>,
    model_ids: Vec<String>,
    generation: GenerationConfig,
}

impl RewriteEngine {
    pub fn new(
        model: Box<dyn GenerativeModel>,
        model_ids: Vec<String>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            model,
            model_ids,
            generation,
        }
    }

    /// Return the first non-empty rewrite, tagged with the model that wrote it.
    ///
    /// Every model is tried at most once. When all fail the error carries
    /// one message per model, in list order.
    #[instrument(skip_all, fields(article_id = article.id, models = self.model_ids.len()))]
    pub async fn rewrite(
        &self,
        article: &Article,
        references: &ReferencePair,
    ) -> Result<RewriteResult> {
        let prompt = build_prompt(article, references);

        let outcome =
            first_success(&self.model_ids, |model_id| self.attempt(model_id, &prompt)).await;

        match outcome {
            Ok((model_id, markdown_body)) => {
                info!(model = %model_id, chars = markdown_body.chars().count(), "article rewritten");
                Ok(RewriteResult {
                    markdown_body,
                    model_used: model_id.clone(),
                })
            }
            Err(failures) => Err(ContentLiftError::NoModelAvailable { failures }),
        }
    }

    async fn attempt(&self, model_id: &str, prompt: &str) -> Result<String> {
        let text = self.model.generate(model_id, prompt, &self.generation).await?;
        if text.trim().is_empty() {
            return Err(ContentLiftError::ModelInvocation {
                model: model_id.to_string(),
                message: "model returned empty text".into(),
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;

    /// Answers from a fixed table; unknown models fail.
    #[derive(Default)]
    struct ScriptedModel {
        replies: HashMap<String, std::result::Result<String, String>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedModel {
        fn reply(mut self, model: &str, reply: std::result::Result<&str, &str>) -> Self {
            let reply = reply.map(String::from).map_err(String::from);
            self.replies.insert(model.to_string(), reply);
            self
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(
            &self,
            model: &str,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            let reply = self
                .replies
                .get(model)
                .cloned()
                .unwrap_or_else(|| Err("model not found".into()));
            reply.map_err(|message| ContentLiftError::ModelInvocation {
                model: model.to_string(),
                message,
            })
        }
    }

    fn article() -> Article {
        Article {
            id: 9,
            title: "Best Coffee Makers 2024".into(),
            content: Some("Original body about drip machines.".into()),
            ..Default::default()
        }
    }

    fn references() -> ReferencePair {
        [
            ReferenceArticle {
                title: "Kitchen Picks".into(),
                url: "https://a.example.com/picks".into(),
                content: "## Picks\n\nFirst reference text".into(),
            },
            ReferenceArticle {
                title: "Buying Guide".into(),
                url: "https://b.example.com/guide".into(),
                content: "## Guide\n\nSecond reference text".into(),
            },
        ]
    }

    fn engine(model: ScriptedModel, ids: &[&str]) -> (RewriteEngine, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::clone(&model.calls);
        let engine = RewriteEngine::new(
            Box::new(model),
            ids.iter().map(|s| s.to_string()).collect(),
            GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 8_000,
            },
        );
        (engine, calls)
    }

    #[test]
    fn prompt_carries_article_and_ordered_references() {
        let prompt = build_prompt(&article(), &references());

        assert!(prompt.contains("Title: Best Coffee Makers 2024\nContent:\nOriginal body about drip machines."));
        let first = prompt.find("REFERENCE ARTICLE 1 (Top Ranking):\nTitle: Kitchen Picks").unwrap();
        let second = prompt.find("REFERENCE ARTICLE 2 (Top Ranking):\nTitle: Buying Guide").unwrap();
        assert!(first < second);
        assert!(prompt.contains("URL: https://b.example.com/guide"));
        assert!(prompt.contains("## Conclusion"));
        assert!(prompt.ends_with("Do NOT include any meta-commentary or explanations."));
    }

    #[test]
    fn prompt_uses_excerpt_when_content_missing() {
        let article = Article {
            content: None,
            excerpt: Some("Short summary only.".into()),
            ..article()
        };
        assert!(build_prompt(&article, &references()).contains("Content:\nShort summary only."));
    }

    #[tokio::test]
    async fn falls_through_to_second_model() {
        let model = ScriptedModel::default()
            .reply("A", Err("QuotaExceeded"))
            .reply("B", Ok("# Title\n\nBody"));
        let (engine, calls) = engine(model, &["A", "B"]);

        let result = engine.rewrite(&article(), &references()).await.unwrap();

        assert_eq!(result.markdown_body, "# Title\n\nBody");
        assert_eq!(result.model_used, "B");
        assert_eq!(*calls.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let model = ScriptedModel::default()
            .reply("A", Ok("# Winner\n\nText"))
            .reply("B", Ok("# Never\n\nUsed"));
        let (engine, calls) = engine(model, &["A", "B"]);

        let result = engine.rewrite(&article(), &references()).await.unwrap();
        assert_eq!(result.model_used, "A");
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_output_counts_as_failure() {
        let model = ScriptedModel::default()
            .reply("A", Ok("   \n"))
            .reply("B", Ok("# Real\n\nContent"));
        let (engine, _calls) = engine(model, &["A", "B"]);

        let result = engine.rewrite(&article(), &references()).await.unwrap();
        assert_eq!(result.model_used, "B");
    }

    #[tokio::test]
    async fn all_models_failing_reports_each_attempt() {
        let (engine, calls) = engine(ScriptedModel::default(), &["m1", "m2", "m3"]);

        let err = engine.rewrite(&article(), &references()).await.unwrap_err();
        match err {
            ContentLiftError::NoModelAvailable { failures } => {
                assert_eq!(failures.len(), 3);
                let options: Vec<&str> = failures.iter().map(|f| f.option.as_str()).collect();
                assert_eq!(options, vec!["m1", "m2", "m3"]);
                assert!(failures[0].message.contains("model not found"));
            }
            other => panic!("expected NoModelAvailable, got {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 3);
    }
}
