//! End-to-end optimization run: latest article → references → rewrite → publish.

use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::{info, instrument};

use contentlift_crawler::HtmlExtractor;
use contentlift_discovery::{ChromeLauncher, CompetitorFinder, GoogleSearchProvider};
use contentlift_shared::{
    AppConfig, BrowserConfig, ContentStoreConfig, ExtractConfig, LlmConfig, PublishConfig, Result,
    SearchConfig,
};

use crate::collector::ReferenceCollector;
use crate::gemini::{GeminiClient, GenerationConfig};
use crate::publish::PublishAssembler;
use crate::rewrite::RewriteEngine;
use crate::store::ContentStoreClient;

/// Fully resolved settings for one run. Secrets are values here, not
/// env var names; resolving them is the caller's job.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub store: ContentStoreConfig,
    pub search: SearchConfig,
    pub browser: BrowserConfig,
    pub extract: ExtractConfig,
    pub llm: LlmConfig,
    pub publish: PublishConfig,
    /// Search API key; when absent the browser fallback is used.
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub llm_api_key: String,
}

impl PipelineConfig {
    pub fn from_app_config(
        config: &AppConfig,
        search_api_key: Option<String>,
        search_engine_id: Option<String>,
        llm_api_key: String,
    ) -> Self {
        Self {
            store: config.content_store.clone(),
            search: config.search.clone(),
            browser: config.browser.clone(),
            extract: config.extract.clone(),
            llm: config.llm.clone(),
            publish: config.publish.clone(),
            search_api_key,
            search_engine_id,
            llm_api_key,
        }
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub article_id: u64,
    pub original_title: String,
    pub new_title: String,
    pub references: usize,
    /// Characters in the published body, references section included.
    pub content_chars: usize,
    pub model_used: String,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// The assembled pipeline. Build once, run once per article.
pub struct Pipeline {
    store: ContentStoreClient,
    collector: ReferenceCollector,
    engine: RewriteEngine,
    assembler: PublishAssembler,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let store = ContentStoreClient::new(&config.store)?;

        let provider = GoogleSearchProvider::new(
            &config.search,
            config.search_api_key,
            config.search_engine_id,
        )?;
        let launcher = ChromeLauncher::new(&config.browser, config.extract.user_agent.clone());
        let finder = CompetitorFinder::new(
            Box::new(provider),
            Box::new(launcher),
            config.search,
            config.browser,
        );
        let extractor = HtmlExtractor::new(&config.extract)?;
        let collector = ReferenceCollector::new(Box::new(finder), Box::new(extractor));

        let model = GeminiClient::new(&config.llm, config.llm_api_key)?;
        let generation = GenerationConfig::from(&config.llm);
        let engine = RewriteEngine::new(Box::new(model), config.llm.models, generation);

        Ok(Self {
            store,
            collector,
            engine,
            assembler: PublishAssembler::new(config.publish.excerpt_chars),
        })
    }

    /// Run once, stamping the update with today's local date.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunSummary> {
        self.run_with_date(Local::now().date_naive(), progress).await
    }

    /// Run once with an explicit date for the references stamp and
    /// `optimized_at`.
    ///
    /// Stages run strictly in sequence. Any unrecovered error ends the run
    /// before the store is written.
    #[instrument(skip_all, fields(%today))]
    pub async fn run_with_date(
        &self,
        today: NaiveDate,
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary> {
        let start = Instant::now();

        progress.phase("Fetching latest article");
        let article = self.store.latest_article().await?;

        progress.phase("Collecting reference articles");
        let references = self.collector.collect(&article.title).await?;

        progress.phase("Rewriting article");
        let rewrite = self.engine.rewrite(&article, &references).await?;

        progress.phase("Publishing");
        let publication = self
            .assembler
            .publish(&self.store, &article, &rewrite.markdown_body, &references, today)
            .await?;

        let summary = RunSummary {
            article_id: article.id,
            original_title: article.title,
            new_title: publication.title,
            references: references.len(),
            content_chars: publication.payload.full_content.chars().count(),
            model_used: rewrite.model_used,
            elapsed: start.elapsed(),
        };

        info!(
            article_id = summary.article_id,
            model = %summary.model_used,
            elapsed_ms = summary.elapsed.as_millis(),
            "optimization run completed"
        );
        progress.done(&summary);

        Ok(summary)
    }
}
