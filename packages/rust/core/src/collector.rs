//! Reference collection: competitor search plus per-URL extraction.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use contentlift_crawler::ReferenceExtractor;
use contentlift_discovery::CompetitorFinder;
use contentlift_shared::{ContentLiftError, ReferenceArticle, Result, SearchResult};

/// Number of reference articles a rewrite needs.
pub const REQUIRED_REFERENCES: usize = 2;

/// The references handed to the rewrite engine, in ranking order.
pub type ReferencePair = [ReferenceArticle; REQUIRED_REFERENCES];

/// Produces ranked competitor candidates for a topic.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self, topic: &str) -> Result<Vec<SearchResult>>;
}

#[async_trait]
impl CandidateSource for CompetitorFinder {
    async fn candidates(&self, topic: &str) -> Result<Vec<SearchResult>> {
        self.find(topic).await
    }
}

/// Builds the reference pair by scanning candidates in order.
pub struct ReferenceCollector {
    source: Box<dyn CandidateSource>,
    extractor: Box<dyn ReferenceExtractor>,
}

impl ReferenceCollector {
    pub fn new(source: Box<dyn CandidateSource>, extractor: Box<dyn ReferenceExtractor>) -> Self {
        Self { source, extractor }
    }

    /// Search once, then extract candidates one at a time until two succeed.
    ///
    /// Candidates whose page cannot be extracted are skipped. Pages after the
    /// second success are never fetched.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn collect(&self, topic: &str) -> Result<ReferencePair> {
        let candidates = self.source.candidates(topic).await?;
        if candidates.len() < REQUIRED_REFERENCES {
            return Err(ContentLiftError::InsufficientCandidates {
                found: candidates.len(),
                required: REQUIRED_REFERENCES,
            });
        }

        let mut references = Vec::with_capacity(REQUIRED_REFERENCES);
        for candidate in candidates {
            let Some(content) = self.extractor.extract(&candidate.url).await else {
                debug!(url = %candidate.url, "no usable text, skipping candidate");
                continue;
            };

            references.push(ReferenceArticle {
                title: candidate.title,
                url: candidate.url,
                content,
            });
            if references.len() == REQUIRED_REFERENCES {
                break;
            }
        }

        let found = references.len();
        let pair: ReferencePair =
            references
                .try_into()
                .map_err(|_| ContentLiftError::InsufficientReferences {
                    found,
                    required: REQUIRED_REFERENCES,
                })?;

        info!(first = %pair[0].url, second = %pair[1].url, "reference articles collected");
        Ok(pair)
    }
}
