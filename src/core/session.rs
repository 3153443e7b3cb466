use crate::core::batch::{BatchEvent, BatchReport, ItemOutcome, run_batch};
use crate::core::plan::CoachingPlan;
use crate::core::report::{ReportMode, ReportService};
use crate::core::transcript::ResolveTranscript;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Generation seam mirroring the two output contracts of [`ReportService`].
#[async_trait]
pub trait GenerateCoaching: Send + Sync {
    async fn narrative(&self, corpus_text: &str) -> Result<String>;
    async fn plan(&self, corpus_text: &str) -> Result<CoachingPlan>;
}

#[async_trait]
impl GenerateCoaching for ReportService {
    async fn narrative(&self, corpus_text: &str) -> Result<String> {
        self.generate_narrative(corpus_text).await
    }

    async fn plan(&self, corpus_text: &str) -> Result<CoachingPlan> {
        self.generate_plan(corpus_text).await
    }
}

/// Terminal value of a successful run.
#[derive(Debug, Clone)]
pub enum CoachingOutput {
    Narrative(String),
    Plan(CoachingPlan),
}

#[derive(Debug)]
pub struct SessionOutcome {
    pub output: CoachingOutput,
    pub outcomes: Vec<ItemOutcome>,
}

/// Progress stream for one run: the batch phase item by item, then the
/// generation phase.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Batch(BatchEvent),
    Generating { resolved_count: usize },
}

/// One user-triggered run: resolve everything, guard against an empty
/// corpus, then generate. Owns nothing beyond the run; every invocation
/// builds its corpus from scratch and shares no state with other runs.
pub struct CoachingSession<R, G> {
    resolver: R,
    generator: G,
}

impl<R, G> CoachingSession<R, G>
where
    R: ResolveTranscript,
    G: GenerateCoaching,
{
    pub fn new(resolver: R, generator: G) -> Self {
        Self { resolver, generator }
    }

    /// Drive the full pipeline. A batch with zero resolved transcripts fails
    /// with [`Error::EmptyCorpus`] before the generation backend is ever
    /// contacted.
    pub async fn run<F>(
        &self,
        urls: &[String],
        mode: ReportMode,
        mut on_event: F,
    ) -> Result<SessionOutcome>
    where
        F: FnMut(SessionEvent),
    {
        let BatchReport { corpus, outcomes } =
            run_batch(&self.resolver, urls, |event| on_event(SessionEvent::Batch(event))).await;

        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        on_event(SessionEvent::Generating {
            resolved_count: corpus.resolved_count(),
        });

        let output = match mode {
            ReportMode::Narrative => {
                CoachingOutput::Narrative(self.generator.narrative(corpus.text()).await?)
            }
            ReportMode::Structured => {
                CoachingOutput::Plan(self.generator.plan(corpus.text()).await?)
            }
        };

        Ok(SessionOutcome { output, outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::{AcquisitionTier, TranscriptResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoResolver;

    #[async_trait]
    impl ResolveTranscript for NoResolver {
        async fn resolve(&self, _video_id: &str) -> Option<TranscriptResult> {
            None
        }
    }

    struct EchoResolver;

    #[async_trait]
    impl ResolveTranscript for EchoResolver {
        async fn resolve(&self, video_id: &str) -> Option<TranscriptResult> {
            Some(TranscriptResult {
                video_id: video_id.to_string(),
                text: "transcript text".to_string(),
                language_code: "en".to_string(),
                tier: AcquisitionTier::Generated,
            })
        }
    }

    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerateCoaching for CountingGenerator {
        async fn narrative(&self, _corpus_text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("리포트".to_string())
        }

        async fn plan(&self, _corpus_text: &str) -> Result<CoachingPlan> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CoachingPlan {
                analysis: "분석".to_string(),
                routine: Vec::new(),
                resources: Vec::new(),
            })
        }
    }

    fn urls(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_corpus_never_reaches_the_generator() {
        let session = CoachingSession::new(NoResolver, CountingGenerator::default());
        let inputs = urls(&["not a url", "https://youtu.be/AAAAAAAAAAA"]);

        let result = session.run(&inputs, ReportMode::Narrative, |_| {}).await;

        assert!(matches!(result, Err(Error::EmptyCorpus)));
        assert_eq!(session.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generation_follows_a_successful_batch() {
        let session = CoachingSession::new(EchoResolver, CountingGenerator::default());
        let inputs = urls(&["https://youtu.be/dQw4w9WgXcQ"]);
        let mut saw_generating = false;

        let outcome = session
            .run(&inputs, ReportMode::Narrative, |event| {
                if matches!(event, SessionEvent::Generating { resolved_count: 1 }) {
                    saw_generating = true;
                }
            })
            .await
            .unwrap();

        assert!(saw_generating);
        assert!(matches!(outcome.output, CoachingOutput::Narrative(ref s) if s == "리포트"));
        assert_eq!(session.generator.calls.load(Ordering::SeqCst), 1);
    }
}
