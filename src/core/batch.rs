use crate::core::transcript::{AcquisitionTier, ResolveTranscript, extract_video_id};

/// Split a newline-separated URL list the way the input box provides it.
pub fn split_urls(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Why an input line produced no transcript. The classification is kept
/// coarse on purpose; tier-level detail goes to the log only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidUrl,
    TranscriptUnavailable,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::InvalidUrl => "no video id found in the URL",
            SkipReason::TranscriptUnavailable => {
                "no transcript available (captions disabled or video inaccessible)"
            }
        }
    }
}

/// Per-item bookkeeping, reported alongside the final output.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Resolved {
        url: String,
        video_id: String,
        language_code: String,
        tier: AcquisitionTier,
    },
    Skipped {
        url: String,
        reason: SkipReason,
    },
}

/// The combined transcript text for one run, with provenance markers.
///
/// Built incrementally by the aggregator and consumed exactly once by the
/// report generator; callers must check `is_empty` before generation.
#[derive(Debug, Clone, Default)]
pub struct AggregatedCorpus {
    text: String,
    resolved: usize,
}

impl AggregatedCorpus {
    pub fn append(&mut self, video_id: &str, transcript: &str) {
        self.text.push_str(&format!("\n\n--- Video ID: {video_id} ---\n"));
        self.text.push_str(transcript);
        self.resolved += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.resolved == 0
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Incremental progress, emitted in input order while the batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        index: usize,
        total: usize,
        url: String,
    },
    Resolved {
        index: usize,
        video_id: String,
        language_code: String,
        tier: AcquisitionTier,
    },
    Skipped {
        index: usize,
        url: String,
        reason: SkipReason,
    },
}

#[derive(Debug)]
pub struct BatchReport {
    pub corpus: AggregatedCorpus,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn skipped(&self) -> impl Iterator<Item = (&str, SkipReason)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ItemOutcome::Skipped { url, reason } => Some((url.as_str(), *reason)),
            ItemOutcome::Resolved { .. } => None,
        })
    }
}

/// Run the whole URL list through resolution, strictly sequentially and in
/// input order. One bad link never blocks the rest: parse and resolution
/// failures are recorded as skips and the scan continues.
pub async fn run_batch<R, F>(resolver: &R, urls: &[String], mut on_event: F) -> BatchReport
where
    R: ResolveTranscript + ?Sized,
    F: FnMut(BatchEvent),
{
    let total = urls.len();
    let mut corpus = AggregatedCorpus::default();
    let mut outcomes = Vec::with_capacity(total);

    for (i, url) in urls.iter().enumerate() {
        let index = i + 1;
        on_event(BatchEvent::Started {
            index,
            total,
            url: url.clone(),
        });

        let Some(video_id) = extract_video_id(url) else {
            tracing::warn!(%url, "skipping input with no recognisable video id");
            outcomes.push(ItemOutcome::Skipped {
                url: url.clone(),
                reason: SkipReason::InvalidUrl,
            });
            on_event(BatchEvent::Skipped {
                index,
                url: url.clone(),
                reason: SkipReason::InvalidUrl,
            });
            continue;
        };

        match resolver.resolve(&video_id).await {
            Some(result) => {
                corpus.append(&result.video_id, &result.text);
                on_event(BatchEvent::Resolved {
                    index,
                    video_id: result.video_id.clone(),
                    language_code: result.language_code.clone(),
                    tier: result.tier,
                });
                outcomes.push(ItemOutcome::Resolved {
                    url: url.clone(),
                    video_id: result.video_id,
                    language_code: result.language_code,
                    tier: result.tier,
                });
            }
            None => {
                tracing::warn!(%url, %video_id, "no transcript available on any tier");
                outcomes.push(ItemOutcome::Skipped {
                    url: url.clone(),
                    reason: SkipReason::TranscriptUnavailable,
                });
                on_event(BatchEvent::Skipped {
                    index,
                    url: url.clone(),
                    reason: SkipReason::TranscriptUnavailable,
                });
            }
        }
    }

    BatchReport { corpus, outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::TranscriptResult;
    use async_trait::async_trait;

    struct StubResolver;

    #[async_trait]
    impl ResolveTranscript for StubResolver {
        async fn resolve(&self, video_id: &str) -> Option<TranscriptResult> {
            if video_id == "dQw4w9WgXcQ" {
                Some(TranscriptResult {
                    video_id: video_id.to_string(),
                    text: "오늘부터 일찍 일어나자".to_string(),
                    language_code: "ko".to_string(),
                    tier: AcquisitionTier::Manual,
                })
            } else {
                None
            }
        }
    }

    fn urls(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn partial_failures_do_not_block_the_batch() {
        let inputs = urls(&[
            "https://youtu.be/dQw4w9WgXcQ",
            "not a url",
            "https://youtu.be/AAAAAAAAAAA",
        ]);

        let report = run_batch(&StubResolver, &inputs, |_| {}).await;

        assert_eq!(report.corpus.resolved_count(), 1);
        assert!(report.corpus.text().contains("--- Video ID: dQw4w9WgXcQ ---"));
        assert!(report.corpus.text().contains("오늘부터 일찍 일어나자"));

        let skips: Vec<_> = report.skipped().collect();
        assert_eq!(skips.len(), 2);
        assert_eq!(skips[0], ("not a url", SkipReason::InvalidUrl));
        assert_eq!(
            skips[1],
            ("https://youtu.be/AAAAAAAAAAA", SkipReason::TranscriptUnavailable)
        );
    }

    #[tokio::test]
    async fn progress_is_reported_per_item_in_order() {
        let inputs = urls(&["https://youtu.be/dQw4w9WgXcQ", "junk"]);
        let mut started = Vec::new();

        run_batch(&StubResolver, &inputs, |event| {
            if let BatchEvent::Started { index, total, .. } = event {
                started.push((index, total));
            }
        })
        .await;

        assert_eq!(started, vec![(1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn all_failures_leave_the_corpus_empty() {
        let inputs = urls(&["junk", "https://youtu.be/BBBBBBBBBBB"]);
        let report = run_batch(&StubResolver, &inputs, |_| {}).await;

        assert!(report.corpus.is_empty());
        assert_eq!(report.skipped().count(), 2);
    }

    #[test]
    fn split_urls_trims_and_drops_blank_lines() {
        let input = "https://youtu.be/dQw4w9WgXcQ\n\n  https://youtu.be/5_EJwYeQusM  \n";
        assert_eq!(
            split_urls(input),
            vec![
                "https://youtu.be/dQw4w9WgXcQ".to_string(),
                "https://youtu.be/5_EJwYeQusM".to_string(),
            ]
        );
    }
}
