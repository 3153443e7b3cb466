use crate::error::{Error, Result};
use async_trait::async_trait;
use yt_transcript_rs::{FetchedTranscript, TranscriptList, api::YouTubeTranscriptApi};

/// Canonical video identifiers are always exactly this long.
pub const VIDEO_ID_LEN: usize = 11;

/// Caption languages the coach prefers, most wanted first.
const PREFERRED_LANGUAGES: [&str; 2] = ["ko", "en"];
/// Language the tier-3 fallback translates into.
const TRANSLATION_TARGET: &str = "ko";

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

/// Extract the 11-character video identifier from a URL-ish string.
///
/// Takes the first occurrence of `v=` or `/` that is followed by eleven
/// identifier characters; covers `watch?v=`, `youtu.be/`, `embed/` and bare
/// path forms. Returns `None` for anything else; a non-match is an expected
/// outcome for user input, not a fault.
pub fn extract_video_id(url: &str) -> Option<String> {
    for (at, _) in url.char_indices() {
        let rest = &url[at..];
        let candidate = if let Some(after) = rest.strip_prefix("v=") {
            after
        } else if let Some(after) = rest.strip_prefix('/') {
            after
        } else {
            continue;
        };

        let id: String = candidate.chars().take(VIDEO_ID_LEN).collect();
        if id.len() == VIDEO_ID_LEN && id.chars().all(is_id_char) {
            return Some(id);
        }
    }
    None
}

/// How a transcript was obtained, ranked best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionTier {
    Manual,
    Generated,
    Translated,
}

impl AcquisitionTier {
    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionTier::Manual => "manual",
            AcquisitionTier::Generated => "auto-generated",
            AcquisitionTier::Translated => "translated",
        }
    }
}

/// A caption track advertised by the video, as far as tier selection cares.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// One planned fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub language_code: String,
    pub tier: AcquisitionTier,
}

/// Rank the available tracks into an ordered list of fetch attempts.
///
/// Tier order is fixed: manual Korean/English, then auto-generated
/// Korean/English, then any translatable track rendered into Korean. The
/// resolver walks the plan and stops at the first attempt that yields text.
pub fn plan_acquisitions(tracks: &[CaptionTrack]) -> Vec<Acquisition> {
    let mut plan = Vec::new();

    for lang in PREFERRED_LANGUAGES {
        if tracks.iter().any(|t| !t.is_generated && t.language_code == lang) {
            plan.push(Acquisition {
                language_code: lang.to_string(),
                tier: AcquisitionTier::Manual,
            });
        }
    }

    for lang in PREFERRED_LANGUAGES {
        if tracks.iter().any(|t| t.is_generated && t.language_code == lang) {
            plan.push(Acquisition {
                language_code: lang.to_string(),
                tier: AcquisitionTier::Generated,
            });
        }
    }

    if let Some(track) = tracks.iter().find(|t| t.is_translatable) {
        plan.push(Acquisition {
            language_code: track.language_code.clone(),
            tier: AcquisitionTier::Translated,
        });
    }

    plan
}

/// A resolved transcript, reduced to what the aggregator needs.
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    pub video_id: String,
    pub text: String,
    pub language_code: String,
    pub tier: AcquisitionTier,
}

/// Resolution seam: the batch aggregator only needs "best transcript or
/// nothing" per identifier.
#[async_trait]
pub trait ResolveTranscript: Send + Sync {
    async fn resolve(&self, video_id: &str) -> Option<TranscriptResult>;
}

#[derive(Clone)]
pub struct TranscriptResolver {
    api: YouTubeTranscriptApi,
    client: reqwest::Client,
}

impl TranscriptResolver {
    pub fn new() -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| Error::custom(format!("failed to initialise transcript backend: {e}")))?;
        let client = reqwest::Client::new();
        Ok(Self { api, client })
    }

    async fn fetch_acquisition(
        &self,
        listing: &TranscriptList,
        acquisition: &Acquisition,
    ) -> Result<FetchedTranscript> {
        let languages = [acquisition.language_code.as_str()];
        let unavailable = |e| Error::custom(format!("tier unavailable: {e}"));

        match acquisition.tier {
            AcquisitionTier::Manual => {
                let transcript = listing
                    .find_manually_created_transcript(&languages)
                    .map_err(unavailable)?;
                transcript.fetch(&self.client, false).await.map_err(unavailable)
            }
            AcquisitionTier::Generated => {
                let transcript = listing
                    .find_generated_transcript(&languages)
                    .map_err(unavailable)?;
                transcript.fetch(&self.client, false).await.map_err(unavailable)
            }
            AcquisitionTier::Translated => {
                let transcript = listing.find_transcript(&languages).map_err(unavailable)?;
                let translated = transcript
                    .translate(TRANSLATION_TARGET)
                    .map_err(unavailable)?;
                translated.fetch(&self.client, false).await.map_err(unavailable)
            }
        }
    }
}

#[async_trait]
impl ResolveTranscript for TranscriptResolver {
    /// Never errors: every failure path (listing unobtainable, a tier's
    /// fetch failing, all tiers exhausted) collapses into `None`, which the
    /// caller treats as "skip this item, continue the batch".
    async fn resolve(&self, video_id: &str) -> Option<TranscriptResult> {
        let listing = match self.api.list_transcripts(video_id).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::debug!(video_id, error = %e, "transcript listing unavailable");
                return None;
            }
        };

        let tracks: Vec<CaptionTrack> = listing
            .transcripts()
            .map(|t| CaptionTrack {
                language_code: t.language_code.clone(),
                is_generated: t.is_generated,
                is_translatable: t.is_translatable(),
            })
            .collect();

        for acquisition in plan_acquisitions(&tracks) {
            match self.fetch_acquisition(&listing, &acquisition).await {
                Ok(fetched) => {
                    let text = normalize_transcript(&fetched);
                    if text.is_empty() {
                        continue;
                    }
                    return Some(TranscriptResult {
                        video_id: video_id.to_string(),
                        text,
                        language_code: fetched.language_code.clone(),
                        tier: acquisition.tier,
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        video_id,
                        tier = acquisition.tier.label(),
                        language = %acquisition.language_code,
                        error = %e,
                        "tier failed, falling through"
                    );
                }
            }
        }

        None
    }
}

/// Flatten a fetched transcript to plain text: one snippet per line, HTML
/// entities decoded, timing metadata discarded.
pub fn normalize_transcript(fetched: &FetchedTranscript) -> String {
    let mut lines = Vec::with_capacity(fetched.snippets.len());
    for snippet in &fetched.snippets {
        let text = snippet.text.trim();
        if text.is_empty() {
            continue;
        }
        lines.push(html_escape::decode_html_entities(text).into_owned());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(language_code: &str, is_generated: bool, is_translatable: bool) -> CaptionTrack {
        CaptionTrack {
            language_code: language_code.to_string(),
            is_generated,
            is_translatable,
        }
    }

    #[test]
    fn extracts_id_from_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn extracts_id_from_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/5_EJwYeQusM"),
            Some("5_EJwYeQusM".to_string())
        );
    }

    #[test]
    fn takes_first_eleven_characters_of_longer_run() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQextra"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn rejects_plain_text() {
        assert_eq!(extract_video_id("not a url"), None);
    }

    #[test]
    fn rejects_too_short_ids() {
        assert_eq!(extract_video_id("https://youtu.be/shortid"), None);
    }

    #[test]
    fn manual_korean_outranks_everything() {
        let plan = plan_acquisitions(&[
            track("en", true, true),
            track("ko", false, true),
            track("en", false, true),
        ]);
        assert_eq!(plan[0].tier, AcquisitionTier::Manual);
        assert_eq!(plan[0].language_code, "ko");
        assert_eq!(plan[1].tier, AcquisitionTier::Manual);
        assert_eq!(plan[1].language_code, "en");
    }

    #[test]
    fn generated_english_selected_before_translation() {
        let plan = plan_acquisitions(&[track("en", true, true)]);
        assert_eq!(
            plan[0],
            Acquisition {
                language_code: "en".to_string(),
                tier: AcquisitionTier::Generated,
            }
        );
        // Translation is a later fallback, never the first attempt.
        assert!(
            plan.iter().skip(1).all(|a| a.tier == AcquisitionTier::Translated),
            "unexpected plan: {plan:?}"
        );
    }

    #[test]
    fn translation_uses_first_translatable_track() {
        let plan = plan_acquisitions(&[track("ja", false, false), track("de", true, true)]);
        assert_eq!(
            plan,
            vec![Acquisition {
                language_code: "de".to_string(),
                tier: AcquisitionTier::Translated,
            }]
        );
    }

    #[test]
    fn empty_listing_yields_empty_plan() {
        assert!(plan_acquisitions(&[]).is_empty());
    }
}
