use crate::core::plan::{CoachingPlan, parse_plan};
use crate::error::{Error, Result};
use async_openai::{
    self,
    config::OpenAIConfig,
    error::OpenAIError,
    types::responses::{
        CreateResponseArgs, EasyInputMessageArgs, InputItem, InputParam, OutputItem,
        OutputMessageContent, Role,
    },
};
use std::future::Future;
use std::time::Duration;

/// Total tries per generation call, the first included.
pub const MAX_ATTEMPTS: u32 = 3;
/// First backoff delay; doubles on every further rate-limited attempt.
pub const BASE_BACKOFF: Duration = Duration::from_secs(5);
/// Safety margin added on top of an explicit "retry in N seconds" hint.
const RETRY_HINT_BUFFER_SECS: u64 = 1;

const MAX_OUTPUT_TOKENS: u32 = 32768;
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

const SYSTEM_PROMPT: &str = "You are an expert lifestyle coach and productivity consultant. \
The user shares transcripts of YouTube videos they found inspiring; you turn them into \
practical coaching guidance. Every response MUST be written in Korean (한국어).";

/// Which output contract the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    Narrative,
    Structured,
}

/// Backend knobs supplied by the caller. The credential is held only for the
/// lifetime of the service and is never logged or written anywhere.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ReportService {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
}

impl ReportService {
    pub fn new(config: GeneratorConfig) -> Self {
        let mut backend = OpenAIConfig::new();
        if let Some(key) = config.api_key {
            backend = backend.with_api_key(key);
        }
        if let Some(base) = config.api_base {
            backend = backend.with_api_base(base);
        }

        Self {
            client: async_openai::Client::with_config(backend),
            model: config.model,
        }
    }

    /// Free-text coaching report in Korean.
    pub async fn generate_narrative(&self, corpus_text: &str) -> Result<String> {
        let prompt = narrative_prompt(corpus_text);
        retry_on_rate_limit(|| self.request_text(&prompt)).await
    }

    /// Strict-JSON coaching plan. The response is fence-stripped and parsed
    /// under the exact schema; a mismatch is a hard error.
    pub async fn generate_plan(&self, corpus_text: &str) -> Result<CoachingPlan> {
        let prompt = plan_prompt(corpus_text);
        let raw = retry_on_rate_limit(|| self.request_text(&prompt)).await?;
        parse_plan(&raw)
    }

    async fn request_text(&self, prompt: &str) -> Result<String> {
        let request = CreateResponseArgs::default()
            .max_output_tokens(MAX_OUTPUT_TOKENS)
            .model(self.model.as_str())
            .input(InputParam::Items(vec![
                InputItem::EasyMessage(
                    EasyInputMessageArgs::default()
                        .role(Role::System)
                        .content(SYSTEM_PROMPT)
                        .build()?,
                ),
                InputItem::EasyMessage(
                    EasyInputMessageArgs::default()
                        .role(Role::User)
                        .content(prompt.to_string())
                        .build()?,
                ),
            ]))
            .build()?;

        let response = self
            .client
            .responses()
            .create(request)
            .await
            .map_err(classify_backend_error)?;

        let mut content = String::new();
        for output in response.output {
            if let OutputItem::Message(message) = output {
                for part in message.content {
                    match part {
                        OutputMessageContent::OutputText(text) => content.push_str(&text.text),
                        other => {
                            tracing::debug!(?other, "ignoring non-text output content");
                        }
                    }
                }
            }
        }

        Ok(content)
    }
}

/// Run `attempt` up to [`MAX_ATTEMPTS`] times, sleeping between tries only
/// for rate-limited failures: 5s, then 10s, unless the error carried an
/// explicit retry-after hint, which wins (+1s buffer). Every other error
/// class fails immediately.
async fn retry_on_rate_limit<T, F, Fut>(mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = BASE_BACKOFF;
    let mut tries = 0;

    loop {
        tries += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(Error::Generation {
                message,
                rate_limited: true,
                retry_hint_secs,
            }) if tries < MAX_ATTEMPTS => {
                let delay = match retry_hint_secs {
                    Some(hint) => Duration::from_secs(hint + RETRY_HINT_BUFFER_SECS),
                    None => backoff,
                };
                tracing::warn!(
                    attempt = tries,
                    delay_secs = delay.as_secs(),
                    %message,
                    "backend rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                backoff *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Fold a backend failure into the crate error, classifying whether it is a
/// rate-limit signal worth retrying. async-openai surfaces the provider's
/// status through the error payload, so the classification reads the
/// rendered message; the retry-after scan stays best-effort on top of that.
fn classify_backend_error(err: OpenAIError) -> Error {
    let message = match &err {
        OpenAIError::ApiError(api) => api.message.clone(),
        other => other.to_string(),
    };

    Error::Generation {
        rate_limited: mentions_rate_limit(&message),
        retry_hint_secs: retry_hint_secs(&message),
        message,
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    lowered.contains("rate limit")
        || lowered.contains("too many requests")
        || lowered.contains("resource exhausted")
        || lowered.contains("resource_exhausted")
        || lowered.contains("429")
}

/// Best-effort scan for an embedded "retry in 20.5s" / "retry after 7
/// seconds" hint. Returns whole seconds, rounded up.
fn retry_hint_secs(message: &str) -> Option<u64> {
    let lowered = message.to_ascii_lowercase();
    let at = lowered.find("retry")?;
    let tail = &lowered[at..];

    let digits_at = tail.find(|c: char| c.is_ascii_digit())?;
    let number: String = tail[digits_at..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let seconds = number.parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.ceil() as u64)
}

fn narrative_prompt(corpus_text: &str) -> String {
    format!(
        r#"아래는 사용자가 영감을 받은 YouTube 영상들의 자막입니다. 내용을 분석하여 코칭 리포트를 작성하세요.

**Language requirement:** the entire response MUST be written in Korean (한국어).

**Output structure:**
1. **핵심 통찰 (Core Insight):** the one key philosophy or lesson from these videos, in a single sentence.
2. **주요 요약 (Key Takeaways):** three major points relevant to lifestyle or mindset.
3. **실천 가이드 (Action Plan):** three concrete, actionable steps the user can take tomorrow.
4. **동기 부여 (Motivation):** a short, encouraging message grounded in the content.

**Video transcripts:**
{corpus_text}"#
    )
}

fn plan_prompt(corpus_text: &str) -> String {
    format!(
        r#"Analyse the following video transcripts and design a daily routine the user can follow. All text values MUST be written in Korean (한국어).

Return ONLY a bare JSON object with no markdown, no code fences and no commentary, matching exactly this structure:
{{
  "analysis": "coaching narrative summarising the videos' core philosophy",
  "routine": [
    {{"activity": "...", "time": "HH:MM", "duration_minutes": 30, "notes": "..."}}
  ],
  "resources": [
    {{"name": "...", "category": "..."}}
  ]
}}

Rules:
- "time" is a 24-hour HH:MM start time.
- "duration_minutes" is a positive integer.
- Provide 5 to 8 routine entries covering a full day.
- "resources" lists books, tools or channels mentioned in or implied by the videos.

Video transcripts:
{corpus_text}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn rate_limited(hint: Option<u64>) -> Error {
        Error::Generation {
            message: "429: too many requests".to_string(),
            rate_limited: true,
            retry_hint_secs: hint,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backs_off_five_then_ten_seconds_before_succeeding() {
        let started = Instant::now();
        let tries = Cell::new(0u32);

        let result = retry_on_rate_limit(|| {
            let attempt = tries.get() + 1;
            tries.set(attempt);
            async move {
                if attempt < 3 {
                    Err(rate_limited(None))
                } else {
                    Ok("done")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "done");
        assert_eq!(tries.get(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_hint_overrides_computed_backoff() {
        let started = Instant::now();
        let tries = Cell::new(0u32);

        let _ = retry_on_rate_limit(|| {
            let attempt = tries.get() + 1;
            tries.set(attempt);
            async move {
                if attempt == 1 {
                    Err(rate_limited(Some(20)))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

        // 20s hint + 1s buffer, not the 5s schedule.
        assert_eq!(started.elapsed(), Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_rate_limited_attempts() {
        let started = Instant::now();
        let tries = Cell::new(0u32);

        let result: Result<()> = retry_on_rate_limit(|| {
            tries.set(tries.get() + 1);
            async { Err(rate_limited(None)) }
        })
        .await;

        assert!(matches!(
            result,
            Err(Error::Generation {
                rate_limited: true,
                ..
            })
        ));
        assert_eq!(tries.get(), 3, "no fourth attempt");
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_fail_without_retrying() {
        let started = Instant::now();
        let tries = Cell::new(0u32);

        let result: Result<()> = retry_on_rate_limit(|| {
            tries.set(tries.get() + 1);
            async { Err(Error::custom("invalid request")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(tries.get(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn scans_retry_hints_out_of_error_text() {
        assert_eq!(retry_hint_secs("Please retry in 20.28s."), Some(21));
        assert_eq!(retry_hint_secs("retry after 7 seconds"), Some(7));
        assert_eq!(retry_hint_secs("quota exceeded, try later"), None);
        assert_eq!(retry_hint_secs("retry soon"), None);
    }

    #[test]
    fn classifies_rate_limit_phrasings() {
        assert!(mentions_rate_limit("HTTP 429 Too Many Requests"));
        assert!(mentions_rate_limit("RESOURCE_EXHAUSTED: quota"));
        assert!(mentions_rate_limit("Rate limit reached for requests"));
        assert!(!mentions_rate_limit("model not found"));
    }
}
