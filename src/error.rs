use derive_more::{Display, Error, From};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, From)]
pub enum Error {
    #[display("{message}")]
    #[from(ignore)]
    Custom { message: String },

    /// No input resolved to a transcript; the generation backend is never
    /// called in this state.
    #[display("no transcripts could be resolved from the given URLs")]
    #[from(ignore)]
    EmptyCorpus,

    /// The generation backend failed after the retry budget was spent, or
    /// with an error class that is not retryable.
    #[display("report generation failed: {message}")]
    #[from(ignore)]
    Generation {
        message: String,
        rate_limited: bool,
        retry_hint_secs: Option<u64>,
    },

    /// Structured output did not match the coaching plan schema. The raw
    /// backend response is kept verbatim for diagnosis.
    #[display(
        "coaching plan did not match the expected schema: {message}\n--- raw response ---\n{raw}"
    )]
    #[from(ignore)]
    PlanSchema { message: String, raw: String },

    #[display("I/O error: {_0}")]
    Io(std::io::Error),

    #[display("JSON error: {_0}")]
    Json(serde_json::Error),

    #[display("backend request error: {_0}")]
    OpenAI(async_openai::error::OpenAIError),
}

impl Error {
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom {
            message: message.into(),
        }
    }
}
