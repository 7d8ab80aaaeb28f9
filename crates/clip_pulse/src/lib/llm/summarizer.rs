use std::{fmt::Debug, future::Future};

pub trait Summarizer {
    /// Upper bound on the content handed to the model, in characters; longer
    /// inputs are truncated.
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug;

    fn summarize(
        &self,
        content: &str,
        language: &str,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct SummaryResponse {
    pub summary: String,
}
