//! Instruction text sent to the generative endpoint and parsing of its reply.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Domain, Recommendation};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?").expect("code fence pattern is a valid regex")
});

/// Natural-language instruction embedding the domain and the caller's context.
pub fn recommendation_prompt(domain: Domain, context: &str) -> String {
    format!(
        "You are an expert AI for smart cities. Context: {domain}. Data: {context}. \
         Provide 3-5 specific, distinct recommendations as a JSON array of strings, \
         impact (High/Medium/Low), and quantified savings. \
         Format as JSON: {{ \"recommendations\": [\"rec1\", \"rec2\", ...], \"impact\": \"...\", \"savings\": \"...\" }}"
    )
}

/// Remove every ```json / ``` marker and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Best-effort parse of a model reply into a [`Recommendation`].
pub fn parse_recommendation(reply: &str) -> Result<Recommendation, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(reply))
}
