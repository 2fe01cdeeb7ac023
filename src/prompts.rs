//! Prompt templates for slide generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: tweaking the slide schema the model is
//!    asked to emit requires editing exactly one place.
//! 2. **Testability**: unit tests can inspect the assembled prompt without
//!    calling a real backend.
//!
//! Both backends share one user prompt; they differ only in the wrapping
//! the model is asked for (the hosted variant returns an object with a
//! `slides` key, the local variant a bare array) and in the system
//! instruction the local variant additionally receives.

/// User prompt shared by both backends. `{topic}` and `{source}` are
/// substituted by [`build_prompt`].
const PROMPT_TEMPLATE: &str = r#"Create a professional presentation about "{topic}".

Produce 6 to 10 slides as JSON. Each slide is an object with a "title" and exactly one content field:
- "html": a block of simple HTML (<p>, <ul>, <li>) for text slides
- "table": {"headers": [...], "rows": [[...], ...]} for tabular content
- "chart": {"type": "bar"|"line", "data": {"labels": [...], "datasets": [{"name": ..., "data": [...]}]}} for quantitative content

A slide may also carry an "image_query" string: a short search phrase for an illustrative photo.

Start with a title slide, end with a conclusion slide. Prefer at least one table or chart when the topic has quantitative aspects.
{source}"#;

/// System instruction for the local backend only. Local models are verbose
/// and less instruction-following, so the constraint is stated bluntly and
/// the conversational wrapper is forbidden outright.
pub const LOCAL_SYSTEM_PROMPT: &str = "You are a professional presentation designer. Your task is to generate a set of slides. You must return a valid JSON array of slides and nothing else. Do not include any conversational text, explanations, or code block formatting like ```json```.";

/// Framing line for the hosted backend asking for the wrapped shape.
pub const HOSTED_WRAPPER_INSTRUCTION: &str =
    r#"Return a single JSON object of the form {"slides": [...]} and nothing else."#;

/// Marker appended when source text is truncated to the configured budget.
pub const TRUNCATION_MARKER: &str = "...";

/// Assemble the user prompt for a topic and optional source text.
///
/// An empty `source_text` yields no framing sentence at all, so the
/// prompt reads naturally for topic-only requests.
pub fn build_prompt(topic: &str, source_text: &str) -> String {
    let source = if source_text.is_empty() {
        String::new()
    } else {
        format!("\nBase your content on this source material: {source_text}")
    };
    PROMPT_TEMPLATE
        .replace("{topic}", topic)
        .replace("{source}", &source)
}

/// Cap source text at `limit` characters, appending [`TRUNCATION_MARKER`]
/// when anything was cut. Operates on character boundaries so multi-byte
/// text never splits mid-codepoint.
pub fn truncate_source(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
