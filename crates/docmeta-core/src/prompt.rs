//! Prompt construction for the metadata generator.

/// Upper bound on the number of characters of document text sent to the model.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 15_000;

pub const SYSTEM_PROMPT: &str = "You are a document analysis assistant. \
You read the text of a document and describe it with accurate, concise metadata. \
Only use information supported by the text.";

/// Return the prefix of `text` holding at most `max_chars` characters, and
/// whether anything was cut off. Never splits a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Wrap document text in the extraction instruction.
pub fn build_user_prompt(text: &str) -> String {
    format!(
        "Analyze the following document and extract structured metadata.\n\
         - title: the document title; infer a descriptive one if none is stated\n\
         - author: the author or issuing organization, or null if unknown\n\
         - summary: 2-3 sentences\n\
         - topics: 3-5 main topics\n\
         - keywords: 5-10 keywords\n\
         - documentType: one of report, article, letter, contract, manual, \
         presentation, academic_paper, invoice, resume, other\n\
         \n\
         Document text:\n\
         ---\n\
         {text}\n\
         ---"
    )
}
