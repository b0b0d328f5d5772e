//! System prompts wrapping document content.

const INSTRUCTIONS: &str = "You are a helpful AI assistant that answers questions based on the provided document.\n\
Only answer questions based on the document content. If the answer is not in the document, \
politely state that you couldn't find the information in the document.";

const EXCERPT_PREAMBLE: &str = "The document is too large to send in full. Only a short excerpt \
from the beginning of the document is available below. Answer from this excerpt if you can, and \
say so if the question likely concerns a part of the document that is not included.";

/// The system prompt for a full or shrunk attempt.
pub fn document_prompt(content: &str) -> String {
    format!("{INSTRUCTIONS}\n\nDocument content:\n{content}")
}

/// The system prompt for the minimal-context attempt.
pub fn excerpt_prompt(excerpt: &str) -> String {
    format!("{INSTRUCTIONS}\n\n{EXCERPT_PREAMBLE}\n\nDocument excerpt:\n{excerpt}")
}
