//! Grounding prompt construction

use veridex_common::models::ScoredChunk;

/// Separator between context chunks in the prompt.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Build the grounded generation prompt from the context chunks and the
/// raw question.
pub fn build_prompt(context: &[ScoredChunk], question: &str) -> String {
    let joined = context
        .iter()
        .map(|c| c.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    format!(
        "You are a factual, no-nonsense AI assistant answering questions \
         about the documents indexed by Veridex.\n\n\
         Context:\n{}\n\n\
         Question:\n{}\n",
        joined, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridex_common::models::{Chunk, ChunkMetadata};

    fn scored(text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                text: text.to_string(),
                metadata: ChunkMetadata {
                    source: "doc.pdf".to_string(),
                    content_hash: "hash".to_string(),
                    page: 0,
                    start_offset: 0,
                },
            },
            score: 0.9,
        }
    }

    #[test]
    fn test_chunks_joined_by_separator() {
        let prompt = build_prompt(&[scored("alpha"), scored("beta")], "a question");
        assert!(prompt.contains("alpha\n\n---\n\nbeta"));
    }

    #[test]
    fn test_prompt_contains_question_and_context_sections() {
        let prompt = build_prompt(&[scored("refund details")], "what is the refund policy?");
        assert!(prompt.contains("Context:\nrefund details"));
        assert!(prompt.contains("Question:\nwhat is the refund policy?"));
    }

    #[test]
    fn test_empty_context_still_produces_sections() {
        let prompt = build_prompt(&[], "anything");
        assert!(prompt.contains("Context:\n"));
        assert!(prompt.contains("Question:\nanything"));
    }
}
