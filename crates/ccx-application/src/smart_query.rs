//! Smart query: retrieve then synthesize
//!
//! Optional terminal stage layering an LLM over the retrieval pipeline. The
//! model is asked for strict JSON; an empty answer and malformed JSON are
//! reported as distinct errors so callers can tell them apart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ccx_domain::ports::LlmClient;
use ccx_domain::value_objects::{QueryRequest, SearchHit};
use ccx_domain::{Error, Result};

use crate::retrieval::RetrievalPipeline;

const SYSTEM_PROMPT: &str = "You answer questions about an indexed corpus. \
Use only the numbered context passages. Respond with strict JSON of the form \
{\"answer\": \"...\", \"citations\": [1, 2]} where citations are the numbers \
of the passages you relied on. No prose outside the JSON.";

/// A citation pointing back at a retrieved chunk
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    /// 1-based passage number shown to the model
    pub index: usize,
    /// Source path of the cited chunk
    pub source_path: String,
    /// Chunk id of the cited chunk
    pub chunk_id: String,
}

/// Synthesized answer with its supporting retrieval hits
#[derive(Debug, Clone, Serialize)]
pub struct SmartAnswer {
    /// Natural-language answer
    pub answer: String,
    /// Passages the model cited
    pub citations: Vec<Citation>,
    /// The retrieval hits the answer was built from
    pub hits: Vec<SearchHit>,
    /// Model that produced the answer
    pub model: String,
}

#[derive(Deserialize)]
struct ModelReply {
    answer: String,
    #[serde(default)]
    citations: Vec<usize>,
}

/// Retrieval plus LLM synthesis
pub struct SmartQueryService {
    retrieval: Arc<RetrievalPipeline>,
    llm: Arc<dyn LlmClient>,
}

impl SmartQueryService {
    /// Create a smart-query service
    pub fn new(retrieval: Arc<RetrievalPipeline>, llm: Arc<dyn LlmClient>) -> Self {
        Self { retrieval, llm }
    }

    /// Retrieve context for the request and synthesize an answer
    pub async fn answer(&self, request: &QueryRequest) -> Result<SmartAnswer> {
        let response = self.retrieval.search(request).await?;
        if response.hits.is_empty() {
            return Ok(SmartAnswer {
                answer: String::new(),
                citations: Vec::new(),
                hits: Vec::new(),
                model: self.llm.model().to_string(),
            });
        }

        let mut prompt = format!("Question: {}\n\nContext passages:\n", request.query_text);
        for (i, hit) in response.hits.iter().enumerate() {
            prompt.push_str(&format!(
                "[{}] {}\n{}\n\n",
                i + 1,
                hit.payload.source_path,
                hit.content
            ));
        }

        let raw = self.llm.complete(SYSTEM_PROMPT, &prompt).await?;
        debug!(bytes = raw.len(), "model replied");

        let reply: ModelReply = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|e| Error::llm(format!("model returned invalid JSON: {e}")))?;
        if reply.answer.trim().is_empty() {
            return Err(Error::llm("model returned an empty answer"));
        }

        let citations = reply
            .citations
            .into_iter()
            .filter_map(|index| {
                response.hits.get(index.checked_sub(1)?).map(|hit| Citation {
                    index,
                    source_path: hit.payload.source_path.clone(),
                    chunk_id: hit.chunk_id.clone(),
                })
            })
            .collect();

        Ok(SmartAnswer {
            answer: reply.answer,
            citations,
            hits: response.hits,
            model: self.llm.model().to_string(),
        })
    }
}

/// Strip a surrounding markdown code fence if the model added one
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(
            strip_code_fences("```json\n{\"answer\":\"x\"}\n```"),
            "{\"answer\":\"x\"}"
        );
        assert_eq!(strip_code_fences("{\"answer\":\"x\"}"), "{\"answer\":\"x\"}");
    }
}
