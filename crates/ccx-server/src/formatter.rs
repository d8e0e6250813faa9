//! Tool response formatting
//!
//! Every tool returns a human-readable text view plus the raw JSON result as
//! a second content item, so agents can parse while humans can read.

use rmcp::model::{CallToolResult, Content};

use ccx_domain::value_objects::SearchResponse;

/// Build a successful tool result from a text view and a JSON payload
pub fn success(human: String, payload: serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(human), Content::text(payload.to_string())])
}

/// Build an error tool result carrying the failure text
pub fn failure(message: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message)])
}

/// Human view of a search response
pub fn render_search(query: &str, response: &SearchResponse) -> String {
    if response.hits.is_empty() {
        return format!("No results for \"{query}\".");
    }

    let mut out = format!(
        "{} results for \"{query}\" across {} dataset(s):\n\n",
        response.hits.len(),
        response.datasets_searched.len()
    );
    for (i, hit) in response.hits.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (score {:.4})\n",
            i + 1,
            hit.payload.source_path,
            hit.score
        ));
        if let Some(symbol) = &hit.payload.symbol_name {
            out.push_str(&format!("   symbol: {symbol}\n"));
        }
        let preview: String = hit.content.lines().take(3).collect::<Vec<_>>().join("\n   ");
        out.push_str(&format!("   {preview}\n\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccx_domain::value_objects::{ChunkPayload, SearchHit};

    #[test]
    fn empty_results_render_a_clear_message() {
        let rendered = render_search("auth", &SearchResponse::default());
        assert!(rendered.contains("No results"));
    }

    #[test]
    fn hits_render_with_rank_and_path() {
        let response = SearchResponse {
            hits: vec![SearchHit {
                chunk_id: "abc".into(),
                score: 0.91,
                payload: ChunkPayload {
                    project_id: "p".into(),
                    dataset_id: "d".into(),
                    source_path: "src/auth.rs".into(),
                    language: "rust".into(),
                    symbol_name: Some("authenticate".into()),
                    repo: None,
                },
                content: "fn authenticate() {}".into(),
            }],
            datasets_searched: vec!["local".into()],
        };
        let rendered = render_search("auth", &response);
        assert!(rendered.contains("1. src/auth.rs"));
        assert!(rendered.contains("authenticate"));
    }
}
