//! Answer Composer: phrases a query result as a streamed prose answer.

use crate::llm::client::CompletionModel;
use crate::llm::prompts;
use crate::llm::synthesizer::SynthesizedQuery;
use crate::store::ExecutionResult;
use crate::types::{ChatError, Result};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};

/// Answer text fragments in arrival order.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Asks the model to explain a query result.
pub struct AnswerComposer {
    model: Arc<dyn CompletionModel>,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Start composing an answer.
    ///
    /// The returned stream is finite and not restartable. Errors while opening
    /// or reading it are `ChatError::Composer`.
    pub async fn compose(
        &self,
        question: &str,
        query: &SynthesizedQuery,
        result: &ExecutionResult,
    ) -> Result<AnswerStream> {
        let prompt = prompts::answer_prompt(question, query.as_str(), &result.render());
        let fragments = self
            .model
            .stream(&prompt)
            .await
            .map_err(ChatError::Composer)?;

        Ok(Box::pin(fragments.map(|item| item.map_err(ChatError::Composer))))
    }
}

/// Drain a stream into the full answer text.
///
/// Stops at the first error; the partial text is dropped.
pub async fn collect_answer(mut stream: AnswerStream) -> Result<String> {
    let mut answer = String::new();
    while let Some(fragment) = stream.next().await {
        answer.push_str(&fragment?);
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::TextStream;
    use crate::store::Cell;
    use crate::types::LlmError;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::Mutex;

    /// Streams a fixed list of fragments, optionally failing after them.
    struct ChunkedModel {
        chunks: Vec<String>,
        fail_after: bool,
        last_prompt: Mutex<Option<String>>,
    }

    impl ChunkedModel {
        fn new(chunks: Vec<String>, fail_after: bool) -> Arc<Self> {
            Arc::new(Self {
                chunks,
                fail_after,
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl CompletionModel for ChunkedModel {
        fn model_name(&self) -> &str {
            "chunked"
        }

        async fn complete(&self, _prompt: &str) -> std::result::Result<String, LlmError> {
            unreachable!("composer always streams")
        }

        async fn stream(&self, prompt: &str) -> std::result::Result<TextStream, LlmError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            let mut items: Vec<std::result::Result<String, LlmError>> =
                self.chunks.iter().cloned().map(Ok).collect();
            if self.fail_after {
                items.push(Err(LlmError::Request("connection reset".to_string())));
            }
            Ok(Box::pin(tokio_stream::iter(items)))
        }
    }

    fn count_result() -> ExecutionResult {
        ExecutionResult {
            columns: vec!["COUNT(*)".to_string()],
            rows: vec![vec![Cell::Integer(3)]],
            truncated: false,
        }
    }

    fn query() -> SynthesizedQuery {
        SynthesizedQuery::new("SELECT COUNT(*) FROM T")
    }

    #[tokio::test]
    async fn test_compose_embeds_question_query_and_result() {
        let model = ChunkedModel::new(vec!["There are ".into(), "3 rows.".into()], false);
        let composer = AnswerComposer::new(model.clone());

        let stream = composer
            .compose("how many rows are in T", &query(), &count_result())
            .await
            .unwrap();
        assert_eq!(collect_answer(stream).await.unwrap(), "There are 3 rows.");

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("how many rows are in T"));
        assert!(prompt.contains("SELECT COUNT(*) FROM T"));
        assert!(prompt.contains("COUNT(*)\n3"));
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_partial() {
        let model = ChunkedModel::new(vec!["There are ".into()], true);
        let stream = AnswerComposer::new(model)
            .compose("q", &query(), &count_result())
            .await
            .unwrap();
        let err = collect_answer(stream).await.unwrap_err();
        assert!(matches!(err, ChatError::Composer(LlmError::Request(_))));
    }

    fn rechunk(text: &str, cuts: &[usize]) -> Vec<String> {
        let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let mut points: Vec<usize> = cuts
            .iter()
            .filter_map(|c| bounds.get(c % bounds.len().max(1)).copied())
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut chunks = Vec::new();
        let mut start = 0;
        for p in points {
            chunks.push(text[start..p].to_string());
            start = p;
        }
        chunks.push(text[start..].to_string());
        chunks
    }

    proptest! {
        #[test]
        fn prop_rechunking_yields_same_answer(
            text in "[a-zA-Z0-9 .,é€]{0,64}",
            cuts in prop::collection::vec(any::<usize>(), 0..10),
        ) {
            let chunks = rechunk(&text, &cuts);
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let answer = rt.block_on(async {
                let stream = AnswerComposer::new(ChunkedModel::new(chunks, false))
                    .compose("q", &query(), &count_result())
                    .await
                    .unwrap();
                collect_answer(stream).await.unwrap()
            });
            prop_assert_eq!(answer, text);
        }
    }
}
