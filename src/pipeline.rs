//! Question-answering pipeline: synthesize → execute → compose → log.
//!
//! One question runs at a time against the session's active store. Progress is
//! reported through a caller-supplied observer so any surface (terminal, web
//! page, test) can render the query and the streamed answer as they arrive.

use crate::config::Config;
use crate::executor::QueryExecutor;
use crate::llm::{AnswerComposer, CompletionModel, QuerySynthesizer, SynthesizedQuery};
use crate::otel::pipeline_span;
use crate::session::{LogEntry, PipelineStage, SessionContext};
use crate::store::ExecutionResult;
use crate::types::{ChatError, LlmError, Result};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn, Instrument};

/// Progress notifications from one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipelineEvent<'a> {
    /// The pipeline entered a new stage
    Stage(PipelineStage),
    /// SQL produced by the synthesizer
    Query(&'a str),
    /// Next fragment of the streamed answer
    Fragment(&'a str),
}

/// Everything produced for one successfully answered question.
#[derive(Debug, Clone)]
pub struct Turn {
    pub question: String,
    pub query: SynthesizedQuery,
    pub result: ExecutionResult,
    pub answer: String,
}

/// Wires synthesizer, executor and composer together.
pub struct Pipeline {
    synthesizer: QuerySynthesizer,
    executor: QueryExecutor,
    composer: AnswerComposer,
    top_k: usize,
}

impl Pipeline {
    pub fn new(model: Arc<dyn CompletionModel>, config: &Config) -> Self {
        Self {
            synthesizer: QuerySynthesizer::new(Arc::clone(&model)),
            executor: QueryExecutor::new(config.execution_limits()),
            composer: AnswerComposer::new(model),
            top_k: config.top_k,
        }
    }

    /// Answer one question against the session's active store.
    ///
    /// On success the turn is appended to the session log. On failure the
    /// observer sees `Stage(Failed)`, any partial answer is dropped and the log
    /// is left untouched. Either way the session is back at `Idle` afterwards.
    ///
    /// # Errors
    ///
    /// - `ChatError::EmptyQuestion` / `ChatError::NoDatabase` before any stage runs
    /// - `ChatError::Synthesis`, `Execution`, `ReadOnlyViolation` or `Composer`
    ///   from the stage that failed
    pub async fn ask<F>(&self, ctx: &mut SessionContext, question: &str, mut observer: F) -> Result<Turn>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if !ctx.has_database() {
            return Err(ChatError::NoDatabase);
        }

        let span = pipeline_span(ctx.id());
        let outcome = self
            .run(ctx, question, &mut observer)
            .instrument(span)
            .await;

        match outcome {
            Ok(turn) => {
                ctx.log.append(LogEntry::new(
                    turn.question.clone(),
                    turn.answer.clone(),
                    turn.query.as_str(),
                ));
                enter(ctx, PipelineStage::Logged, &mut observer);
                info!(
                    session_id = %ctx.id(),
                    rows = turn.result.row_count(),
                    answer_chars = turn.answer.chars().count(),
                    history = ctx.log().len(),
                    "Question answered"
                );
                ctx.stage = PipelineStage::Idle;
                Ok(turn)
            }
            Err(err) => {
                let failed_in = ctx.stage;
                enter(ctx, PipelineStage::Failed, &mut observer);
                warn!(session_id = %ctx.id(), stage = %failed_in, error = %err, "Question failed");
                ctx.stage = PipelineStage::Idle;
                Err(err)
            }
        }
    }

    async fn run<F>(&self, ctx: &mut SessionContext, question: &str, observer: &mut F) -> Result<Turn>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        enter(ctx, PipelineStage::Synthesizing, observer);
        let store = ctx.store.as_ref().ok_or(ChatError::NoDatabase)?;
        let query = self
            .synthesizer
            .synthesize(question, store.describe_schema(), self.top_k)
            .await?;
        debug!(sql = %query, "Query synthesized");
        observer(PipelineEvent::Query(query.as_str()));

        enter(ctx, PipelineStage::Executing, observer);
        let store = ctx.store.as_ref().ok_or(ChatError::NoDatabase)?;
        let result = self.executor.execute(store, &query)?;

        enter(ctx, PipelineStage::Composing, observer);
        let mut stream = self.composer.compose(question, &query, &result).await?;
        let mut answer = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            observer(PipelineEvent::Fragment(&fragment));
            answer.push_str(&fragment);
        }
        if answer.trim().is_empty() {
            return Err(ChatError::Composer(LlmError::Empty));
        }

        Ok(Turn {
            question: question.to_string(),
            query,
            result,
            answer,
        })
    }
}

fn enter<F>(ctx: &mut SessionContext, stage: PipelineStage, observer: &mut F)
where
    F: FnMut(PipelineEvent<'_>),
{
    ctx.stage = stage;
    debug!(stage = %stage, "Pipeline stage");
    observer(PipelineEvent::Stage(stage));
}
