//! LLM-powered query synthesis and answer composition.

pub mod client;
pub mod composer;
pub mod prompts;
pub mod sse;
pub mod synthesizer;

pub use client::{ChatClient, CompletionModel, LlmProvider, TextStream};
pub use composer::{collect_answer, AnswerComposer, AnswerStream};
pub use synthesizer::{QuerySynthesizer, SynthesizedQuery};
