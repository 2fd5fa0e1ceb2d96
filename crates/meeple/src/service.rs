//! The orchestration layer.
//!
//! [`Assistant`] routes each task through retrieval (or the rule book, for
//! summaries), its template, the generator, and post-processing. A task that
//! fails before generation never calls the backend and never touches the
//! session. A task that fails during generation leaves the session unchanged.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::DEFAULT_GAMES;
use crate::corpus::RuleBook;
use crate::error::{EntityStoreKind, RagError, Result};
use crate::generation::{GenerationRequest, Generator};
use crate::postprocess::{finish_answer, finish_recommendation, retain_grounded, ungrounded_lines};
use crate::prompt::{Prompt, Task, templates};
use crate::retrieval::{Retriever, requested_count};
use crate::session::{Role, SessionStore};

/// Grounded board-game assistant.
pub struct Assistant {
    retriever: Retriever,
    rules: RuleBook,
    generator: Arc<dyn Generator>,
    sessions: Arc<SessionStore>,
    strict_grounding: bool,
}

impl Assistant {
    pub fn new(
        retriever: Retriever,
        rules: RuleBook,
        generator: Arc<dyn Generator>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            retriever,
            rules,
            generator,
            sessions,
            strict_grounding: false,
        }
    }

    /// Drop recommendation lines naming games that were not retrieved.
    pub fn with_strict_grounding(mut self, strict: bool) -> Self {
        self.strict_grounding = strict;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Whether the recommendation corpus is loaded.
    pub fn is_ready(&self) -> bool {
        self.retriever.corpus().is_ready()
    }

    /// Recommend games from the global corpus.
    ///
    /// A count in the query ("5개") overrides `top_k`. Either is capped at the
    /// number of games in the corpus.
    pub async fn recommend(&self, query: &str, top_k: usize, session_id: &str) -> Result<String> {
        let k = requested_count(query)
            .unwrap_or(top_k)
            .min(self.retriever.corpus().labels().len());
        info!("Recommend: session={session_id}, k={k}");
        let result: Result<String> = async {
            let context = self.retriever.recommendation_context(query, k).await?;
            let prompt = templates::recommendation(&context.text, k, query);
            let raw = self.converse(&prompt, query, session_id).await?;

            let output = finish_recommendation(&raw);
            let ungrounded = ungrounded_lines(&output, &context.labels);
            for name in &ungrounded {
                warn!("Recommendation names '{name}', which was not in the retrieved context");
            }
            if self.strict_grounding && !ungrounded.is_empty() {
                return Ok(retain_grounded(&output, &context.labels));
            }
            Ok(output)
        }
        .await;
        log_failure(Task::Recommend, result)
    }

    /// Answer a question from one game's rule chunks.
    pub async fn answer_rule_question(
        &self,
        entity: &str,
        question: &str,
        session_id: &str,
    ) -> Result<String> {
        info!("Rule question: game={entity}, session={session_id}");
        let result: Result<String> = async {
            let context = self.retriever.rule_context(entity, question).await?;
            let prompt = templates::rule_question(entity, &context.text, question);
            let raw = self.converse(&prompt, question, session_id).await?;
            Ok(finish_answer(&raw))
        }
        .await;
        log_failure(Task::RuleQuestion, result)
    }

    /// Summarize one game's full rule text.
    pub async fn summarize_rules(&self, entity: &str, session_id: &str) -> Result<String> {
        info!("Rule summary: game={entity}, session={session_id}");
        let result: Result<String> = async {
            let record = self
                .rules
                .find(entity)
                .ok_or_else(|| RagError::EntityNotFound {
                    entity: entity.to_string(),
                    store: EntityStoreKind::FullRecords,
                })?;
            if record.text.is_empty() {
                return Err(RagError::EmptyRuleText {
                    entity: entity.to_string(),
                });
            }
            let prompt = templates::rule_summary(entity, &record.text);
            let raw = self.converse(&prompt, entity, session_id).await?;
            Ok(finish_answer(&raw))
        }
        .await;
        log_failure(Task::Summary, result)
    }

    /// Known games: corpus labels, else rule-book names, else a fixed list.
    pub fn list_entities(&self) -> Vec<String> {
        let labels = self.retriever.corpus().labels();
        if !labels.is_empty() {
            return labels.to_vec();
        }
        let names = self.rules.names();
        if !names.is_empty() {
            return names;
        }
        DEFAULT_GAMES.iter().map(|s| s.to_string()).collect()
    }

    /// Generate under the session lock and record the turn pair on success.
    ///
    /// `primary_input` is what gets stored as the human turn.
    async fn converse(&self, prompt: &Prompt, primary_input: &str, session_id: &str) -> Result<String> {
        let handle = self.sessions.get_or_create(session_id);
        let mut session = handle.lock().await;
        let raw = self
            .generator
            .generate(GenerationRequest {
                system: &prompt.system,
                history: session.turns(),
                user: &prompt.user,
            })
            .await
            .map_err(|e| RagError::backend(prompt.task, e))?;
        SessionStore::append(&mut session, Role::Human, primary_input);
        SessionStore::append(&mut session, Role::Assistant, raw.clone());
        Ok(raw)
    }
}

fn log_failure(task: Task, result: Result<String>) -> Result<String> {
    if let Err(ref e) = result {
        error!("{task} failed: {e}");
    }
    result
}

/// Render a task outcome as the text shown to the user.
pub fn render_reply(result: Result<String>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => e.user_message(),
    }
}
