//! Runs a quiz server.
//!
//! ```text
//! QUIZFORGE_QUESTIONS=questions.json   # required, JSON list of questions
//! QUIZFORGE_BIND=0.0.0.0:8080          # optional, default 127.0.0.1:8080
//! QUIZFORGE_CONFIG=quiz.json           # optional, JSON QuizConfig
//! RUST_LOG=quizforge=debug             # optional, default info
//! ```

use quizforge::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<(), QuizforgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let questions = std::env::var("QUIZFORGE_QUESTIONS")
        .map_err(|_| QuizforgeError::Config("QUIZFORGE_QUESTIONS must name a question file".into()))?;
    let bind = std::env::var("QUIZFORGE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned());
    let config = match std::env::var("QUIZFORGE_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => QuizConfig::default(),
    };

    let bank = InMemoryBank::from_path(&questions)?;
    tracing::info!(path = %questions, questions = bank.len(), "question bank loaded");

    let server = QuizforgeServer::<InMemoryBank>::builder()
        .bind(&bind)
        .quiz_config(config)
        .build(bank)
        .await?;
    server.run().await
}

fn load_config(path: &str) -> Result<QuizConfig, QuizforgeError> {
    let raw = std::fs::read_to_string(path).map_err(|source| QuizforgeError::Io {
        path: path.to_owned(),
        source,
    })?;
    QuizConfig::from_json_str(&raw)
        .map_err(|e| QuizforgeError::Config(format!("{path}: {e}")))
}
