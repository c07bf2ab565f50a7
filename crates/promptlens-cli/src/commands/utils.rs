//! Stack wiring shared by the commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use promptlens_application::{
    AutoApprove, ConfirmationGate, GenerationUseCase, Notice, NoticeCallback, SavedPromptService,
};
use promptlens_core::config::PromptLensConfig;
use promptlens_core::entry::{Entry, GenerationStatus};
use promptlens_infrastructure::{
    FsBlobStore, InlineImageTransform, SettingsStore, TomlEntryRepository, TomlLedgerRepository,
    TomlSavedRepository, settings,
};
use promptlens_interaction::GeminiGateway;

/// The file-backed storage stack under the platform data directory.
pub struct Stack {
    pub config: PromptLensConfig,
    pub entries: Arc<TomlEntryRepository>,
    pub saved: Arc<TomlSavedRepository>,
    pub ledger: Arc<TomlLedgerRepository>,
    pub blobs: Arc<FsBlobStore>,
}

impl Stack {
    pub fn open() -> Result<Self> {
        let config = SettingsStore::open_default()?.load()?;
        let data = settings::data_dir()?;
        Ok(Self {
            entries: Arc::new(TomlEntryRepository::new(data.join("history.toml"))),
            saved: Arc::new(TomlSavedRepository::new(data.join("saved.toml"))),
            ledger: Arc::new(TomlLedgerRepository::new(
                data.join("credits.toml"),
                config.initial_credits,
            )),
            blobs: Arc::new(FsBlobStore::new(data.join("blobs"))),
            config,
        })
    }

    /// Builds the generation coordinator. Requires `GEMINI_API_KEY`.
    pub fn generation_usecase(&self) -> Result<Arc<GenerationUseCase>> {
        let gateway = Arc::new(
            GeminiGateway::try_from_env().context("GEMINI_API_KEY must be set to generate")?,
        );
        let gate: Arc<dyn ConfirmationGate> = if self.config.confirm_before_spend {
            Arc::new(StdinGate)
        } else {
            Arc::new(AutoApprove)
        };
        Ok(Arc::new(GenerationUseCase::new(
            self.config.clone(),
            self.entries.clone(),
            self.ledger.clone(),
            gateway,
            self.blobs.clone(),
            Arc::new(InlineImageTransform::new()),
            gate,
            print_notices(),
        )))
    }

    pub fn saved_service(&self) -> SavedPromptService {
        SavedPromptService::new(
            self.config.undo_window(),
            self.saved.clone(),
            self.blobs.clone(),
            print_notices(),
        )
    }
}

/// Confirmation gate that asks on the terminal.
struct StdinGate;

#[async_trait]
impl ConfirmationGate for StdinGate {
    async fn confirm_spend(&self, cost: u64) -> bool {
        let answer = tokio::task::spawn_blocking(move || {
            use std::io::Write;
            print!("Spend {cost} credits on this generation? [y/N] ");
            let _ = std::io::stdout().flush();
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_err() {
                return false;
            }
            matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
        })
        .await;
        answer.unwrap_or(false)
    }
}

/// Notice callback that writes to stderr.
pub fn print_notices() -> NoticeCallback {
    Arc::new(|notice| match notice {
        Notice::GenerationStopped => eprintln!("Generation stopped."),
        Notice::GenerationFailed { message, .. } => eprintln!("{message}"),
        Notice::PersistenceDegraded => {
            eprintln!("Image upload failed; keeping the local preview only.")
        }
        Notice::SavedPromptDeleted { .. } => eprintln!("Saved prompt deleted."),
    })
}

pub fn print_entry(entry: &Entry) {
    let status = match entry.status {
        GenerationStatus::Generating => "generating",
        GenerationStatus::Done => "done",
        GenerationStatus::Stopped => "stopped",
        GenerationStatus::Error => "error",
    };
    println!(
        "[{status}] {} ({})",
        entry.id,
        entry.created_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(prompt) = &entry.prompt {
        println!("  {prompt}");
    }
}
