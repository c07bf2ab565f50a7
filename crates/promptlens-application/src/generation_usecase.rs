//! Generation lifecycle coordination.
//!
//! `GenerationUseCase` is the single writer for the entry store. It owns the
//! full path of a generation intent: validation, credit reservation, the
//! cancellable gateway call, status transitions, persistence and refunds.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use promptlens_core::blob::{BlobStore, entry_image_path};
use promptlens_core::config::PromptLensConfig;
use promptlens_core::credit::{CreditLedger, LedgerError, LedgerRepository};
use promptlens_core::entry::{Entry, EntryRepository, EntryStore, GenerationStatus};
use promptlens_core::error::{PromptLensError, Result};
use promptlens_core::gateway::{ErrorCategory, GatewayError, TransformGateway};
use promptlens_core::image::{CompressOptions, ImagePayload, ImageTransform};

use crate::confirm::ConfirmationGate;
use crate::notice::{Notice, NoticeCallback};

/// Largest dimension of the locally kept preview.
pub const THUMBNAIL_MAX_DIM: u32 = 400;

/// Validation message for submissions while offline.
pub const OFFLINE_MESSAGE: &str = "You're offline. Try later.";

/// Error prompt when no image bytes can be recovered for a regenerate.
pub const REGENERATE_FAILED_MESSAGE: &str = "Failed to regenerate. Please try uploading again.";

struct ActiveAttempt {
    entry_id: String,
    token: CancellationToken,
}

/// Coordinates the generation lifecycle of chat entries.
///
/// At most one attempt is in flight at a time; a new submit force-stops the
/// previous attempt (stopped status plus refund) before its own reservation,
/// so no interleaving double-charges or double-refunds.
pub struct GenerationUseCase {
    config: PromptLensConfig,
    store: Arc<RwLock<EntryStore>>,
    entries: Arc<dyn EntryRepository>,
    ledger: CreditLedger,
    gateway: Arc<dyn TransformGateway>,
    blobs: Arc<dyn BlobStore>,
    transform: Arc<dyn ImageTransform>,
    gate: Arc<dyn ConfirmationGate>,
    notices: NoticeCallback,
    online: AtomicBool,
    /// Serializes the force-stop/reserve/activate window of each intent.
    intent: Mutex<()>,
    active: Mutex<Option<ActiveAttempt>>,
    /// Request bytes by entry id, for in-process regeneration.
    payloads: Mutex<HashMap<String, ImagePayload>>,
}

impl GenerationUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PromptLensConfig,
        entries: Arc<dyn EntryRepository>,
        ledger: Arc<dyn LedgerRepository>,
        gateway: Arc<dyn TransformGateway>,
        blobs: Arc<dyn BlobStore>,
        transform: Arc<dyn ImageTransform>,
        gate: Arc<dyn ConfirmationGate>,
        notices: NoticeCallback,
    ) -> Self {
        Self {
            config,
            store: Arc::new(RwLock::new(EntryStore::new())),
            entries,
            ledger: CreditLedger::new(ledger),
            gateway,
            blobs,
            transform,
            gate,
            notices,
            online: AtomicBool::new(true),
            intent: Mutex::new(()),
            active: Mutex::new(None),
            payloads: Mutex::new(HashMap::new()),
        }
    }

    /// Marks the app online/offline. Offline submissions are rejected before
    /// any credits are touched.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// The locally mirrored credit balance.
    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    /// Snapshot of all entries in creation order.
    pub async fn entries(&self) -> Vec<Entry> {
        self.store.read().await.entries().to_vec()
    }

    /// Snapshot of one entry.
    pub async fn entry(&self, id: &str) -> Option<Entry> {
        self.store.read().await.get(id).cloned()
    }

    /// Pulls the remote history and balance into the local copies.
    ///
    /// Merge precedence: remote persisted fields win, a locally-held
    /// thumbnail survives until the remote record carries an image, local
    /// entries the remote has not acknowledged are preserved. A failed
    /// balance read keeps the current mirror.
    pub async fn refresh_from_remote(&self) -> Result<()> {
        let remote = self.entries.list_all().await?;
        self.store.write().await.merge_remote(remote);
        if let Err(e) = self.ledger.sync().await {
            warn!(error = %e, "balance refresh failed, keeping local mirror");
        }
        Ok(())
    }

    /// Submits a new image for generation.
    ///
    /// Returns `Ok(None)` when the confirmation gate declined the spend.
    /// Otherwise the returned entry is the settled attempt: done, stopped or
    /// error are all `Ok(Some(_))`.
    ///
    /// # Errors
    ///
    /// Pre-flight rejections only: invalid/oversized image, offline, or
    /// insufficient credits. None of these create an entry or touch the
    /// ledger beyond the authoritative re-check in `reserve`.
    pub async fn submit(&self, bytes: Vec<u8>) -> Result<Option<Entry>> {
        self.ensure_online()?;
        let mut payload = ImagePayload::from_bytes(bytes)?;
        if self.config.compress_uploads {
            payload = self.transform.compress(&payload, &CompressOptions::default())?;
        }

        let cost = self.config.generation_cost;
        if !self.ledger.has_enough(cost) {
            return Err(PromptLensError::InsufficientCredits {
                required: cost,
                balance: self.ledger.balance(),
            });
        }
        if self.config.confirm_before_spend && !self.gate.confirm_spend(cost).await {
            info!("spend declined, abandoning submit");
            return Ok(None);
        }

        let (entry_id, token) = {
            let _intent = self.intent.lock().await;
            self.force_stop_active().await;
            self.ledger.reserve(cost).await.map_err(Self::ledger_error)?;

            let thumbnail = self.transform.thumbnail(&payload, THUMBNAIL_MAX_DIM).ok();
            let entry = Entry::new(thumbnail);
            let entry_id = entry.id.clone();
            info!(entry_id = %entry_id, "generation attempt started");

            self.store.write().await.append(entry.clone());
            self.payloads
                .lock()
                .await
                .insert(entry_id.clone(), payload.clone());
            if let Err(e) = self.entries.create(&entry).await {
                warn!(error = %e, entry_id = %entry_id, "remote create failed, keeping local entry");
            }
            self.apply_trim().await;

            (entry_id, self.activate(&entry.id).await)
        };

        let settled = self.run_attempt(&entry_id, &payload, token).await?;
        Ok(Some(settled))
    }

    /// Re-runs generation for a terminal entry, in place.
    ///
    /// Image bytes are recovered from the in-process cache, the uploaded
    /// blob, or the thumbnail data URI, in that order. When none of those
    /// yields a valid image the entry settles in the error state and the
    /// reservation is refunded without a gateway call.
    pub async fn regenerate(&self, id: &str) -> Result<Option<Entry>> {
        self.ensure_online()?;
        {
            let store = self.store.read().await;
            let entry = store
                .get(id)
                .ok_or_else(|| PromptLensError::not_found("entry", id))?;
            if !entry.is_terminal() {
                return Err(PromptLensError::validation("Generation already in progress"));
            }
        }

        let cost = self.config.generation_cost;
        if !self.ledger.has_enough(cost) {
            return Err(PromptLensError::InsufficientCredits {
                required: cost,
                balance: self.ledger.balance(),
            });
        }
        if self.config.confirm_before_spend && !self.gate.confirm_spend(cost).await {
            info!("spend declined, abandoning regenerate");
            return Ok(None);
        }

        let recovered = {
            let _intent = self.intent.lock().await;
            self.force_stop_active().await;
            self.ledger.reserve(cost).await.map_err(Self::ledger_error)?;

            match self.recover_payload(id).await {
                Some(payload) => {
                    self.store.write().await.update(id, |e| {
                        e.restart();
                    });
                    self.payloads
                        .lock()
                        .await
                        .insert(id.to_string(), payload.clone());
                    info!(entry_id = %id, "regeneration attempt started");
                    Some((payload, self.activate(id).await))
                }
                None => {
                    warn!(entry_id = %id, "no recoverable image bytes, refunding");
                    self.refund(cost).await;
                    self.store.write().await.update(id, |e| {
                        e.restart();
                        e.fail(REGENERATE_FAILED_MESSAGE);
                    });
                    (self.notices)(Notice::GenerationFailed {
                        category: ErrorCategory::Retryable,
                        message: REGENERATE_FAILED_MESSAGE.to_string(),
                    });
                    None
                }
            }
        };

        let Some((payload, token)) = recovered else {
            self.persist_update(id).await;
            return Ok(self.store.read().await.get(id).cloned());
        };
        let settled = self.run_attempt(id, &payload, token).await?;
        Ok(Some(settled))
    }

    /// Requests cancellation of the in-flight attempt, if any.
    ///
    /// The attempt itself settles through the stopped path: marker prompt,
    /// stopped status, full refund.
    pub async fn cancel(&self) {
        let active = self.active.lock().await;
        if let Some(attempt) = active.as_ref() {
            info!(entry_id = %attempt.entry_id, "cancellation requested");
            attempt.token.cancel();
        }
    }

    /// Clears the conversation: cancels the in-flight attempt, empties the
    /// local store and issues a best-effort remote clear including uploaded
    /// blobs.
    pub async fn new_chat(&self) {
        {
            let _intent = self.intent.lock().await;
            self.force_stop_active().await;
        }
        let removed = self.store.write().await.clear();
        self.payloads.lock().await.clear();

        if let Err(e) = self.entries.clear().await {
            warn!(error = %e, "remote clear failed");
        }
        for entry in removed {
            if entry.image_ref.is_some() {
                let _ = self.blobs.delete(&entry_image_path(&entry.id)).await;
            }
        }
    }

    fn ensure_online(&self) -> Result<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(PromptLensError::validation(OFFLINE_MESSAGE))
        }
    }

    fn ledger_error(err: LedgerError) -> PromptLensError {
        match err {
            LedgerError::Insufficient { required, balance } => {
                PromptLensError::InsufficientCredits { required, balance }
            }
            LedgerError::Remote(message) => PromptLensError::data_access(message),
        }
    }

    async fn activate(&self, entry_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        *self.active.lock().await = Some(ActiveAttempt {
            entry_id: entry_id.to_string(),
            token: token.clone(),
        });
        token
    }

    /// Stops the in-flight attempt synchronously: cancels its token, applies
    /// the stopped transition and refunds.
    ///
    /// The transition's boolean return is the refund guard. The woken attempt
    /// task finds its own stop/fail transition already taken and skips the
    /// refund, so a force-stop and a late cancellation wake-up settle exactly
    /// once between them.
    async fn force_stop_active(&self) {
        let attempt = self.active.lock().await.take();
        let Some(attempt) = attempt else { return };
        attempt.token.cancel();

        let applied = self
            .store
            .write()
            .await
            .update(&attempt.entry_id, |e| e.stop());
        if applied == Some(true) {
            info!(entry_id = %attempt.entry_id, "in-flight attempt force-stopped");
            self.refund(self.config.generation_cost).await;
            self.persist_update(&attempt.entry_id).await;
        }
    }

    /// Runs the gateway call and settles the entry from its outcome.
    async fn run_attempt(
        &self,
        id: &str,
        payload: &ImagePayload,
        token: CancellationToken,
    ) -> Result<Entry> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let pump_store = Arc::clone(&self.store);
        let pump_token = token.clone();
        let pump_id = id.to_string();
        // Phase labels arriving after cancellation are discarded.
        let pump = tokio::spawn(async move {
            while let Some(phase) = rx.recv().await {
                if pump_token.is_cancelled() {
                    continue;
                }
                pump_store.write().await.update(&pump_id, |e| {
                    e.push_phase(phase);
                });
            }
        });

        let result = self.gateway.generate(payload, tx, token).await;
        let _ = pump.await;

        {
            let mut active = self.active.lock().await;
            if active.as_ref().is_some_and(|a| a.entry_id == id) {
                *active = None;
            }
        }

        let cost = self.config.generation_cost;
        match result {
            Ok(text) => {
                let applied = self.store.write().await.update(id, |e| e.complete(text));
                if applied == Some(true) {
                    info!(entry_id = %id, "generation done");
                }
            }
            Err(GatewayError::Aborted) => {
                let applied = self.store.write().await.update(id, |e| e.stop());
                if applied == Some(true) {
                    info!(entry_id = %id, "generation stopped");
                    self.refund(cost).await;
                    (self.notices)(Notice::GenerationStopped);
                }
            }
            Err(err) => {
                let message = err.user_message();
                let applied = self.store.write().await.update(id, |e| e.fail(message));
                if applied == Some(true) {
                    warn!(entry_id = %id, error = %err, "generation failed");
                    self.refund(cost).await;
                    (self.notices)(Notice::GenerationFailed {
                        category: err.category(),
                        message: message.to_string(),
                    });
                }
            }
        }

        self.persist_settled(id, payload).await;
        self.store
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PromptLensError::not_found("entry", id))
    }

    /// Refunds a reservation. Failures are logged only; a status transition
    /// never blocks on the ledger.
    async fn refund(&self, amount: u64) {
        if let Err(e) = self.ledger.refund(amount).await {
            warn!(error = %e, amount, "refund failed, balance may be understated");
        }
    }

    /// Uploads the image (once per entry) and pushes the settled entry to the
    /// remote store. A failed upload degrades the entry to thumbnail-only and
    /// emits a single notice.
    ///
    /// Stopped entries are persisted as-is: cancellation never mutates the
    /// entry beyond the stopped transition itself, so no upload happens and
    /// a later cross-process regenerate falls back to the thumbnail.
    async fn persist_settled(&self, id: &str, payload: &ImagePayload) {
        let needs_upload = self
            .store
            .read()
            .await
            .get(id)
            .map(|e| e.status != GenerationStatus::Stopped && e.image_ref.is_none());
        if needs_upload == Some(true) {
            match self.blobs.upload(payload.bytes(), &entry_image_path(id)).await {
                Ok(url) => {
                    self.store.write().await.update(id, |e| {
                        e.image_ref = Some(url);
                    });
                }
                Err(e) => {
                    warn!(error = %e, entry_id = %id, "image upload failed, keeping thumbnail only");
                    (self.notices)(Notice::PersistenceDegraded);
                }
            }
        }
        self.persist_update(id).await;
    }

    async fn persist_update(&self, id: &str) {
        if let Some(entry) = self.store.read().await.get(id).cloned() {
            if let Err(e) = self.entries.update(&entry).await {
                warn!(error = %e, entry_id = %id, "remote update failed");
            }
        }
    }

    /// Recovers request bytes for a regenerate: payload cache, then the
    /// uploaded blob, then the thumbnail data URI.
    async fn recover_payload(&self, id: &str) -> Option<ImagePayload> {
        if let Some(payload) = self.payloads.lock().await.get(id).cloned() {
            return Some(payload);
        }
        let (image_ref, thumbnail) = {
            let store = self.store.read().await;
            let entry = store.get(id)?;
            (entry.image_ref.clone(), entry.thumbnail.clone())
        };
        if let Some(url) = image_ref {
            match self.blobs.download(&url).await {
                Ok(bytes) => match ImagePayload::from_bytes(bytes) {
                    Ok(payload) => return Some(payload),
                    Err(e) => warn!(error = %e, entry_id = %id, "downloaded blob is not a valid image"),
                },
                Err(e) => warn!(error = %e, entry_id = %id, "blob download failed"),
            }
        }
        thumbnail.and_then(|uri| ImagePayload::from_data_uri(&uri).ok())
    }

    /// Applies capacity/age trimming and issues non-blocking remote deletes
    /// for the evicted entries.
    async fn apply_trim(&self) {
        let policy = self.config.trim_policy();
        if policy.max_entries.is_none() && policy.max_age.is_none() {
            return;
        }
        let evicted = self.store.write().await.trim(&policy, Utc::now());
        if evicted.is_empty() {
            return;
        }
        {
            let mut payloads = self.payloads.lock().await;
            for entry in &evicted {
                payloads.remove(&entry.id);
            }
        }
        let repo = Arc::clone(&self.entries);
        let blobs = Arc::clone(&self.blobs);
        tokio::spawn(async move {
            for entry in evicted {
                if let Err(e) = repo.delete(&entry.id).await {
                    warn!(error = %e, entry_id = %entry.id, "remote delete of trimmed entry failed");
                }
                if entry.image_ref.is_some() {
                    let _ = blobs.delete(&entry_image_path(&entry.id)).await;
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "generation_usecase_test.rs"]
mod tests;
