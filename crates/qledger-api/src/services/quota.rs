//! Quota service.
//!
//! The only caller of the ledger. Each operation loads the account, runs it
//! through the ledger and writes the result back with a revision check.
//! Debits for one user are serialized in-process by a per-account mutex;
//! across processes a lost race is detected by the store and the debit is
//! recomputed from a fresh read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use qledger_engine::{Evaluation, PlanCatalog, QuotaLedger};
use qledger_models::{now_millis, Account, AccountState, Action, EpochMillis, PlanEntitlements, PlanTier};
use qledger_store::AccountStore;

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Attempts at a conditional write before giving up.
pub const MAX_COMMIT_RETRIES: u32 = 5;

/// Linear backoff step between attempts.
const COMMIT_BACKOFF_MS: u64 = 50;

/// Per-account lock entries kept before idle ones are pruned.
const MAX_TRACKED_LOCKS: usize = 10_000;

/// Source of the current time in epoch millis.
pub type Clock = Arc<dyn Fn() -> EpochMillis + Send + Sync>;

/// Account view returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaSnapshot {
    pub account: Account,
    pub state: AccountState,
    pub entitlements: PlanEntitlements,
}

/// Result of a successful debit.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumeOutcome {
    /// Account after the debit.
    pub account: Account,
    /// What was charged.
    pub action: Action,
    /// False if the debit stands in memory only.
    pub persisted: bool,
    /// Conditional-write attempts used.
    pub attempts: u32,
}

/// Quota operations over an account store.
#[derive(Clone)]
pub struct QuotaService {
    store: Arc<dyn AccountStore>,
    ledger: Arc<QuotaLedger>,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    clock: Clock,
}

impl QuotaService {
    /// Create a service with the default ledger and the system clock.
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self::with_ledger(store, QuotaLedger::default())
    }

    pub fn with_ledger(store: Arc<dyn AccountStore>, ledger: QuotaLedger) -> Self {
        Self {
            store,
            ledger: Arc::new(ledger),
            locks: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(now_millis),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    fn now(&self) -> EpochMillis {
        (self.clock)()
    }

    async fn account_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        if locks.len() >= MAX_TRACKED_LOCKS {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    /// Load the account, creating it with new-account defaults on first sight.
    async fn load_or_create(&self, user_id: &str, now: EpochMillis) -> ApiResult<Account> {
        if let Some(account) = self.store.load(user_id).await? {
            return Ok(account);
        }

        let created = self.store.save(&Account::new(user_id, now)).await?;
        info!(user_id = %user_id, credits = created.credits, "Created account");
        Ok(created)
    }

    fn note_resets(&self, before: &Account, after: &Account) {
        if after.last_credit_reset != before.last_credit_reset {
            metrics::record_window_reset("credit");
            info!(
                user_id = %after.user_id,
                plan = %after.plan,
                credits = after.credits,
                "Credit window reset"
            );
        }
        if after.last_image_reset != before.last_image_reset {
            metrics::record_window_reset("image");
            info!(
                user_id = %after.user_id,
                previous_count = before.daily_image_count,
                "Image window reset"
            );
        }
    }

    /// Write window resets back. Failure is logged and the reset account is
    /// still returned, since the next read recomputes the same resets.
    async fn persist_resets(&self, before: &Account, reconciled: Account) -> Account {
        if before.same_quota(&reconciled) {
            return reconciled;
        }

        match self.store.save_if_revision(&reconciled, before.revision).await {
            Ok(stored) => stored,
            Err(e) if e.is_precondition_failed() => {
                debug!(user_id = %reconciled.user_id, "Account moved on while persisting resets");
                reconciled
            }
            Err(e) => {
                warn!(user_id = %reconciled.user_id, error = %e, "Failed to persist window resets");
                reconciled
            }
        }
    }

    fn snapshot_of(&self, account: Account) -> QuotaSnapshot {
        QuotaSnapshot {
            state: self.ledger.state(&account),
            entitlements: self.ledger.catalog().entitlements(account.plan),
            account,
        }
    }

    /// Current account after any due window resets.
    pub async fn snapshot(&self, user_id: &str) -> ApiResult<QuotaSnapshot> {
        let now = self.now();
        let current = self.load_or_create(user_id, now).await?;
        let reconciled = self.ledger.reconcile(&current, now).account;
        self.note_resets(&current, &reconciled);

        let account = self.persist_resets(&current, reconciled).await;
        Ok(self.snapshot_of(account))
    }

    /// Decide whether a request would be allowed without charging for it.
    pub async fn evaluate(&self, user_id: &str, text: &str, has_attachments: bool) -> ApiResult<Evaluation> {
        let now = self.now();
        let current = self.load_or_create(user_id, now).await?;
        let mut evaluation = self.ledger.evaluate(&current, now, text, has_attachments);
        self.note_resets(&current, &evaluation.account);

        evaluation.account = self.persist_resets(&current, evaluation.account.clone()).await;
        Ok(evaluation)
    }

    /// Check and debit one request.
    ///
    /// A denial returns [`ApiError::Denied`] and writes nothing but resets.
    /// Once this returns `Ok` the debit stands; there are no refunds.
    pub async fn consume(&self, user_id: &str, text: &str, has_attachments: bool) -> ApiResult<ConsumeOutcome> {
        let lock = self.account_lock(user_id).await;
        let _guard = lock.lock().await;

        for attempt in 1..=MAX_COMMIT_RETRIES {
            let now = self.now();
            let current = self.load_or_create(user_id, now).await?;
            let evaluation = self.ledger.evaluate(&current, now, text, has_attachments);
            let action = evaluation.action;
            self.note_resets(&current, &evaluation.account);

            metrics::record_decision(action.kind.as_str(), evaluation.decision.outcome());

            let debited = match self.ledger.commit_evaluation(&evaluation) {
                Ok(account) => account,
                Err(e) => {
                    debug!(
                        user_id = %user_id,
                        kind = %action.kind,
                        cost = action.cost,
                        outcome = evaluation.decision.outcome(),
                        "Action denied"
                    );
                    self.persist_resets(&current, evaluation.account).await;
                    return Err(e.into());
                }
            };

            match self.store.save_if_revision(&debited, current.revision).await {
                Ok(stored) => {
                    info!(
                        user_id = %user_id,
                        kind = %action.kind,
                        cost = action.cost,
                        credits_after = stored.credits,
                        attempt,
                        "Debited credits"
                    );
                    metrics::record_credits_debited(action.kind.as_str(), action.cost);
                    return Ok(ConsumeOutcome {
                        account: stored,
                        action,
                        persisted: true,
                        attempts: attempt,
                    });
                }
                Err(e) if e.is_precondition_failed() => {
                    metrics::record_commit_conflict();
                    warn!(
                        user_id = %user_id,
                        attempt,
                        max_attempts = MAX_COMMIT_RETRIES,
                        "Concurrent account update, retrying debit"
                    );
                    if attempt < MAX_COMMIT_RETRIES {
                        tokio::time::sleep(Duration::from_millis(COMMIT_BACKOFF_MS * u64::from(attempt))).await;
                    }
                }
                Err(e) => {
                    metrics::record_persist_failure();
                    warn!(
                        user_id = %user_id,
                        kind = %action.kind,
                        cost = action.cost,
                        error = %e,
                        "Failed to persist debit, continuing with in-memory balance"
                    );
                    return Ok(ConsumeOutcome {
                        account: debited,
                        action,
                        persisted: false,
                        attempts: attempt,
                    });
                }
            }
        }

        Err(ApiError::conflict(format!(
            "Account {} kept changing, gave up after {} attempts",
            user_id, MAX_COMMIT_RETRIES
        )))
    }

    /// Move the account to `plan`, topping credits up to its entitlement.
    pub async fn upgrade(&self, user_id: &str, plan: PlanTier) -> ApiResult<QuotaSnapshot> {
        let lock = self.account_lock(user_id).await;
        let _guard = lock.lock().await;

        for attempt in 1..=MAX_COMMIT_RETRIES {
            let now = self.now();
            let current = self.load_or_create(user_id, now).await?;
            let reconciled = self.ledger.reconcile(&current, now).account;
            self.note_resets(&current, &reconciled);
            let upgraded = self.ledger.upgrade(&reconciled, plan);

            match self.store.save_if_revision(&upgraded, current.revision).await {
                Ok(stored) => {
                    info!(
                        user_id = %user_id,
                        from = %current.plan,
                        to = %plan,
                        credits = stored.credits,
                        "Plan changed"
                    );
                    return Ok(self.snapshot_of(stored));
                }
                Err(e) if e.is_precondition_failed() => {
                    metrics::record_commit_conflict();
                    if attempt < MAX_COMMIT_RETRIES {
                        tokio::time::sleep(Duration::from_millis(COMMIT_BACKOFF_MS * u64::from(attempt))).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::conflict(format!(
            "Account {} kept changing, gave up after {} attempts",
            user_id, MAX_COMMIT_RETRIES
        )))
    }
}
