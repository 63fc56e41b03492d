//! The quota ledger facade.
//!
//! Composes reconcile, classify and check into one call, and exposes the
//! debit that follows an allowed evaluation. Collaborators are injected so a
//! stricter classifier or a different plan table can be swapped in.

use qledger_models::time::EpochMillis;
use qledger_models::{Account, AccountState, Action, Decision, PlanTier};

use crate::affordability::{check_affordability, debit};
use crate::catalog::{PlanCatalog, StaticPlanCatalog};
use crate::classifier::{ActionClassifier, PatternClassifier};
use crate::error::{LedgerError, LedgerResult};
use crate::state::account_state;
use crate::upgrade::apply_plan_upgrade;
use crate::windows::{reconcile_windows, Reconciliation};

/// Result of evaluating a request against an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The reconciled account. Returned even on denial so resets can be persisted.
    pub account: Account,
    /// The classified action.
    pub action: Action,
    /// Whether the action may proceed.
    pub decision: Decision,
    /// Whether reconciliation changed the account.
    pub reset_applied: bool,
}

impl Evaluation {
    pub fn cost(&self) -> u32 {
        self.action.cost
    }
}

/// Stateless quota accounting over injected collaborators.
#[derive(Debug, Clone, Default)]
pub struct QuotaLedger<C = PatternClassifier, P = StaticPlanCatalog> {
    classifier: C,
    catalog: P,
}

impl<C: ActionClassifier, P: PlanCatalog> QuotaLedger<C, P> {
    pub fn new(classifier: C, catalog: P) -> Self {
        Self { classifier, catalog }
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    /// Apply elapsed window resets.
    pub fn reconcile(&self, account: &Account, now: EpochMillis) -> Reconciliation {
        reconcile_windows(account, &self.catalog, now)
    }

    /// Classify a request and attach its cost.
    pub fn classify(&self, text: &str, has_attachments: bool) -> Action {
        Action::of(self.classifier.classify(text, has_attachments))
    }

    /// Check an action against an already reconciled account.
    pub fn check(&self, account: &Account, action: &Action) -> Decision {
        check_affordability(account, action, &self.catalog)
    }

    /// Reconcile, classify and check in one pass.
    pub fn evaluate(
        &self,
        account: &Account,
        now: EpochMillis,
        text: &str,
        has_attachments: bool,
    ) -> Evaluation {
        let reconciled = self.reconcile(account, now);
        let action = self.classify(text, has_attachments);
        let decision = self.check(&reconciled.account, &action);
        let reset_applied = reconciled.changed();

        Evaluation {
            account: reconciled.account,
            action,
            decision,
            reset_applied,
        }
    }

    /// Debit `action` from `account`.
    ///
    /// Only valid after an `Allowed` decision for this exact pair.
    pub fn commit(&self, account: &Account, action: &Action) -> Account {
        debit(account, action)
    }

    /// Debit an evaluation, refusing denied ones.
    pub fn commit_evaluation(&self, evaluation: &Evaluation) -> LedgerResult<Account> {
        match evaluation.decision {
            Decision::Allowed => Ok(debit(&evaluation.account, &evaluation.action)),
            Decision::Denied(reason) => Err(LedgerError::NotAllowed(reason)),
        }
    }

    /// Switch plans, raising the balance to the new entitlement if needed.
    pub fn upgrade(&self, account: &Account, plan: PlanTier) -> Account {
        apply_plan_upgrade(account, plan, &self.catalog)
    }

    /// Label a reconciled account.
    pub fn state(&self, account: &Account) -> AccountState {
        account_state(account, &self.catalog)
    }
}
