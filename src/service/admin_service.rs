//! Admin service: manual balance adjustments and global switches.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use super::LedgerService;
use crate::domain::payment::timestamp_reference;
use crate::domain::{
    AdminLogEntry, AutoGradingConfig, NewAdminLogEntry, NewLedgerEntry, TransactionType, UserId,
};
use crate::error::LedgerError;

/// Result of a successful adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdjustmentOutcome {
    /// Ledger reference of the adjustment.
    pub reference_id: String,
    /// Entry type chosen from the sign of the amount.
    pub transaction_type: TransactionType,
    /// Balance after the adjustment.
    pub new_balance: Decimal,
    /// Operator-facing message.
    pub message: String,
}

/// Audited operator actions.
///
/// Every adjustment attempt writes an [`AdminLogEntry`], including failed
/// ones. The log write is best effort and never changes the outcome.
#[derive(Debug, Clone)]
pub struct AdminService {
    ledger: LedgerService,
}

impl AdminService {
    /// Creates a new `AdminService`.
    #[must_use]
    pub fn new(ledger: LedgerService) -> Self {
        Self { ledger }
    }

    /// Credits (`amount > 0`) or debits (`amount < 0`) a user's wallet.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] for a zero amount or empty description.
    /// - [`LedgerError::InsufficientFunds`] if a debit would overdraw.
    /// - Any other ledger error.
    pub async fn adjust_balance(
        &self,
        admin_id: UserId,
        user_id: UserId,
        amount: Decimal,
        description: &str,
        idempotency_key: Option<&str>,
    ) -> Result<AdjustmentOutcome, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::Validation(
                "adjustment amount must be non-zero".to_string(),
            ));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(LedgerError::Validation(
                "adjustment description is required".to_string(),
            ));
        }

        let transaction_type = if amount.is_sign_negative() {
            TransactionType::AdminDebit
        } else {
            TransactionType::AdminCredit
        };
        let reference_id = match idempotency_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => format!("admin_{key}"),
            None => format!("admin_{}", timestamp_reference()),
        };

        let result = self
            .ledger
            .apply_transaction(NewLedgerEntry::new(
                user_id,
                amount,
                transaction_type,
                format!("Admin adjustment: {description}"),
                reference_id.clone(),
            ))
            .await;

        let details = match &result {
            Ok(receipt) => json!({
                "amount": amount,
                "description": description,
                "reference_id": reference_id,
                "new_balance": receipt.new_balance,
                "outcome": "applied",
            }),
            Err(err) => json!({
                "amount": amount,
                "description": description,
                "reference_id": reference_id,
                "outcome": "rejected",
                "error": err.to_string(),
            }),
        };
        self.audit(NewAdminLogEntry {
            admin_id,
            target_user_id: Some(user_id),
            action: "balance_adjustment".to_string(),
            details,
        })
        .await;

        let receipt = result?;
        tracing::info!(
            %admin_id,
            %user_id,
            %amount,
            %reference_id,
            new_balance = %receipt.new_balance,
            "balance adjusted"
        );

        Ok(AdjustmentOutcome {
            reference_id,
            transaction_type,
            new_balance: receipt.new_balance,
            message: format!("Balance adjusted by {amount}. New balance: {}", receipt.new_balance),
        })
    }

    /// Turns the auto-grading switch on or off.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] if the switch cannot be saved.
    pub async fn set_auto_grading(
        &self,
        admin_id: UserId,
        enabled: bool,
    ) -> Result<AutoGradingConfig, LedgerError> {
        let config = AutoGradingConfig { enabled };
        self.ledger.store().set_auto_grading_config(config).await?;
        self.audit(NewAdminLogEntry {
            admin_id,
            target_user_id: None,
            action: "auto_grading_toggle".to_string(),
            details: json!({ "enabled": enabled }),
        })
        .await;
        tracing::info!(%admin_id, enabled, "auto-grading switch updated");
        Ok(config)
    }

    /// Returns the current auto-grading switch.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    pub async fn auto_grading(&self) -> Result<AutoGradingConfig, LedgerError> {
        self.ledger.store().auto_grading_config().await
    }

    /// Returns a page of audit records, newest first, and the total.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    pub async fn logs(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<AdminLogEntry>, u64), LedgerError> {
        self.ledger.store().admin_logs(limit, offset).await
    }

    async fn audit(&self, entry: NewAdminLogEntry) {
        let action = entry.action.clone();
        if let Err(err) = self.ledger.store().append_admin_log(entry).await {
            tracing::warn!(%action, error = %err, "admin audit log write failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::EventBus;
    use crate::persistence::faulty::FaultyStore;
    use crate::persistence::{LedgerStore, MemoryStore, Store};

    fn make_service() -> (AdminService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ledger = LedgerService::new(Arc::clone(&store) as Arc<dyn Store>, EventBus::new(64));
        (AdminService::new(ledger), store)
    }

    #[tokio::test]
    async fn credit_then_debit_by_sign() {
        let (service, store) = make_service();
        let admin = UserId::new();
        let user = UserId::new();

        let Ok(credit) = service
            .adjust_balance(admin, user, Decimal::from(300), "goodwill", None)
            .await
        else {
            panic!("credit failed");
        };
        assert_eq!(credit.transaction_type, TransactionType::AdminCredit);
        assert_eq!(credit.new_balance, Decimal::from(300));
        assert!(credit.reference_id.starts_with("admin_"));

        let Ok(debit) = service
            .adjust_balance(admin, user, Decimal::from(-120), "chargeback", None)
            .await
        else {
            panic!("debit failed");
        };
        assert_eq!(debit.transaction_type, TransactionType::AdminDebit);
        assert_eq!(debit.new_balance, Decimal::from(180));
        assert_eq!(store.ledger_sum(user).await, Decimal::from(180));
    }

    #[tokio::test]
    async fn rejected_debit_is_still_audited() {
        let (service, store) = make_service();
        let admin = UserId::new();
        let user = UserId::new();

        let result = service
            .adjust_balance(admin, user, Decimal::from(-50), "overdraw", None)
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert_eq!(store.count_entries(user, None).await.ok(), Some(0));

        let Ok((logs, total)) = service.logs(10, 0).await else {
            panic!("logs failed");
        };
        assert_eq!(total, 1);
        let Some(log) = logs.first() else {
            panic!("log missing");
        };
        assert_eq!(log.action, "balance_adjustment");
        assert_eq!(log.target_user_id, Some(user));
        assert_eq!(log.details["outcome"], "rejected");
    }

    #[tokio::test]
    async fn idempotency_key_prevents_double_adjustment() {
        let (service, store) = make_service();
        let admin = UserId::new();
        let user = UserId::new();

        for _ in 0..2 {
            let result = service
                .adjust_balance(admin, user, Decimal::from(75), "promo", Some("ticket-9"))
                .await;
            assert!(result.is_ok());
        }
        assert_eq!(store.ledger_sum(user).await, Decimal::from(75));
    }

    #[tokio::test]
    async fn zero_amount_and_blank_description_are_invalid() {
        let (service, _) = make_service();
        let zero = service
            .adjust_balance(UserId::new(), UserId::new(), Decimal::ZERO, "x", None)
            .await;
        assert!(matches!(zero, Err(LedgerError::Validation(_))));

        let blank = service
            .adjust_balance(UserId::new(), UserId::new(), Decimal::ONE, "  ", None)
            .await;
        assert!(matches!(blank, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn auto_grading_toggle_persists() {
        let (service, _) = make_service();
        assert_eq!(service.auto_grading().await.ok(), Some(AutoGradingConfig::default()));

        let result = service.set_auto_grading(UserId::new(), true).await;
        assert_eq!(result.ok(), Some(AutoGradingConfig { enabled: true }));
        assert_eq!(
            service.auto_grading().await.ok(),
            Some(AutoGradingConfig { enabled: true })
        );
    }

    #[tokio::test]
    async fn adjustment_survives_audit_failure() {
        let store = Arc::new(FaultyStore {
            fail_admin_log: true,
            ..FaultyStore::default()
        });
        let ledger = LedgerService::new(Arc::clone(&store) as Arc<dyn Store>, EventBus::new(64));
        let service = AdminService::new(ledger);
        let user = UserId::new();

        let Ok(outcome) = service
            .adjust_balance(UserId::new(), user, Decimal::from(250), "compensation", None)
            .await
        else {
            panic!("adjustment failed");
        };
        assert_eq!(outcome.new_balance, Decimal::from(250));
        assert_eq!(store.inner.ledger_sum(user).await, Decimal::from(250));

        let Ok(config) = service.set_auto_grading(UserId::new(), true).await else {
            panic!("switch failed");
        };
        assert!(config.enabled);
        assert_eq!(service.auto_grading().await, Ok(config));
    }
}
