//! Ledger service: the single entry point for balance mutation.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{EventBus, LedgerReceipt, NewLedgerEntry, WalletEvent};
use crate::error::LedgerError;
use crate::persistence::Store;

/// Validates ledger requests, commits them through the store's atomic
/// primitive, and announces committed entries on the [`EventBus`].
///
/// Stateless coordinator: per-user serialization and idempotency are
/// properties of the store, so any number of service instances may run
/// against the same database.
#[derive(Debug, Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
    event_bus: EventBus,
}

impl LedgerService {
    /// Creates a new `LedgerService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Applies one signed entry to a wallet.
    ///
    /// Exactly one ledger entry is appended on success and none on failure.
    /// Replaying a committed `(reference_id, transaction_type)` returns the
    /// original receipt and changes nothing.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] for a zero amount, missing reference or
    ///   sign/type mismatch.
    /// - [`LedgerError::InsufficientFunds`] if a debit would overdraw.
    /// - [`LedgerError::DuplicateReference`] if the key belongs to another user.
    /// - [`LedgerError::PersistenceError`] if the commit fails.
    pub async fn apply_transaction(
        &self,
        entry: NewLedgerEntry,
    ) -> Result<LedgerReceipt, LedgerError> {
        entry.validate()?;

        let receipt = match self.store.apply_transaction(&entry).await {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::warn!(
                    user_id = %entry.user_id,
                    reference_id = %entry.reference_id,
                    transaction_type = %entry.transaction_type,
                    amount = %entry.amount,
                    error = %err,
                    "ledger mutation rejected"
                );
                return Err(err);
            }
        };

        if receipt.replayed {
            tracing::info!(
                user_id = %entry.user_id,
                reference_id = %entry.reference_id,
                transaction_type = %entry.transaction_type,
                "duplicate reference; returning committed entry"
            );
            return Ok(receipt);
        }

        tracing::info!(
            user_id = %entry.user_id,
            reference_id = %entry.reference_id,
            transaction_type = %entry.transaction_type,
            amount = %entry.amount,
            new_balance = %receipt.new_balance,
            "ledger entry committed"
        );

        let _ = self.event_bus.publish(WalletEvent::BalanceChanged {
            user_id: entry.user_id,
            entry_id: receipt.entry_id,
            transaction_type: entry.transaction_type,
            amount: entry.amount,
            new_balance: receipt.new_balance,
            reference_id: entry.reference_id,
            timestamp: Utc::now(),
        });

        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::{TransactionType, UserId};
    use crate::persistence::{LedgerStore, MemoryStore};

    fn make_service() -> (LedgerService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = LedgerService::new(Arc::clone(&store) as Arc<dyn Store>, EventBus::new(64));
        (service, store)
    }

    fn deposit(user_id: UserId, amount: i64, reference: &str) -> NewLedgerEntry {
        NewLedgerEntry::new(
            user_id,
            Decimal::from(amount),
            TransactionType::Deposit,
            "deposit",
            reference,
        )
    }

    #[tokio::test]
    async fn commit_emits_balance_changed() {
        let (service, _) = make_service();
        let mut rx = service.event_bus().subscribe();
        let user = UserId::new();

        let result = service.apply_transaction(deposit(user, 250, "r1")).await;
        assert!(result.is_ok());

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "balance_changed");
        assert_eq!(event.user_id(), Some(user));
    }

    #[tokio::test]
    async fn replay_does_not_emit_or_apply() {
        let (service, store) = make_service();
        let mut rx = service.event_bus().subscribe();
        let user = UserId::new();

        let _ = service.apply_transaction(deposit(user, 250, "r1")).await;
        let _ = rx.recv().await;

        let Ok(receipt) = service.apply_transaction(deposit(user, 250, "r1")).await else {
            panic!("replay failed");
        };
        assert!(receipt.replayed);
        assert!(rx.try_recv().is_err());
        assert_eq!(store.ledger_sum(user).await, Decimal::from(250));
    }

    #[tokio::test]
    async fn invalid_entry_never_reaches_store() {
        let (service, store) = make_service();
        let user = UserId::new();

        let result = service
            .apply_transaction(deposit(user, 0, "r1"))
            .await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert_eq!(store.count_entries(user, None).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn balance_always_equals_sum_of_entries() {
        let (service, store) = make_service();
        let user = UserId::new();

        let _ = service.apply_transaction(deposit(user, 300, "d1")).await;
        let _ = service
            .apply_transaction(NewLedgerEntry::new(
                user,
                Decimal::from(-120),
                TransactionType::Withdrawal,
                "withdrawal",
                "w1",
            ))
            .await;
        let _ = service
            .apply_transaction(NewLedgerEntry::new(
                user,
                Decimal::from(-500),
                TransactionType::AdminDebit,
                "too much",
                "a1",
            ))
            .await;

        let Ok(Some(wallet)) = store.wallet(user).await else {
            panic!("wallet missing");
        };
        assert_eq!(wallet.balance, Decimal::from(180));
        assert_eq!(wallet.balance, store.ledger_sum(user).await);
    }
}
