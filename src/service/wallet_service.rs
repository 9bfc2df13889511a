//! Wallet service: deposits, withdrawals, interest flag, and wallet queries.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use super::LedgerService;
use crate::config::PolicyConfig;
use crate::domain::payment::timestamp_reference;
use crate::domain::{
    InterestSetting, LedgerEntry, NewAdminLogEntry, NewLedgerEntry, PaymentMethod,
    TransactionType, UserId, Wallet, WithdrawalDecision, WithdrawalDenial, can_user_withdraw,
    start_of_utc_day,
};
use crate::error::LedgerError;

/// Hours within which a requested withdrawal is disbursed.
pub const WITHDRAWAL_SLA_HOURS: u32 = 24;

/// A deposit as submitted by the payment flow.
#[derive(Debug, Clone)]
pub struct DepositCommand {
    /// Depositing user.
    pub user_id: UserId,
    /// Principal amount.
    pub amount: Decimal,
    /// Payment method name as received.
    pub method: String,
    /// Client language tag.
    pub language: String,
    /// Stable client key for retries.
    pub idempotency_key: Option<String>,
}

/// Result of a successful deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DepositOutcome {
    /// Provider-scoped id, also the ledger reference.
    pub payment_id: String,
    /// Principal credited.
    pub amount: Decimal,
    /// Method used.
    pub method: PaymentMethod,
    /// Welcome bonus credited, if any.
    pub bonus: Option<Decimal>,
    /// Balance after principal and bonus.
    pub new_balance: Decimal,
    /// User-facing message.
    pub message: String,
}

/// Result of a successful withdrawal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WithdrawalOutcome {
    /// Amount debited.
    pub amount: Decimal,
    /// Ledger reference.
    pub reference_id: String,
    /// Balance after the debit.
    pub new_balance: Decimal,
    /// User-facing message.
    pub message: String,
}

/// Deposit and withdrawal processing on top of the [`LedgerService`].
#[derive(Debug, Clone)]
pub struct WalletService {
    ledger: LedgerService,
    policy: PolicyConfig,
}

impl WalletService {
    /// Creates a new `WalletService`.
    #[must_use]
    pub fn new(ledger: LedgerService, policy: PolicyConfig) -> Self {
        Self { ledger, policy }
    }

    /// Credits a deposit and, on the user's first deposit, the welcome bonus.
    ///
    /// The bonus uses the payment id as its reference, so a retried deposit
    /// never pays it twice and reports the bonus the original call paid. A
    /// failed bonus is logged and does not fail the deposit.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] if the amount is not positive.
    /// - [`LedgerError::UnsupportedMethod`] for an unknown method.
    /// - Any error of the principal credit; the bonus is then not attempted.
    pub async fn process_deposit(&self, cmd: DepositCommand) -> Result<DepositOutcome, LedgerError> {
        if cmd.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "deposit amount must be positive".to_string(),
            ));
        }
        let method: PaymentMethod = cmd.method.parse()?;
        let payment_id = method.payment_id(cmd.idempotency_key.as_deref());

        let principal = self
            .ledger
            .apply_transaction(NewLedgerEntry::new(
                cmd.user_id,
                cmd.amount,
                TransactionType::Deposit,
                format!("Deposit via {method}"),
                payment_id.clone(),
            ))
            .await?;

        tracing::info!(
            user_id = %cmd.user_id,
            %payment_id,
            language = %cmd.language,
            replayed = principal.replayed,
            "deposit credited"
        );

        let mut new_balance = principal.new_balance;
        let bonus = self
            .credit_welcome_bonus(&cmd, &payment_id, principal.replayed)
            .await;
        if let Some((amount, balance)) = bonus {
            new_balance = balance;
            tracing::info!(%payment_id, bonus = %amount, "welcome bonus credited");
        }

        let bonus = bonus.map(|(amount, _)| amount);
        let message = match bonus {
            Some(amount) => format!(
                "Deposit of {} via {method} received. Welcome bonus of {amount} added.",
                cmd.amount
            ),
            None => format!("Deposit of {} via {method} received.", cmd.amount),
        };

        Ok(DepositOutcome {
            payment_id,
            amount: cmd.amount,
            method,
            bonus,
            new_balance,
            message,
        })
    }

    /// Best-effort welcome bonus. Returns the bonus and resulting balance
    /// when one was credited for this payment.
    async fn credit_welcome_bonus(
        &self,
        cmd: &DepositCommand,
        payment_id: &str,
        replayed: bool,
    ) -> Option<(Decimal, Decimal)> {
        let store = self.ledger.store();
        if replayed {
            match store
                .entry_by_reference(cmd.user_id, payment_id, TransactionType::Bonus)
                .await
            {
                Ok(Some(paid)) => return Some((paid.amount, paid.balance_after)),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%payment_id, error = %err, "could not look up bonus; bonus skipped");
                    return None;
                }
            }
        }

        let deposits = match store
            .count_entries(cmd.user_id, Some(TransactionType::Deposit))
            .await
        {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(%payment_id, error = %err, "could not count deposits; bonus skipped");
                return None;
            }
        };
        if deposits > 1 {
            return None;
        }

        let amount = cmd.amount * self.policy.welcome_bonus_multiplier;
        if amount <= Decimal::ZERO {
            return None;
        }
        match self
            .ledger
            .apply_transaction(NewLedgerEntry::new(
                cmd.user_id,
                amount,
                TransactionType::Bonus,
                "Welcome bonus on first deposit",
                payment_id,
            ))
            .await
        {
            Ok(receipt) => Some((amount, receipt.new_balance)),
            Err(err) => {
                tracing::warn!(%payment_id, error = %err, "welcome bonus credit failed");
                None
            }
        }
    }

    /// Debits a withdrawal request after the minimum, balance and KYC checks.
    ///
    /// The entry reserves the funds; disbursement to the payment rail happens
    /// outside this service within [`WITHDRAWAL_SLA_HOURS`]. A retry with an
    /// idempotency key that already committed returns the original outcome
    /// without re-running the checks. The KYC daily cap is checked here for
    /// the error message and again by the store under the wallet lock.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::BelowMinimum`] under the configured floor.
    /// - [`LedgerError::InsufficientFunds`] if the balance does not cover it.
    /// - [`LedgerError::KycRequired`] / [`LedgerError::DailyLimitExceeded`]
    ///   from the KYC policy.
    /// - Any error of the ledger debit.
    pub async fn process_withdrawal(
        &self,
        user_id: UserId,
        amount: Decimal,
        idempotency_key: Option<&str>,
    ) -> Result<WithdrawalOutcome, LedgerError> {
        let key = idempotency_key.map(str::trim).filter(|k| !k.is_empty());
        let reference_id = match key {
            Some(key) => format!("withdrawal_{key}"),
            None => format!("withdrawal_{}", timestamp_reference()),
        };

        let store = self.ledger.store();
        if key.is_some() {
            if let Some(committed) = store
                .entry_by_reference(user_id, &reference_id, TransactionType::Withdrawal)
                .await?
            {
                tracing::info!(%user_id, %reference_id, "withdrawal replayed");
                return Ok(withdrawal_outcome(
                    committed.amount.abs(),
                    reference_id,
                    committed.balance_after,
                ));
            }
        }

        if amount <= Decimal::ZERO || amount < self.policy.withdrawal_minimum {
            return Err(LedgerError::BelowMinimum {
                minimum: self.policy.withdrawal_minimum,
                requested: amount,
            });
        }

        let balance = store
            .wallet(user_id)
            .await?
            .map_or(Decimal::ZERO, |w| w.balance);
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }

        let level = store.kyc_level(user_id).await?;
        let withdrawn_today = store
            .sum_since(user_id, TransactionType::Withdrawal, start_of_utc_day(Utc::now()))
            .await?;
        match can_user_withdraw(level, amount, withdrawn_today) {
            WithdrawalDecision::Allowed => {}
            WithdrawalDecision::Denied(WithdrawalDenial::KycRequired) => {
                return Err(LedgerError::KycRequired);
            }
            WithdrawalDecision::Denied(WithdrawalDenial::DailyLimitExceeded { cap }) => {
                return Err(LedgerError::DailyLimitExceeded {
                    cap,
                    withdrawn_today,
                    requested: amount,
                });
            }
        }

        let receipt = self
            .ledger
            .apply_transaction(
                NewLedgerEntry::new(
                    user_id,
                    -amount,
                    TransactionType::Withdrawal,
                    "Withdrawal request",
                    reference_id.clone(),
                )
                .with_daily_cap(level.limits().daily_cap),
            )
            .await?;

        Ok(withdrawal_outcome(amount, reference_id, receipt.new_balance))
    }

    /// Sets the user's interest flag and records the change in the audit log
    /// (best effort).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] if the flag cannot be saved.
    pub async fn set_interest(
        &self,
        user_id: UserId,
        enabled: bool,
    ) -> Result<InterestSetting, LedgerError> {
        let store = self.ledger.store();
        let setting = store.upsert_interest_setting(user_id, enabled).await?;

        let log = NewAdminLogEntry {
            admin_id: user_id,
            target_user_id: Some(user_id),
            action: "interest_toggle".to_string(),
            details: json!({ "enabled": enabled }),
        };
        if let Err(err) = store.append_admin_log(log).await {
            tracing::warn!(%user_id, error = %err, "interest toggle audit log failed");
        }

        tracing::info!(%user_id, enabled, "interest setting updated");
        Ok(setting)
    }

    /// Returns the wallet and whether interest is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WalletNotFound`] if the user has no wallet.
    pub async fn wallet(&self, user_id: UserId) -> Result<(Wallet, bool), LedgerError> {
        let store = self.ledger.store();
        let wallet = store
            .wallet(user_id)
            .await?
            .ok_or(LedgerError::WalletNotFound(user_id))?;
        let interest = store
            .interest_setting(user_id)
            .await?
            .is_some_and(|s| s.enabled);
        Ok((wallet, interest))
    }

    /// Returns a page of the user's ledger entries and the total count.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    pub async fn transactions(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<LedgerEntry>, u64), LedgerError> {
        let store = self.ledger.store();
        let entries = store.entries(user_id, limit, offset).await?;
        let total = store.count_entries(user_id, None).await?;
        Ok((entries, total))
    }
}

fn withdrawal_outcome(amount: Decimal, reference_id: String, new_balance: Decimal) -> WithdrawalOutcome {
    WithdrawalOutcome {
        amount,
        reference_id,
        new_balance,
        message: format!(
            "Withdrawal of {amount} requested. It will be processed within {WITHDRAWAL_SLA_HOURS} hours."
        ),
    }
}
