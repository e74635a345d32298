//! The master ledger: per-wallet balances and the single mutation path for
//! every intent kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use coinvic_store::AccountTable;
use coinvic_types::{
    Intent, IntentId, IntentKind, LedgerAccount, LedgerEntry, WalletId,
};

use crate::error::LedgerError;
use crate::system::SystemAccounts;

/// Credits and debits applied to one wallet within a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalanceDelta {
    pub credited: u128,
    pub debited: u128,
}

impl BalanceDelta {
    /// Net change as a signed value, saturating at the `i128` bounds.
    pub fn net(&self) -> i128 {
        let credited = i128::try_from(self.credited).unwrap_or(i128::MAX);
        let debited = i128::try_from(self.debited).unwrap_or(i128::MAX);
        credited.saturating_sub(debited)
    }
}

/// An intent that was consumed by a batch without changing balances.
#[derive(Debug)]
pub struct SkippedIntent {
    pub id: IntentId,
    pub kind: IntentKind,
    pub reason: LedgerError,
}

/// The staged result of applying a batch. Nothing has been written yet.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Final rows of every account an applied intent touched, ordered by
    /// wallet.
    pub accounts: Vec<LedgerAccount>,
    /// One entry per applied intent, in application order.
    pub entries: Vec<LedgerEntry>,
    pub applied: Vec<IntentId>,
    pub skipped: Vec<SkippedIntent>,
    pub deltas: BTreeMap<WalletId, BalanceDelta>,
    /// Sum of applied mint amounts.
    pub minted: u128,
    /// Sum of applied burn amounts.
    pub burned: u128,
    /// Every intent id in the batch, applied or skipped, in batch order.
    pub consumed: Vec<IntentId>,
}

impl ApplyOutcome {
    pub fn is_applied(&self, id: &str) -> bool {
        self.applied.iter().any(|a| a == id)
    }
}

/// Value movement implied by one intent.
struct Movement<'a> {
    debit: Option<&'a WalletId>,
    credit: Option<&'a WalletId>,
    /// Wallet stamped with the block height even though no value moves.
    touch: Option<&'a WalletId>,
}

/// Balance view over an account table.
///
/// `apply` never writes: it reads committed rows, stages every change in
/// memory and hands back the final rows for the caller to commit atomically
/// with the block.
pub struct MasterLedger<S> {
    store: Arc<S>,
    system: SystemAccounts,
}

impl<S: AccountTable> MasterLedger<S> {
    pub fn new(store: Arc<S>, system: SystemAccounts) -> Self {
        Self { store, system }
    }

    pub fn system_accounts(&self) -> &SystemAccounts {
        &self.system
    }

    /// Committed balance of `wallet`; unknown wallets hold zero.
    pub fn balance(&self, wallet: &WalletId) -> Result<u128, LedgerError> {
        Ok(self.store.balance_of(wallet)?)
    }

    /// Every committed account row.
    pub fn accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        Ok(self.store.iter_accounts()?)
    }

    /// Sum of every committed balance.
    pub fn total_supply(&self) -> Result<u128, LedgerError> {
        Ok(self
            .store
            .iter_accounts()?
            .iter()
            .fold(0u128, |acc, a| acc.saturating_add(a.balance)))
    }

    fn movement<'a>(&'a self, intent: &'a Intent) -> Result<Movement<'a>, LedgerError> {
        let p = &intent.payload;
        let need = |field: &'static str, value: &'a Option<WalletId>| {
            value.as_ref().ok_or_else(|| LedgerError::MalformedIntent {
                id: intent.id.clone(),
                kind: intent.kind.to_string(),
                field,
            })
        };
        let none = Movement {
            debit: None,
            credit: None,
            touch: None,
        };
        Ok(match intent.kind {
            IntentKind::Mint => Movement {
                credit: Some(need("wallet", &p.wallet)?),
                ..none
            },
            IntentKind::Burn => Movement {
                debit: Some(need("wallet", &p.wallet)?),
                ..none
            },
            IntentKind::Transfer => Movement {
                debit: Some(need("from", &p.from)?),
                credit: Some(need("to", &p.to)?),
                ..none
            },
            IntentKind::Fee => Movement {
                debit: Some(need("wallet", &p.wallet)?),
                credit: Some(&self.system.fee_collection),
                ..none
            },
            IntentKind::Stake => Movement {
                debit: Some(&self.system.staking_reward),
                credit: Some(need("wallet", &p.wallet)?),
                ..none
            },
            IntentKind::ClaimBalance => Movement {
                touch: Some(need("wallet", &p.wallet)?),
                ..none
            },
        })
    }

    /// Stage `intents` in order against the committed balances.
    ///
    /// An intent whose debit would drive a balance negative is skipped whole
    /// and reported in [`ApplyOutcome::skipped`]; later intents in the batch
    /// still apply. Only storage failures are returned as errors.
    pub fn apply(&self, intents: &[Intent], block_number: u64) -> Result<ApplyOutcome, LedgerError> {
        let mut staged: BTreeMap<WalletId, LedgerAccount> = BTreeMap::new();
        let mut outcome = ApplyOutcome::default();

        for intent in intents {
            outcome.consumed.push(intent.id.clone());
            match self.apply_one(intent, block_number, &mut staged, &mut outcome) {
                Ok(()) => outcome.applied.push(intent.id.clone()),
                Err(LedgerError::Storage(e)) => return Err(LedgerError::Storage(e)),
                Err(reason) => {
                    warn!(id = %intent.id, kind = %intent.kind, block = block_number, %reason, "intent skipped");
                    outcome.skipped.push(SkippedIntent {
                        id: intent.id.clone(),
                        kind: intent.kind,
                        reason,
                    });
                }
            }
        }

        // Rows loaded only to reject a skipped intent are not written back.
        outcome.accounts = staged
            .into_values()
            .filter(|a| outcome.deltas.contains_key(&a.wallet_pubkey))
            .collect();
        debug!(
            block = block_number,
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            accounts = outcome.accounts.len(),
            "batch staged"
        );
        Ok(outcome)
    }

    fn load<'m>(
        &self,
        staged: &'m mut BTreeMap<WalletId, LedgerAccount>,
        wallet: &WalletId,
    ) -> Result<&'m mut LedgerAccount, LedgerError> {
        if !staged.contains_key(wallet) {
            let row = self
                .store
                .get_account(wallet)?
                .unwrap_or_else(|| LedgerAccount::empty(wallet.clone()));
            staged.insert(wallet.clone(), row);
        }
        staged
            .get_mut(wallet)
            .ok_or_else(|| LedgerError::Storage(coinvic_store::StoreError::NotFound(wallet.to_string())))
    }

    fn apply_one(
        &self,
        intent: &Intent,
        block_number: u64,
        staged: &mut BTreeMap<WalletId, LedgerAccount>,
        outcome: &mut ApplyOutcome,
    ) -> Result<(), LedgerError> {
        let movement = self.movement(intent)?;
        let amount = intent.payload.amount;

        // Check both sides before touching anything so a skipped intent
        // leaves the staged view unchanged.
        if let Some(from) = movement.debit {
            let balance = self.load(staged, from)?.balance;
            if balance < amount {
                return Err(LedgerError::InsufficientBalance {
                    wallet: from.to_string(),
                    balance,
                    amount,
                });
            }
        }
        if let Some(to) = movement.credit {
            let mut balance = self.load(staged, to)?.balance;
            if movement.debit == Some(to) {
                balance -= amount;
            }
            if balance.checked_add(amount).is_none() {
                return Err(LedgerError::BalanceOverflow {
                    wallet: to.to_string(),
                    amount,
                });
            }
        }

        if let Some(from) = movement.debit {
            let account = self.load(staged, from)?;
            account.balance -= amount;
            account.last_processed_block = block_number;
            outcome.deltas.entry(from.clone()).or_default().debited += amount;
        }
        if let Some(to) = movement.credit {
            let account = self.load(staged, to)?;
            account.balance += amount;
            account.last_processed_block = block_number;
            outcome.deltas.entry(to.clone()).or_default().credited += amount;
        }
        if let Some(wallet) = movement.touch {
            self.load(staged, wallet)?.last_processed_block = block_number;
            outcome.deltas.entry(wallet.clone()).or_default();
        }

        match intent.kind {
            IntentKind::Mint => outcome.minted = outcome.minted.saturating_add(amount),
            IntentKind::Burn => outcome.burned = outcome.burned.saturating_add(amount),
            _ => {}
        }

        outcome.entries.push(LedgerEntry {
            entry_id: intent.id.clone(),
            block_number,
            timestamp: intent.created_at,
            network: intent.payload.network.clone(),
            debit_wallet: movement.debit.cloned(),
            credit_wallet: movement.credit.or(movement.touch).cloned(),
            amount,
            intent_type: intent.kind,
            reason: intent.payload.reason.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinvic_nullables::NullStore;
    use coinvic_types::{IntentPayload, PublicKey, Signature, Timestamp};

    fn intent(id: &str, kind: IntentKind, wallet: Option<&str>, from: Option<&str>, to: Option<&str>, amount: u128) -> Intent {
        Intent {
            id: id.into(),
            kind,
            payload: IntentPayload {
                wallet: wallet.map(WalletId::new),
                from: from.map(WalletId::new),
                to: to.map(WalletId::new),
                amount,
                network: "main".into(),
                reason: None,
                transaction_id: id.into(),
            },
            signer_pub: PublicKey([0u8; 32]),
            signature: Signature([0u8; 64]),
            created_at: Timestamp::new(1),
            processed: false,
        }
    }

    fn ledger() -> (Arc<NullStore>, MasterLedger<NullStore>) {
        let store = Arc::new(NullStore::new());
        let ledger = MasterLedger::new(store.clone(), SystemAccounts::default());
        (store, ledger)
    }

    fn balance_in(outcome: &ApplyOutcome, wallet: &str) -> u128 {
        outcome
            .accounts
            .iter()
            .find(|a| a.wallet_pubkey.as_str() == wallet)
            .map(|a| a.balance)
            .unwrap_or(0)
    }

    #[test]
    fn mint_then_transfer() {
        let (_store, ledger) = ledger();
        let batch = vec![
            intent("m", IntentKind::Mint, Some("w1"), None, None, 100),
            intent("t", IntentKind::Transfer, None, Some("w1"), Some("w2"), 30),
        ];
        let outcome = ledger.apply(&batch, 1).unwrap();
        assert_eq!(balance_in(&outcome, "w1"), 70);
        assert_eq!(balance_in(&outcome, "w2"), 30);
        assert_eq!(outcome.minted, 100);
        assert_eq!(outcome.burned, 0);
        assert_eq!(outcome.entries.len(), 2);
        assert!(outcome.accounts.iter().all(|a| a.last_processed_block == 1));
    }

    #[test]
    fn overdrawn_burn_is_skipped() {
        let (store, ledger) = ledger();
        store.put_account(LedgerAccount {
            wallet_pubkey: WalletId::new("w1"),
            balance: 10,
            last_processed_block: 0,
        });
        let outcome = ledger
            .apply(&[intent("b", IntentKind::Burn, Some("w1"), None, None, 50)], 1)
            .unwrap();
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.consumed, vec!["b".to_string()]);
        assert!(matches!(
            outcome.skipped[0].reason,
            LedgerError::InsufficientBalance { balance: 10, amount: 50, .. }
        ));
        assert_eq!(outcome.burned, 0);
        assert!(outcome.accounts.is_empty());
        assert!(outcome.entries.is_empty());
        // Nothing was written.
        assert_eq!(ledger.balance(&WalletId::new("w1")).unwrap(), 10);
    }

    #[test]
    fn fee_and_stake_use_system_accounts() {
        let (_store, ledger) = ledger();
        let batch = vec![
            intent("m1", IntentKind::Mint, Some("w1"), None, None, 50),
            intent("m2", IntentKind::Mint, Some("staking_reward_wallet"), None, None, 20),
            intent("f", IntentKind::Fee, Some("w1"), None, None, 5),
            intent("s", IntentKind::Stake, Some("w1"), None, None, 8),
        ];
        let outcome = ledger.apply(&batch, 3).unwrap();
        assert_eq!(balance_in(&outcome, "w1"), 53);
        assert_eq!(balance_in(&outcome, "tx_fee_wallet"), 5);
        assert_eq!(balance_in(&outcome, "staking_reward_wallet"), 12);
    }

    #[test]
    fn stake_without_funded_pool_is_skipped() {
        let (_store, ledger) = ledger();
        let outcome = ledger
            .apply(&[intent("s", IntentKind::Stake, Some("w1"), None, None, 1)], 1)
            .unwrap();
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(balance_in(&outcome, "w1"), 0);
    }

    #[test]
    fn claim_balance_touches_without_moving_value() {
        let (store, ledger) = ledger();
        store.put_account(LedgerAccount {
            wallet_pubkey: WalletId::new("w1"),
            balance: 9,
            last_processed_block: 1,
        });
        let outcome = ledger
            .apply(&[intent("c", IntentKind::ClaimBalance, Some("w1"), None, None, 4)], 5)
            .unwrap();
        assert_eq!(outcome.accounts.len(), 1);
        assert_eq!(outcome.accounts[0].balance, 9);
        assert_eq!(outcome.accounts[0].last_processed_block, 5);
        assert_eq!(outcome.deltas[&WalletId::new("w1")].net(), 0);
    }

    #[test]
    fn later_intents_apply_after_a_skip() {
        let (_store, ledger) = ledger();
        let batch = vec![
            intent("t", IntentKind::Transfer, None, Some("w1"), Some("w2"), 5),
            intent("m", IntentKind::Mint, Some("w1"), None, None, 5),
            intent("t2", IntentKind::Transfer, None, Some("w1"), Some("w2"), 5),
        ];
        let outcome = ledger.apply(&batch, 1).unwrap();
        assert_eq!(outcome.applied, vec!["m".to_string(), "t2".to_string()]);
        assert_eq!(balance_in(&outcome, "w2"), 5);
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let (_store, ledger) = ledger();
        let batch = vec![
            intent("m", IntentKind::Mint, Some("w1"), None, None, 10),
            intent("t", IntentKind::Transfer, None, Some("w1"), Some("w1"), 10),
        ];
        let outcome = ledger.apply(&batch, 1).unwrap();
        assert_eq!(outcome.applied.len(), 2);
        assert_eq!(balance_in(&outcome, "w1"), 10);
    }
}
