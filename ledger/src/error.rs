use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient balance: wallet {wallet} holds {balance}, needs {amount}")]
    InsufficientBalance {
        wallet: String,
        balance: u128,
        amount: u128,
    },

    #[error("balance overflow crediting {amount} to wallet {wallet}")]
    BalanceOverflow { wallet: String, amount: u128 },

    #[error("{kind} intent {id} is missing `{field}`")]
    MalformedIntent {
        id: String,
        kind: String,
        field: &'static str,
    },

    #[error("storage error: {0}")]
    Storage(#[from] coinvic_store::StoreError),
}
