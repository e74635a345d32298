use coinvic_types::IntentKind;
use thiserror::Error;

/// Why an intent was refused at submission. Rejected intents are never
/// stored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid signature on intent {id}")]
    InvalidSignature { id: String },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("transaction_id must not be empty")]
    EmptyTransactionId,

    #[error("intent id {id} does not match transaction_id {transaction_id}")]
    IdMismatch { id: String, transaction_id: String },

    #[error("{kind} intent is missing required field `{field}`")]
    MissingField { kind: IntentKind, field: &'static str },

    #[error("unknown mint reason: {0}")]
    UnknownMintReason(String),

    #[error("transaction {0} was already submitted")]
    DuplicateTransaction(String),

    #[error("signer {signer} is not authorized for this {kind} intent")]
    Unauthorized { kind: IntentKind, signer: String },

    #[error("wallet {wallet} holds {balance}, cannot debit {amount}")]
    InsufficientBalance {
        wallet: String,
        balance: u128,
        amount: u128,
    },
}

#[derive(Debug, Error)]
pub enum IntentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] coinvic_store::StoreError),
}
