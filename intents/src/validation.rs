//! Stateless intent validation.
//!
//! Checks everything that can be decided from the intent alone plus the
//! configured authority set. Stateful checks (duplicate transaction ids,
//! source balance) are done by [`crate::IntentStore`].

use coinvic_crypto::verify_signature;
use coinvic_types::{Intent, IntentKind, MintReason, PublicKey, WalletId};

use crate::canonical::signing_message;
use crate::error::ValidationError;

/// Admission rules that depend on node configuration.
#[derive(Clone, Debug, Default)]
pub struct ValidationPolicy {
    /// Keys allowed to sign mint and stake intents. Empty means any valid
    /// signer may.
    pub authorities: Vec<PublicKey>,
}

impl ValidationPolicy {
    pub fn with_authorities(authorities: Vec<PublicKey>) -> Self {
        Self { authorities }
    }

    fn is_authority(&self, key: &PublicKey) -> bool {
        self.authorities.contains(key)
    }
}

fn require<'a>(
    kind: IntentKind,
    field: &'static str,
    value: &'a Option<WalletId>,
) -> Result<&'a WalletId, ValidationError> {
    value
        .as_ref()
        .filter(|w| !w.as_str().is_empty())
        .ok_or(ValidationError::MissingField { kind, field })
}

/// Validate an intent's structure, signature and signer.
pub fn validate_intent(intent: &Intent, policy: &ValidationPolicy) -> Result<(), ValidationError> {
    let payload = &intent.payload;

    if payload.transaction_id.is_empty() {
        return Err(ValidationError::EmptyTransactionId);
    }
    if intent.id != payload.transaction_id {
        return Err(ValidationError::IdMismatch {
            id: intent.id.clone(),
            transaction_id: payload.transaction_id.clone(),
        });
    }
    if payload.amount == 0 {
        return Err(ValidationError::ZeroAmount);
    }
    if payload.network.is_empty() {
        return Err(ValidationError::MissingField {
            kind: intent.kind,
            field: "network",
        });
    }

    let owner = match intent.kind {
        IntentKind::Mint => {
            let wallet = require(intent.kind, "wallet", &payload.wallet)?;
            let reason = payload.reason.as_deref().ok_or(ValidationError::MissingField {
                kind: intent.kind,
                field: "reason",
            })?;
            reason
                .parse::<MintReason>()
                .map_err(|_| ValidationError::UnknownMintReason(reason.to_string()))?;
            wallet
        }
        IntentKind::Transfer => {
            let from = require(intent.kind, "from", &payload.from)?;
            require(intent.kind, "to", &payload.to)?;
            from
        }
        IntentKind::Burn | IntentKind::Fee | IntentKind::Stake | IntentKind::ClaimBalance => {
            require(intent.kind, "wallet", &payload.wallet)?
        }
    };

    if !verify_signature(
        &signing_message(intent.kind, payload),
        &intent.signature,
        &intent.signer_pub,
    ) {
        return Err(ValidationError::InvalidSignature {
            id: intent.id.clone(),
        });
    }

    let authorized = match intent.kind {
        IntentKind::Burn | IntentKind::Transfer | IntentKind::Fee => {
            owner.is_owned_by(&intent.signer_pub)
        }
        IntentKind::Mint | IntentKind::Stake => {
            policy.authorities.is_empty() || policy.is_authority(&intent.signer_pub)
        }
        IntentKind::ClaimBalance => {
            owner.is_owned_by(&intent.signer_pub) || policy.is_authority(&intent.signer_pub)
        }
    };
    if !authorized {
        return Err(ValidationError::Unauthorized {
            kind: intent.kind,
            signer: intent.signer_pub.to_hex(),
        });
    }

    Ok(())
}
