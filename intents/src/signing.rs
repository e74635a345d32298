//! Building signed intents.

use coinvic_crypto::sign_message;
use coinvic_types::{Intent, IntentKind, IntentPayload, KeyPair, Timestamp};

use crate::canonical::signing_message;

/// Sign `payload` as a `kind` intent with `keypair` and wrap it as an
/// unprocessed intent whose id is the payload's transaction id.
pub fn sign_intent(
    kind: IntentKind,
    payload: IntentPayload,
    keypair: &KeyPair,
    created_at: Timestamp,
) -> Intent {
    let signature = sign_message(&signing_message(kind, &payload), &keypair.private);
    Intent {
        id: payload.transaction_id.clone(),
        kind,
        payload,
        signer_pub: keypair.public,
        signature,
        created_at,
        processed: false,
    }
}
