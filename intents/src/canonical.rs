//! Canonical serialization of intents.
//!
//! Both forms are JSON objects with a fixed key order (alphabetical), amounts
//! as decimal strings and absent optional fields as `null`. The signing form
//! (payload plus intent type) is what the signer signs; the intent form is
//! what a block's `intents_hash` covers.

use coinvic_types::{Intent, IntentKind, IntentPayload, WalletId};
use serde_json::{Map, Value};

fn opt_wallet(w: &Option<WalletId>) -> Value {
    w.as_ref()
        .map(|w| Value::String(w.as_str().to_string()))
        .unwrap_or(Value::Null)
}

fn payload_value(payload: &IntentPayload) -> Value {
    let mut map = Map::new();
    map.insert("amount".into(), Value::String(payload.amount.to_string()));
    map.insert("from".into(), opt_wallet(&payload.from));
    map.insert("network".into(), Value::String(payload.network.clone()));
    map.insert(
        "reason".into(),
        payload
            .reason
            .as_ref()
            .map(|r| Value::String(r.clone()))
            .unwrap_or(Value::Null),
    );
    map.insert("to".into(), opt_wallet(&payload.to));
    map.insert(
        "transaction_id".into(),
        Value::String(payload.transaction_id.clone()),
    );
    map.insert("wallet".into(), opt_wallet(&payload.wallet));
    Value::Object(map)
}

/// The bytes an intent's signature covers: `{"payload":{..},"type":".."}`.
/// Binding the type means a signed fee cannot be replayed as a burn.
pub fn signing_message(kind: IntentKind, payload: &IntentPayload) -> Vec<u8> {
    let mut map = Map::new();
    map.insert("payload".into(), payload_value(payload));
    map.insert("type".into(), Value::String(kind.as_str().to_string()));
    Value::Object(map).to_string().into_bytes()
}

/// Canonical form of a whole intent. The `processed` flag is excluded, so
/// the form does not change when the intent is consumed.
pub fn canonical_intent(intent: &Intent) -> String {
    let mut map = Map::new();
    map.insert(
        "created_at".into(),
        Value::from(intent.created_at.as_millis()),
    );
    map.insert("id".into(), Value::String(intent.id.clone()));
    map.insert("payload".into(), payload_value(&intent.payload));
    map.insert("signature".into(), Value::String(intent.signature.to_hex()));
    map.insert("signer_pub".into(), Value::String(intent.signer_pub.to_hex()));
    map.insert("type".into(), Value::String(intent.kind.as_str().to_string()));
    Value::Object(map).to_string()
}
