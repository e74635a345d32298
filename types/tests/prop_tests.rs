use proptest::prelude::*;

use coinvic_types::{
    Block, Hash256, Intent, IntentKind, IntentPayload, LedgerAccount, PublicKey, Signature,
    Timestamp, WalletId,
};

fn arb_kind() -> impl Strategy<Value = IntentKind> {
    prop::sample::select(IntentKind::ALL.to_vec())
}

fn arb_intent() -> impl Strategy<Value = Intent> {
    (
        arb_kind(),
        "[a-z0-9]{1,16}",
        any::<u128>(),
        prop::option::of("[0-9a-f]{64}"),
        prop::array::uniform32(0u8..),
        any::<u64>(),
        any::<bool>(),
    )
        .prop_map(|(kind, tx, amount, wallet, key, created, processed)| Intent {
            id: tx.clone(),
            kind,
            payload: IntentPayload {
                wallet: wallet.map(WalletId::new),
                from: None,
                to: None,
                amount,
                network: "main".into(),
                reason: None,
                transaction_id: tx,
            },
            signer_pub: PublicKey(key),
            signature: Signature([7u8; 64]),
            created_at: Timestamp::new(created),
            processed,
        })
}

proptest! {
    /// Hash256 is_zero is true only for all-zero bytes.
    #[test]
    fn hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash256::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Intents survive the storage encoding, including the string-encoded
    /// fields that bincode sees only through serde.
    #[test]
    fn intent_bincode_roundtrip(intent in arb_intent()) {
        let encoded = bincode::serialize(&intent).unwrap();
        let decoded: Intent = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, intent);
    }

    /// JSON amounts are always strings, whatever their magnitude.
    #[test]
    fn account_json_amount_is_string(balance in any::<u128>()) {
        let account = LedgerAccount {
            wallet_pubkey: WalletId::new("w"),
            balance,
            last_processed_block: 3,
        };
        let value: serde_json::Value = serde_json::to_value(&account).unwrap();
        let balance_str = balance.to_string();
        prop_assert_eq!(value["balance"].as_str(), Some(balance_str.as_str()));
    }

    /// Block JSON parses back unchanged.
    #[test]
    fn block_json_roundtrip(
        number in 1u64..1_000_000,
        minted in any::<u128>(),
        burned in any::<u128>(),
        bytes in prop::array::uniform32(0u8..),
    ) {
        let block = Block {
            block_number: number,
            previous_block_hash: Hash256::new(bytes),
            minted_amount: minted,
            burned_amount: burned,
            intents_hash: Hash256::ZERO,
            app_data_hash: Hash256::new([1u8; 32]),
            ephemeral_pubkey: PublicKey(bytes),
            treasury_sig: Signature([9u8; 64]),
            block_hash: Hash256::new([2u8; 32]),
            timestamp: Timestamp::new(42),
            intent_count: 2,
        };
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, block);
    }
}
