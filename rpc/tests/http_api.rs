use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use coinvic_crypto::generate_keypair;
use coinvic_rpc::{
    BlockPage, GenerateBlockResponse, HealthReport, LedgerBackend, RpcError, RpcServer,
    SubmitIntentResponse,
};
use coinvic_types::{
    Block, Hash256, Intent, IntentKind, IntentPayload, LedgerAccount, PublicKey, Signature,
    Timestamp, WalletId,
};

#[derive(Default)]
struct FakeBackend {
    intents: Mutex<Vec<Intent>>,
    blocks: Mutex<Vec<Block>>,
    app_data: Option<Vec<u8>>,
    busy: bool,
}

fn block(n: u64) -> Block {
    Block {
        block_number: n,
        previous_block_hash: Hash256::ZERO,
        minted_amount: 100,
        burned_amount: 0,
        intents_hash: Hash256::new([1; 32]),
        app_data_hash: Hash256::new([2; 32]),
        ephemeral_pubkey: PublicKey([3; 32]),
        treasury_sig: Signature([4; 64]),
        block_hash: Hash256::new([n as u8; 32]),
        timestamp: Timestamp::new(n),
        intent_count: 1,
    }
}

impl LedgerBackend for FakeBackend {
    fn submit_intent(&self, intent: Intent) -> Result<(), RpcError> {
        if intent.payload.amount == 0 {
            return Err(RpcError::Rejected("amount must be positive".into()));
        }
        self.intents.lock().unwrap().push(intent);
        Ok(())
    }

    fn latest_block(&self) -> Result<Option<Block>, RpcError> {
        Ok(self.blocks.lock().unwrap().last().cloned())
    }

    fn blocks(&self, from: u64, limit: usize) -> Result<Vec<Block>, RpcError> {
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.block_number >= from)
            .take(limit)
            .cloned()
            .collect())
    }

    fn master_ledger(&self) -> Result<Vec<LedgerAccount>, RpcError> {
        Ok(vec![LedgerAccount {
            wallet_pubkey: WalletId::new("w1"),
            balance: 70,
            last_processed_block: 1,
        }])
    }

    fn app_data(&self) -> Result<Option<Vec<u8>>, RpcError> {
        Ok(self.app_data.clone())
    }

    fn generate_block(&self) -> Result<Option<Block>, RpcError> {
        if self.busy {
            return Err(RpcError::CycleInProgress);
        }
        let mut blocks = self.blocks.lock().unwrap();
        if self.intents.lock().unwrap().drain(..).count() == 0 {
            return Ok(None);
        }
        let next = block(blocks.len() as u64 + 1);
        blocks.push(next.clone());
        Ok(Some(next))
    }

    fn metrics_text(&self) -> Result<String, RpcError> {
        Ok("coinvic_chain_height 1\n".into())
    }

    fn health(&self) -> Result<HealthReport, RpcError> {
        Ok(HealthReport {
            status: "ok".into(),
            chain_height: self.blocks.lock().unwrap().len() as u64,
            latest_block_hash: None,
            pending_intents: self.intents.lock().unwrap().len() as u64,
            treasury_pubkey: PublicKey([9; 32]),
        })
    }
}

struct TestServer {
    base: String,
    stop: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

async fn start(backend: FakeBackend, metrics: bool) -> TestServer {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let listener = RpcServer::<FakeBackend>::bind(addr).await.unwrap();
    let local = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = RpcServer::new(Arc::new(backend), metrics);
    tokio::spawn(server.serve(listener, async move {
        let _ = rx.await;
    }));
    TestServer {
        base: format!("http://{local}"),
        stop: Some(tx),
    }
}

// The HTTP layer only routes; any well-formed intent will do.
fn mint_intent(tx: &str, amount: u128) -> Intent {
    let keypair = generate_keypair();
    Intent {
        id: tx.into(),
        kind: IntentKind::Mint,
        payload: IntentPayload {
            wallet: Some(WalletId::from_public_key(&keypair.public)),
            from: None,
            to: None,
            amount,
            network: "main".into(),
            reason: Some("UserTaskReward".into()),
            transaction_id: tx.into(),
        },
        signer_pub: keypair.public,
        signature: Signature([0; 64]),
        created_at: Timestamp::new(1),
        processed: false,
    }
}

#[tokio::test]
async fn submit_then_generate_then_query() {
    let server = start(FakeBackend::default(), false).await;
    let client = reqwest::Client::new();

    let resp: SubmitIntentResponse = client
        .post(format!("{}/submitIntent", server.base))
        .json(&mint_intent("tx-1", 100))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(resp.ok);
    assert_eq!(resp.id, "tx-1");

    let generated: GenerateBlockResponse = client
        .post(format!("{}/generateBlock", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(generated.block.unwrap().block_number, 1);

    let latest: Option<Block> = client
        .get(format!("{}/latestBlock", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest.unwrap().block_number, 1);

    let ledger: serde_json::Value = client
        .get(format!("{}/masterLedger", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ledger[0]["wallet_pubkey"], "w1");
    assert_eq!(ledger[0]["balance"], "70");
}

#[tokio::test]
async fn empty_chain_and_idle_generate() {
    let server = start(FakeBackend::default(), false).await;
    let client = reqwest::Client::new();

    let latest = client
        .get(format!("{}/latestBlock", server.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(latest, "null");

    let generated: GenerateBlockResponse = client
        .post(format!("{}/generateBlock", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(generated.ok);
    assert!(generated.block.is_none());
}

#[tokio::test]
async fn rejected_and_malformed_intents_map_to_client_errors() {
    let server = start(FakeBackend::default(), false).await;
    let client = reqwest::Client::new();

    let rejected = client
        .post(format!("{}/submitIntent", server.base))
        .json(&mint_intent("tx-0", 0))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 422);
    let body: serde_json::Value = rejected.json().await.unwrap();
    assert_eq!(body["ok"], false);

    let malformed = client
        .post(format!("{}/submitIntent", server.base))
        .body("{\"id\": 5}")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);
}

#[tokio::test]
async fn busy_producer_maps_to_conflict() {
    let backend = FakeBackend {
        busy: true,
        ..FakeBackend::default()
    };
    let server = start(backend, false).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/generateBlock", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn app_data_is_served_byte_for_byte() {
    let raw = br#"{"gameVersion":"0.1.0", "globalSupply":0}"#.to_vec();
    let backend = FakeBackend {
        app_data: Some(raw.clone()),
        ..FakeBackend::default()
    };
    let server = start(backend, false).await;
    let body = reqwest::get(format!("{}/app_data", server.base))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(body.as_ref(), raw.as_slice());

    let empty = start(FakeBackend::default(), false).await;
    let body = reqwest::get(format!("{}/app_data", empty.base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "{}");
}

#[tokio::test]
async fn metrics_route_respects_flag() {
    let disabled = start(FakeBackend::default(), false).await;
    let resp = reqwest::get(format!("{}/metrics", disabled.base)).await.unwrap();
    assert_eq!(resp.status(), 404);

    let enabled = start(FakeBackend::default(), true).await;
    let text = reqwest::get(format!("{}/metrics", enabled.base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("coinvic_chain_height"));
}

#[tokio::test]
async fn blocks_are_paged_by_number() {
    let backend = FakeBackend::default();
    *backend.blocks.lock().unwrap() = (1..=5).map(block).collect();
    let server = start(backend, false).await;

    let page: BlockPage = reqwest::get(format!("{}/blocks?from=2&count=2", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let numbers: Vec<u64> = page.blocks.iter().map(|b| b.block_number).collect();
    assert_eq!(numbers, vec![2, 3]);
    assert_eq!(page.next, Some(4));

    let health: HealthReport = reqwest::get(format!("{}/health", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.chain_height, 5);
}
