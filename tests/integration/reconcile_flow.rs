//! End-to-end deploy / status / upgrade flows against the embedded network:
//! bootstrap, adoption, idempotent re-runs, staged upgrades, and the status
//! drift gate.

use capstan::artifacts::MemoryArtifacts;
use capstan::chain::Chain;
use capstan::deployer::{BOOTSTRAP_SIGNER, DEPLOYMENT_COST};
use capstan::manifest::Manifest;
use capstan::net::{DevNetwork, LedgerClient, Network};
use capstan::ops::{self, OpsContext};
use capstan::quorum::SubmitOutcome;
use capstan::signer::{KeySigner, Signer};
use capstan::store::MetadataStore;
use capstan::types::Address;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn test_manifest() -> Manifest {
    Manifest::from_toml(
        r#"
        [[contracts]]
        id = "Registry"

        [[contracts]]
        id = "Hooks"
        abstract = true
        deterministic = true
        "#,
    )
    .unwrap()
}

fn artifacts(registry_code: &[u8], hooks_code: &[u8]) -> MemoryArtifacts {
    let mut store = MemoryArtifacts::new();
    store.insert("Registry", b"registry-init", registry_code);
    store.insert("Hooks", b"hooks-init", hooks_code);
    store
}

struct Flow {
    network: DevNetwork,
    store: MetadataStore,
    signer: KeySigner,
    _dir: TempDir,
}

impl Flow {
    fn new() -> Self {
        let mut chain = Chain::new(31337);
        chain.fund(BOOTSTRAP_SIGNER, DEPLOYMENT_COST);
        let dir = TempDir::new().unwrap();
        Self {
            network: DevNetwork::new(chain),
            store: MetadataStore::open(dir.path().join("metadata")).unwrap(),
            signer: KeySigner::from_seed("deployer"),
            _dir: dir,
        }
    }

    fn ctx<'a>(&'a self, artifacts: &'a MemoryArtifacts, dry_run: bool) -> OpsContext<'a> {
        OpsContext {
            network: &self.network,
            network_name: "sandbox",
            store: &self.store,
            artifacts,
            signer: Arc::new(self.signer.clone()),
            auto_confirm: true,
            dry_run,
            prior_signatures: Vec::new(),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1),
        }
    }

    async fn tx_count(&self) -> u64 {
        self.network
            .get_transaction_count(self.signer.address())
            .await
            .unwrap()
    }

    fn ledger_client(&self) -> LedgerClient<'_> {
        let address = self
            .store
            .get_address("sandbox", capstan::store::LEDGER_ADDRESS_KEY)
            .unwrap()
            .expect("ledger recorded");
        LedgerClient::new(&self.network, address)
    }
}

#[tokio::test]
async fn test_first_deploy_adopts_and_second_run_is_idempotent() {
    let flow = Flow::new();
    let manifest = test_manifest();
    let artifacts = artifacts(b"registry-code-v1", b"hooks-code-v1");

    let outcome = ops::deploy(&flow.ctx(&artifacts, false), &manifest)
        .await
        .unwrap();
    assert!(outcome.pending.is_empty(), "fresh deploy has nothing to stage");
    assert!(outcome.addresses.contains_key("Registry"));
    assert!(outcome.addresses.contains_key("Hooks"));

    let client = flow.ledger_client();
    let proxy = client.adopted_contract_addresses("Registry").await.unwrap();
    assert_ne!(proxy, Address::ZERO);
    assert_eq!(outcome.addresses["Registry"], proxy);

    // The abstract contract is proposed, not yet materialized.
    let queue = client.proposed_abstract_contracts().await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, "Hooks");
    assert_eq!(
        client.get_abstract_contract_address("Hooks").await.unwrap(),
        Address::ZERO
    );

    // Second run against unchanged declared and chain state issues zero
    // transactions.
    let nonce_before = client.nonce().await.unwrap();
    let count_before = flow.tx_count().await;
    let second = ops::deploy(&flow.ctx(&artifacts, false), &manifest)
        .await
        .unwrap();
    assert!(second.pending.is_empty());
    assert_eq!(flow.tx_count().await, count_before);
    assert_eq!(client.nonce().await.unwrap(), nonce_before);
}

#[tokio::test]
async fn test_code_change_is_staged_then_applied_atomically() {
    let flow = Flow::new();
    let manifest = test_manifest();

    let v1 = artifacts(b"registry-code-v1", b"hooks-code-v1");
    ops::deploy(&flow.ctx(&v1, false), &manifest).await.unwrap();

    // Apply the initial state (materializes the abstract contract).
    match ops::upgrade(&flow.ctx(&v1, false), "1.0.0").await.unwrap() {
        SubmitOutcome::Executed(_) => {}
        other => panic!("expected direct execution, got {other:?}"),
    }
    let client = flow.ledger_client();
    assert_eq!(client.version().await.unwrap(), "1.0.0");
    let hooks = client.get_abstract_contract_address("Hooks").await.unwrap();
    assert_ne!(hooks, Address::ZERO);

    // No drift right after an applied deploy.
    let report = ops::protocol_status(&flow.ctx(&v1, false), &manifest)
        .await
        .unwrap();
    assert!(!report.any_changed);

    // A local code change is detected and staged.
    let v2 = artifacts(b"registry-code-v2", b"hooks-code-v1");
    let outcome = ops::deploy(&flow.ctx(&v2, false), &manifest).await.unwrap();
    let staged = outcome.pending.new_implementations["Registry"];

    let proxy = client.adopted_contract_addresses("Registry").await.unwrap();
    assert_eq!(client.get_pending_upgrade_address(proxy).await.unwrap(), staged);

    let report = ops::protocol_status(&flow.ctx(&v2, false), &manifest)
        .await
        .unwrap();
    assert!(report.any_changed, "staged change is drift");

    // Re-running with the same local state proposes nothing new.
    let count_before = flow.tx_count().await;
    ops::deploy(&flow.ctx(&v2, false), &manifest).await.unwrap();
    assert_eq!(flow.tx_count().await, count_before);

    // Apply and verify the swap.
    ops::upgrade(&flow.ctx(&v2, false), "1.0.1").await.unwrap();
    assert_eq!(client.version().await.unwrap(), "1.0.1");
    assert_eq!(
        client.proxy_implementation(proxy).await.unwrap(),
        staged
    );
    assert_eq!(
        client.get_pending_upgrade_address(proxy).await.unwrap(),
        Address::ZERO
    );

    let report = ops::protocol_status(&flow.ctx(&v2, false), &manifest)
        .await
        .unwrap();
    assert!(!report.any_changed, "no drift after apply");
}

#[tokio::test]
async fn test_dry_run_stages_nothing() {
    let flow = Flow::new();
    let manifest = test_manifest();
    let store = artifacts(b"registry-code-v1", b"hooks-code-v1");

    let outcome = ops::deploy(&flow.ctx(&store, true), &manifest).await.unwrap();
    assert_eq!(outcome.planned.len(), 2);
    assert!(outcome
        .planned
        .iter()
        .any(|p| p.contains("Registry") && p.contains("adopt")));

    // The ledger itself was bootstrapped, but nothing was adopted or staged.
    let client = flow.ledger_client();
    assert!(client.get_proxies().await.unwrap().is_empty());
    assert!(client.proposed_abstract_contracts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deterministic_abstract_redeploy_reuses_address_across_networks() {
    // The same declared entry and artifact land on the same address on two
    // independent chains.
    let mut hooks_address = Vec::new();
    for _ in 0..2 {
        let flow = Flow::new();
        let manifest = test_manifest();
        let store = artifacts(b"registry-code-v1", b"hooks-code-v1");
        let outcome = ops::deploy(&flow.ctx(&store, false), &manifest)
            .await
            .unwrap();
        hooks_address.push(outcome.addresses["Hooks"]);
    }
    assert_eq!(hooks_address[0], hooks_address[1]);
}

#[tokio::test]
async fn test_proposer_management_flow() {
    let flow = Flow::new();
    let manifest = test_manifest();
    let store = artifacts(b"registry-code-v1", b"hooks-code-v1");
    ops::deploy(&flow.ctx(&store, false), &manifest).await.unwrap();

    let client = flow.ledger_client();
    let deployer = flow.signer.address();
    let other = KeySigner::from_seed("other-proposer").address();

    assert_eq!(client.get_upgrade_proposers().await.unwrap(), vec![deployer]);

    let ctx = flow.ctx(&store, false);
    ops::add_proposer(&ctx, other).await.unwrap();
    assert!(ops::add_proposer(&ctx, other).await.is_err(), "duplicate add");

    ops::remove_proposer(&ctx, deployer).await.unwrap();
    assert_eq!(client.get_upgrade_proposers().await.unwrap(), vec![other]);
    assert!(
        ops::remove_proposer(&ctx, deployer).await.is_err(),
        "removing a non-proposer"
    );
}
