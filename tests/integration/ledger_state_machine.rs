//! Ledger state machine scenarios: adoption, staging, batch apply, and the
//! optimistic-concurrency nonce.

use crate::integration::{ledger_err, send, TestEnv};
use capstan::error::LedgerError;
use capstan::ledger::contract_id_hash;
use capstan::signer::Signer;
use capstan::types::Address;
use capstan::wire::{ContractCall, CreateData, LedgerCall, TxData};

fn setup_call(value: &str) -> Vec<u8> {
    ContractCall::new("setup", vec![value.to_string()]).encode()
}

#[tokio::test]
async fn test_version_starts_empty_and_upgrade_sets_it() {
    let env = TestEnv::new().await;
    let client = env.client();

    assert_eq!(client.version().await.unwrap(), "");
    let nonce = env.nonce().await;
    env.ledger_call(
        env.owner.address(),
        LedgerCall::Upgrade {
            version: "1.0.0".into(),
            nonce,
        },
    )
    .await
    .unwrap();
    assert_eq!(client.version().await.unwrap(), "1.0.0");
}

#[tokio::test]
async fn test_nonce_increments_by_one_per_accepted_call() {
    let env = TestEnv::new().await;

    let before = env.nonce().await;
    env.deploy_and_adopt("Registry", b"registry-v1").await;
    assert_eq!(env.nonce().await, before + 1, "adopt increments once");

    let new_impl = env.deploy_implementation(b"registry-v2").await;
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeUpgrade {
            id: "Registry".into(),
            implementation: new_impl,
        },
    )
    .await
    .unwrap();
    assert_eq!(env.nonce().await, before + 2, "propose increments once");

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::WithdrawChanges {
            id: "Registry".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(env.nonce().await, before + 3, "withdraw increments once");

    env.ledger_call(
        env.owner.address(),
        LedgerCall::Disown {
            id: "Registry".into(),
            new_owner: env.outsider.address(),
        },
    )
    .await
    .unwrap();
    assert_eq!(env.nonce().await, before + 4, "disown increments once");
}

#[tokio::test]
async fn test_upgrade_applies_batch_with_single_nonce_increment() {
    let env = TestEnv::new().await;
    let client = env.client();

    let (proxy1, impl1) = env.deploy_and_adopt("C1", b"contract-one-v1").await;
    let (proxy2, _) = env.deploy_and_adopt("C2", b"contract-two-v1").await;
    let (proxy3, impl3) = env.deploy_and_adopt("C3", b"contract-three-v1").await;

    let new_impl1 = env.deploy_implementation(b"contract-one-v2").await;
    let new_impl2 = env.deploy_implementation(b"contract-two-v2").await;

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeUpgrade {
            id: "C1".into(),
            implementation: new_impl1,
        },
    )
    .await
    .unwrap();
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeUpgradeAndCall {
            id: "C2".into(),
            implementation: new_impl2,
            call_data: setup_call("bar"),
        },
    )
    .await
    .unwrap();
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeCall {
            id: "C3".into(),
            call_data: setup_call("baz"),
        },
    )
    .await
    .unwrap();

    let mut pending = client.get_proxies_with_pending_changes().await.unwrap();
    pending.sort();
    let mut expected = vec![proxy1, proxy2, proxy3];
    expected.sort();
    assert_eq!(pending, expected);
    assert_eq!(
        client.get_pending_upgrade_address(proxy1).await.unwrap(),
        new_impl1
    );
    assert_eq!(
        client.get_pending_call_data(proxy2).await.unwrap(),
        setup_call("bar")
    );

    // Nothing applied before the batch.
    assert_eq!(client.proxy_implementation(proxy1).await.unwrap(), impl1);

    let nonce = env.nonce().await;
    // A stale nonce is rejected outright.
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::Upgrade {
                version: "1.0.1".into(),
                nonce: nonce - 1,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::NonceConflict { .. }));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::Upgrade {
            version: "1.0.1".into(),
            nonce,
        },
    )
    .await
    .unwrap();

    assert_eq!(
        env.nonce().await,
        nonce + 1,
        "a batch upgrade increments the nonce by exactly 1"
    );
    assert_eq!(client.version().await.unwrap(), "1.0.1");
    assert_eq!(
        client.proxy_implementation(proxy1).await.unwrap(),
        new_impl1
    );
    assert_eq!(
        client.proxy_implementation(proxy2).await.unwrap(),
        new_impl2
    );
    assert_eq!(client.proxy_implementation(proxy3).await.unwrap(), impl3);

    let configured = env.network.with_chain(|chain| {
        (
            chain.contract(proxy2).unwrap().config.get("setup").cloned(),
            chain.contract(proxy3).unwrap().config.get("setup").cloned(),
        )
    });
    assert_eq!(configured.0.as_deref(), Some("bar"));
    assert_eq!(configured.1.as_deref(), Some("baz"));

    assert!(client
        .get_proxies_with_pending_changes()
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        client.get_pending_upgrade_address(proxy1).await.unwrap(),
        Address::ZERO
    );
    assert!(client.get_pending_call_data(proxy2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stale_nonce_upgrade_leaves_all_state_unchanged() {
    let env = TestEnv::new().await;
    env.deploy_and_adopt("Registry", b"registry-v1").await;
    let new_impl = env.deploy_implementation(b"registry-v2").await;
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeUpgrade {
            id: "Registry".into(),
            implementation: new_impl,
        },
    )
    .await
    .unwrap();

    let snapshot = env
        .network
        .with_chain(|chain| chain.ledger(env.ledger).unwrap().clone());

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::Upgrade {
                version: "2".into(),
                nonce: env.nonce().await + 7,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::NonceConflict { .. }));

    let after = env
        .network
        .with_chain(|chain| chain.ledger(env.ledger).unwrap().clone());
    assert_eq!(snapshot, after);
}

#[tokio::test]
async fn test_upgrade_batch_is_atomic_when_a_staged_call_fails() {
    let env = TestEnv::new().await;
    let (proxy, _) = env.deploy_and_adopt("Registry", b"registry-v1").await;

    // A staged ownership transfer with a malformed argument fails at apply
    // time; the whole batch must roll back.
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeCall {
            id: "Registry".into(),
            call_data: ContractCall::new("transferOwnership", vec!["not-an-address".into()])
                .encode(),
        },
    )
    .await
    .unwrap();

    let nonce = env.nonce().await;
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::Upgrade {
                version: "1.0.1".into(),
                nonce,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::CallFailed { .. }));

    let client = env.client();
    assert_eq!(env.nonce().await, nonce, "rejected apply leaves nonce alone");
    assert_eq!(client.version().await.unwrap(), "");
    assert_eq!(
        client.get_proxies_with_pending_changes().await.unwrap(),
        vec![proxy],
        "the pending change survives a rejected apply"
    );
}

#[tokio::test]
async fn test_upgrade_requires_owner_and_version() {
    let env = TestEnv::new().await;
    let nonce = env.nonce().await;

    let err = ledger_err(
        env.ledger_call(
            env.outsider.address(),
            LedgerCall::Upgrade {
                version: "1".into(),
                nonce,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::Upgrade {
                version: String::new(),
                nonce,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[tokio::test]
async fn test_empty_upgrade_force_sets_version() {
    let env = TestEnv::new().await;
    env.deploy_and_adopt("Registry", b"registry-v1").await;
    let nonce = env.nonce().await;
    env.ledger_call(
        env.owner.address(),
        LedgerCall::Upgrade {
            version: "1.0.1".into(),
            nonce,
        },
    )
    .await
    .unwrap();
    assert_eq!(env.client().version().await.unwrap(), "1.0.1");
    assert_eq!(env.nonce().await, nonce + 1);
}

#[tokio::test]
async fn test_adopt_validations() {
    let env = TestEnv::new().await;
    let (proxy, _) = env.deploy_and_adopt("Registry", b"registry-v1").await;

    // Empty id.
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: String::new(),
                proxy,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    // Duplicate id.
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: "Registry".into(),
                proxy,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::Conflict(_)));

    // Same proxy under a different id.
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: "Duplicate".into(),
                proxy,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::Conflict(_)));

    // Not a proxy at all.
    let plain = env.deploy_implementation(b"standalone").await;
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: "Standalone".into(),
                proxy: plain,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    // Proxy admin not owned by the ledger.
    let foreign_admin = send(
        &env.network,
        env.outsider.address(),
        None,
        TxData::Create(CreateData::ProxyAdmin),
    )
    .await
    .unwrap()
    .created
    .unwrap();
    let implementation = env.deploy_implementation(b"foreign-v1").await;
    let foreign_proxy = send(
        &env.network,
        env.outsider.address(),
        None,
        TxData::Create(CreateData::Proxy {
            implementation,
            admin: foreign_admin,
            owner: env.ledger,
        }),
    )
    .await
    .unwrap()
    .created
    .unwrap();
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: "Foreign".into(),
                proxy: foreign_proxy,
                proxy_admin: foreign_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    // Right admin family, but the named admin is not this proxy's admin.
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: "WrongAdmin".into(),
                proxy: foreign_proxy,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    // Proxy not owned by the ledger.
    let implementation = env.deploy_implementation(b"unowned-v1").await;
    let unowned_proxy = send(
        &env.network,
        env.owner.address(),
        None,
        TxData::Create(CreateData::Proxy {
            implementation,
            admin: env.proxy_admin,
            owner: env.owner.address(),
        }),
    )
    .await
    .unwrap()
    .created
    .unwrap();
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: "Unowned".into(),
                proxy: unowned_proxy,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_capacity_boundary() {
    let env = TestEnv::new().await;

    for i in 0..100 {
        env.deploy_and_adopt(&format!("C{i}"), format!("code-{i}").as_bytes())
            .await;
    }
    assert_eq!(env.client().get_proxies().await.unwrap().len(), 100);

    // The 101st adoption rejects.
    let implementation = env.deploy_implementation(b"one-too-many").await;
    let proxy = send(
        &env.network,
        env.owner.address(),
        None,
        TxData::Create(CreateData::Proxy {
            implementation,
            admin: env.proxy_admin,
            owner: env.ledger,
        }),
    )
    .await
    .unwrap()
    .created
    .unwrap();
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AdoptContract {
                id: "C100".into(),
                proxy,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert_eq!(err, LedgerError::CapacityExceeded);
}

#[tokio::test]
async fn test_propose_requires_proposer_and_known_id() {
    let env = TestEnv::new().await;
    env.deploy_and_adopt("Registry", b"registry-v1").await;
    let new_impl = env.deploy_implementation(b"registry-v2").await;

    let err = ledger_err(
        env.ledger_call(
            env.outsider.address(),
            LedgerCall::ProposeUpgrade {
                id: "Registry".into(),
                implementation: new_impl,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::ProposeUpgrade {
                id: "BadName".into(),
                implementation: new_impl,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn test_propose_validates_implementation_address() {
    let env = TestEnv::new().await;
    let (_, implementation) = env.deploy_and_adopt("Registry", b"registry-v1").await;

    // Unchanged implementation.
    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::ProposeUpgrade {
                id: "Registry".into(),
                implementation,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    // Address with no code.
    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::ProposeUpgrade {
                id: "Registry".into(),
                implementation: env.outsider.address(),
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[tokio::test]
async fn test_second_proposal_requires_withdraw_first() {
    let env = TestEnv::new().await;
    env.deploy_and_adopt("Registry", b"registry-v1").await;
    let v2 = env.deploy_implementation(b"registry-v2").await;
    let v3 = env.deploy_implementation(b"registry-v3").await;

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeUpgrade {
            id: "Registry".into(),
            implementation: v2,
        },
    )
    .await
    .unwrap();

    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::ProposeUpgrade {
                id: "Registry".into(),
                implementation: v3,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::Conflict(_)));

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::WithdrawChanges {
            id: "Registry".into(),
        },
    )
    .await
    .unwrap();
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeUpgrade {
            id: "Registry".into(),
            implementation: v3,
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_withdraw_requires_existing_pending_change() {
    let env = TestEnv::new().await;
    env.deploy_and_adopt("Registry", b"registry-v1").await;

    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::WithdrawChanges {
                id: "Registry".into(),
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn test_disown_frees_id_for_reuse() {
    let env = TestEnv::new().await;
    let client = env.client();
    let (proxy, _) = env.deploy_and_adopt("X", b"x-v1").await;

    // Stage something so we can see it cleared.
    let v2 = env.deploy_implementation(b"x-v2").await;
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeUpgrade {
            id: "X".into(),
            implementation: v2,
        },
    )
    .await
    .unwrap();

    let err = ledger_err(
        env.ledger_call(
            env.outsider.address(),
            LedgerCall::Disown {
                id: "X".into(),
                new_owner: env.outsider.address(),
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::Disown {
            id: "X".into(),
            new_owner: env.outsider.address(),
        },
    )
    .await
    .unwrap();

    assert_eq!(
        client.adopted_contract_addresses("X").await.unwrap(),
        Address::ZERO
    );
    assert!(client.get_proxies().await.unwrap().is_empty());
    assert!(client
        .get_proxies_with_pending_changes()
        .await
        .unwrap()
        .is_empty());
    let record = client.adopted_contract_by_proxy(proxy).await.unwrap();
    assert_eq!(record.id, "");
    assert_eq!(record.upgrade_address, Address::ZERO);

    // The proxy now belongs to the new owner; the shared admin stays put.
    assert_eq!(
        client.contract_owner(proxy).await.unwrap(),
        env.outsider.address()
    );
    assert_eq!(
        client.contract_owner(env.proxy_admin).await.unwrap(),
        env.ledger
    );

    // The freed id can be re-adopted with a new proxy.
    let (new_proxy, _) = env.deploy_and_adopt("X", b"x-v2-fresh").await;
    assert_eq!(
        client.adopted_contract_addresses("X").await.unwrap(),
        new_proxy
    );
}

#[tokio::test]
async fn test_proposer_set_management() {
    let env = TestEnv::new().await;
    let client = env.client();
    let a = env.proposer.address();
    let b = env.outsider.address();

    assert_eq!(client.get_upgrade_proposers().await.unwrap(), vec![a]);

    let err = ledger_err(
        env.ledger_call(b, LedgerCall::AddUpgradeProposer { proposer: b })
            .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::AddUpgradeProposer { proposer: b },
    )
    .await
    .unwrap();
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::AddUpgradeProposer { proposer: b },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::Conflict(_)));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::RemoveUpgradeProposer { proposer: a },
    )
    .await
    .unwrap();
    assert_eq!(client.get_upgrade_proposers().await.unwrap(), vec![b]);

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::RemoveUpgradeProposer { proposer: a },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn test_abstract_last_proposal_wins_and_zero_address_deletes() {
    let env = TestEnv::new().await;
    let client = env.client();

    let v1 = env.deploy_implementation(b"abstract-v1").await;
    let v2 = env.deploy_implementation(b"abstract-v2").await;

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::ProposeAbstract {
                id: "Hooks".into(),
                address: v1,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::ProposeAbstract {
                id: "Hooks".into(),
                address: env.outsider.address(),
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeAbstract {
            id: "Hooks".into(),
            address: v1,
        },
    )
    .await
    .unwrap();
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeAbstract {
            id: "Hooks".into(),
            address: v2,
        },
    )
    .await
    .unwrap();

    // Nothing materialized before the batch; the queue preserves order.
    assert_eq!(
        client.get_abstract_contract_address("Hooks").await.unwrap(),
        Address::ZERO
    );
    let queue = client.proposed_abstract_contracts().await.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].address, v1);
    assert_eq!(queue[1].address, v2);

    let nonce = env.nonce().await;
    env.ledger_call(
        env.owner.address(),
        LedgerCall::Upgrade {
            version: "1".into(),
            nonce,
        },
    )
    .await
    .unwrap();

    // Last proposal won; the queue is cleared.
    assert_eq!(
        client.get_abstract_contract_address("Hooks").await.unwrap(),
        v2
    );
    assert!(client.proposed_abstract_contracts().await.unwrap().is_empty());
    assert_eq!(
        client.get_abstract_contract_id_hashes().await.unwrap(),
        vec![contract_id_hash("Hooks")]
    );

    // Zero address deletes at the next apply.
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeAbstract {
            id: "Hooks".into(),
            address: Address::ZERO,
        },
    )
    .await
    .unwrap();
    let nonce = env.nonce().await;
    env.ledger_call(
        env.owner.address(),
        LedgerCall::Upgrade {
            version: "2".into(),
            nonce,
        },
    )
    .await
    .unwrap();
    assert_eq!(
        client.get_abstract_contract_address("Hooks").await.unwrap(),
        Address::ZERO
    );
    assert!(client
        .get_abstract_contract_id_hashes()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_two_abstract_ids_same_implementation_apply_in_one_batch() {
    let env = TestEnv::new().await;
    let client = env.client();
    let shared = env.deploy_implementation(b"shared-impl").await;

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeAbstract {
            id: "A".into(),
            address: shared,
        },
    )
    .await
    .unwrap();
    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeAbstract {
            id: "A2".into(),
            address: shared,
        },
    )
    .await
    .unwrap();

    let nonce = env.nonce().await;
    env.ledger_call(
        env.owner.address(),
        LedgerCall::Upgrade {
            version: "1".into(),
            nonce,
        },
    )
    .await
    .unwrap();
    assert_eq!(env.nonce().await, nonce + 1, "one increment for the batch");

    // Both ids resolve, tracked independently.
    assert_eq!(client.get_abstract_contract_address("A").await.unwrap(), shared);
    assert_eq!(
        client.get_abstract_contract_address("A2").await.unwrap(),
        shared
    );
    let hashes = client.get_abstract_contract_id_hashes().await.unwrap();
    assert_eq!(hashes.len(), 2);
    assert!(hashes.contains(&contract_id_hash("A")));
    assert!(hashes.contains(&contract_id_hash("A2")));
}

#[tokio::test]
async fn test_withdraw_all_abstract_proposals() {
    let env = TestEnv::new().await;
    let v1 = env.deploy_implementation(b"abstract-v1").await;

    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::WithdrawAllAbstractProposals,
        )
        .await,
    );
    assert!(matches!(err, LedgerError::NotFound(_)), "empty queue rejects");

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::ProposeAbstract {
            id: "Hooks".into(),
            address: v1,
        },
    )
    .await
    .unwrap();

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::WithdrawAllAbstractProposals,
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    env.ledger_call(
        env.proposer.address(),
        LedgerCall::WithdrawAllAbstractProposals,
    )
    .await
    .unwrap();
    assert!(env
        .client()
        .proposed_abstract_contracts()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_ownership_transfer_rails() {
    let env = TestEnv::new().await;
    let client = env.client();

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::TransferOwnership {
                new_owner: Address::ZERO,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::TransferOwnership {
                new_owner: env.ledger,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::TransferOwnership {
            new_owner: env.outsider.address(),
        },
    )
    .await
    .unwrap();
    assert_eq!(client.owner().await.unwrap(), env.outsider.address());

    // The old owner lost its authority.
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::TransferOwnership {
                new_owner: env.owner.address(),
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_owner_call_applies_immediately() {
    let env = TestEnv::new().await;
    let (proxy, _) = env.deploy_and_adopt("Registry", b"registry-v1").await;

    let err = ledger_err(
        env.ledger_call(
            env.proposer.address(),
            LedgerCall::Call {
                id: "Registry".into(),
                call_data: setup_call("bar"),
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::Call {
            id: "Registry".into(),
            call_data: setup_call("bar"),
        },
    )
    .await
    .unwrap();

    let configured = env
        .network
        .with_chain(|chain| chain.contract(proxy).unwrap().config.get("setup").cloned());
    assert_eq!(configured.as_deref(), Some("bar"));
}

#[tokio::test]
async fn test_self_upgrade_swaps_the_ledgers_own_implementation() {
    let env = TestEnv::new().await;
    let client = env.client();
    let new_impl = env.deploy_implementation(b"ledger-v2").await;

    let err = ledger_err(
        env.ledger_call(
            env.outsider.address(),
            LedgerCall::SelfUpgrade {
                implementation: new_impl,
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::PermissionDenied(_)));

    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::SelfUpgrade {
                implementation: env.outsider.address(),
                proxy_admin: env.proxy_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::SelfUpgrade {
            implementation: new_impl,
            proxy_admin: env.proxy_admin,
        },
    )
    .await
    .unwrap();
    assert_eq!(
        client.proxy_implementation(env.ledger).await.unwrap(),
        new_impl
    );
}

#[tokio::test]
async fn test_change_and_disown_proxy_admin() {
    let env = TestEnv::new().await;
    let client = env.client();
    let (proxy, _) = env.deploy_and_adopt("Registry", b"registry-v1").await;

    let other_admin = send(
        &env.network,
        env.owner.address(),
        None,
        TxData::Create(CreateData::ProxyAdmin),
    )
    .await
    .unwrap()
    .created
    .unwrap();

    // Cannot change the admin of a contract the ledger still manages.
    let err = ledger_err(
        env.ledger_call(
            env.owner.address(),
            LedgerCall::ChangeProxyAdmin {
                proxy_admin: env.proxy_admin,
                proxy,
                new_admin: other_admin,
            },
        )
        .await,
    );
    assert!(matches!(err, LedgerError::Conflict(_)));

    env.ledger_call(
        env.owner.address(),
        LedgerCall::Disown {
            id: "Registry".into(),
            new_owner: env.outsider.address(),
        },
    )
    .await
    .unwrap();

    env.ledger_call(
        env.owner.address(),
        LedgerCall::ChangeProxyAdmin {
            proxy_admin: env.proxy_admin,
            proxy,
            new_admin: other_admin,
        },
    )
    .await
    .unwrap();
    let admin = env
        .network
        .with_chain(|chain| chain.proxy(proxy).unwrap().admin);
    assert_eq!(admin, other_admin);

    env.ledger_call(
        env.owner.address(),
        LedgerCall::DisownProxyAdmin {
            proxy_admin: env.proxy_admin,
            new_owner: env.outsider.address(),
        },
    )
    .await
    .unwrap();
    assert_eq!(
        client.contract_owner(env.proxy_admin).await.unwrap(),
        env.outsider.address()
    );
}
