//! Idempotent staging of pending changes on the ledger.
//!
//! For every contract with a desired change, the coordinator compares it to
//! whatever is already pending on chain. Identical changes are skipped, so
//! re-running against unchanged state issues no transactions; a differing
//! pending change is withdrawn first and the new one submitted.

use crate::driver::ExecutionDriver;
use crate::error::OrchestratorError;
use crate::net::LedgerClient;
use crate::reconcile::{AddressBook, PendingChanges};
use crate::types::{Address, Bytes};
use crate::wire::{LedgerCall, TxData, TxRequest};
use tracing::info;

/// Stage every desired change, returning the number of proposals issued.
pub async fn propose_pending_changes(
    client: &LedgerClient<'_>,
    driver: &ExecutionDriver<'_>,
    proposer: Address,
    pending: &PendingChanges,
    addresses: &AddressBook,
) -> Result<u32, OrchestratorError> {
    let already_pending = client.get_proxies_with_pending_changes().await?;
    let mut issued = 0u32;

    for (id, proxy) in addresses {
        let new_implementation = pending.new_implementations.get(id).copied();
        let encoded_call = pending.encoded_calls.get(id).cloned();

        if new_implementation.is_none() && encoded_call.is_none() {
            continue;
        }

        if proposal_matches(client, *proxy, new_implementation, encoded_call.as_deref()).await? {
            info!(contract = %id, "already proposed change matches, no action needed");
            continue;
        }

        if already_pending.contains(proxy) {
            info!(contract = %id, "withdrawing differing pending change first");
            driver
                .submit(ledger_tx(
                    client,
                    proposer,
                    LedgerCall::WithdrawChanges { id: id.clone() },
                ))
                .await?;
        }

        let call = match (new_implementation, encoded_call) {
            (Some(implementation), Some(call_data)) => {
                info!(contract = %id, "proposing upgrade and call");
                LedgerCall::ProposeUpgradeAndCall {
                    id: id.clone(),
                    implementation,
                    call_data,
                }
            }
            (Some(implementation), None) => {
                info!(contract = %id, "proposing upgrade");
                LedgerCall::ProposeUpgrade {
                    id: id.clone(),
                    implementation,
                }
            }
            (None, Some(call_data)) => {
                info!(contract = %id, "proposing call");
                LedgerCall::ProposeCall {
                    id: id.clone(),
                    call_data,
                }
            }
            (None, None) => unreachable!("filtered above"),
        };

        driver.submit(ledger_tx(client, proposer, call)).await?;
        issued += 1;
    }

    Ok(issued)
}

fn ledger_tx(client: &LedgerClient<'_>, from: Address, call: LedgerCall) -> TxRequest {
    TxRequest::new(from, Some(client.address()), TxData::Ledger(call))
}

async fn proposal_matches(
    client: &LedgerClient<'_>,
    proxy: Address,
    new_implementation: Option<Address>,
    encoded_call: Option<&[u8]>,
) -> Result<bool, OrchestratorError> {
    let pending_address = client.get_pending_upgrade_address(proxy).await?;
    let pending_address = (!pending_address.is_zero()).then_some(pending_address);
    if pending_address != new_implementation {
        return Ok(false);
    }

    let pending_call: Bytes = client.get_pending_call_data(proxy).await?;
    let pending_call = (!pending_call.is_empty()).then_some(pending_call);
    if pending_call.as_deref() != encoded_call {
        return Ok(false);
    }

    Ok(true)
}
