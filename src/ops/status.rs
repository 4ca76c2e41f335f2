//! Read-only protocol status: a drift table over every adopted contract.

use crate::artifacts::stripped_code_hash;
use crate::error::OrchestratorError;
use crate::manifest::Manifest;
use crate::ops::OpsContext;
use crate::types::Address;
use crate::wire::describe_call_data;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Rendered status plus whether any drift was detected. Drift means staged
/// changes on the ledger, a local bytecode change not yet staged, or a
/// non-empty abstract proposal queue; status-gated pipelines exit non-zero
/// on it.
pub struct StatusReport {
    pub table: Table,
    pub any_changed: bool,
}

pub async fn protocol_status(
    ctx: &OpsContext<'_>,
    manifest: &Manifest,
) -> Result<StatusReport, OrchestratorError> {
    let client = ctx.ledger_client()?;

    let mut table = Table::new();
    table.set_header(vec![
        "Contract ID",
        "Class",
        "Proxy",
        "Current Implementation",
        "Proposed Implementation",
        "Proposed Call",
        "Local Code Changed",
    ]);

    let mut any_changed = false;

    for proxy in client.get_proxies().await? {
        let record = client.adopted_contract_by_proxy(proxy).await?;
        let entry = manifest.get(&record.id).ok_or_else(|| {
            OrchestratorError::Manifest(format!(
                "no local configuration for adopted contract {}",
                record.id
            ))
        })?;

        let implementation = client.proxy_implementation(proxy).await?;
        let artifact = ctx.artifacts.artifact(entry.class_name())?;
        let code = ctx.network.get_code(implementation).await?;
        let local_changed =
            code.is_empty() || stripped_code_hash(&code) != artifact.code_hash();

        let has_staged =
            record.upgrade_address != Address::ZERO || !record.encoded_call.is_empty();
        if has_staged || local_changed {
            any_changed = true;
        }

        table.add_row(vec![
            record.id.clone(),
            entry.class_name().to_string(),
            proxy.to_hex(),
            implementation.to_hex(),
            if record.upgrade_address != Address::ZERO {
                record.upgrade_address.to_hex()
            } else {
                String::new()
            },
            if record.encoded_call.is_empty() {
                String::new()
            } else {
                describe_call_data(&record.encoded_call)
            },
            if local_changed {
                "YES".red().to_string()
            } else {
                String::new()
            },
        ]);
    }

    if !client.proposed_abstract_contracts().await?.is_empty() {
        any_changed = true;
    }

    Ok(StatusReport { table, any_changed })
}
