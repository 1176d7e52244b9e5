//! Recursive resolution of unconfirmed transaction ancestry.

use futures::future::{try_join_all, BoxFuture};

use crate::error::WhatsOnChainError;
use crate::proof::tsc_to_bump;
use crate::source::ChainSource;
use crate::transaction::Transaction;

/// Resolve `tx` until every ancestry branch terminates at a mined
/// transaction with a verified Merkle path.
///
/// If the explorer has a proof for `tx` itself, the converted path is
/// attached and resolution stops there. Otherwise each input's source
/// transaction is fetched, attached, and resolved the same way; sibling
/// inputs are resolved concurrently and the first fatal error aborts the
/// whole walk.
///
/// A failed proof fetch is treated the same as an absent proof, so a flaky
/// endpoint degrades into a deeper walk rather than a hard failure. Errors
/// from proof conversion itself (a bad proof, a missing header) and from
/// raw-transaction fetches are fatal.
pub async fn resolve_ancestors<S>(
    source: &S,
    tx: &mut Transaction,
) -> Result<(), WhatsOnChainError>
where
    S: ChainSource + Sync,
{
    resolve_inner(source, tx).await
}

fn resolve_inner<'a, S>(
    source: &'a S,
    tx: &'a mut Transaction,
) -> BoxFuture<'a, Result<(), WhatsOnChainError>>
where
    S: ChainSource + Sync,
{
    Box::pin(async move {
        let txid = tx.txid().to_string();

        // A fetch failure here downgrades to "no proof": the walk continues
        // through the inputs instead.
        let proof = source.fetch_tsc_proof(&txid).await.unwrap_or(None);
        if let Some(proof) = proof {
            tx.merkle_path = Some(tsc_to_bump(source, &proof).await?);
            return Ok(());
        }

        try_join_all(tx.inputs.iter_mut().map(|input| async move {
            let parent_txid = input.source_txid.to_string();
            let raw = source
                .fetch_raw_tx(&parent_txid)
                .await
                .map_err(|e| {
                    WhatsOnChainError::SourceFetchFailed(format!("{}: {}", parent_txid, e))
                })?
                .ok_or_else(|| {
                    WhatsOnChainError::SourceFetchFailed(format!(
                        "{}: transaction not found",
                        parent_txid
                    ))
                })?;
            let mut parent = Transaction::from_hex(&raw)?;
            resolve_inner(source, &mut parent).await?;
            input.source_transaction = Some(Box::new(parent));
            Ok::<(), WhatsOnChainError>(())
        }))
        .await?;
        Ok(())
    })
}
