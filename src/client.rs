//! Contract client capability.
//!
//! [`ContractClient`] is the seam between view models and the chain: raw
//! calls, transaction submission and the current block. Typed access goes
//! through the provided [`ContractClient::read`]/[`ContractClient::send_call`]
//! helpers taking `alloy::sol!` generated call types.

use alloy::{
    eips::BlockId,
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash},
    providers::Provider,
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};

use crate::error::{DashboardError, RevertReason};

pub trait ContractClient {
    /// Executes a read-only call, optionally on behalf of `from`.
    fn call(
        &self,
        from: Option<Address>,
        to: Address,
        input: Bytes,
    ) -> impl Future<Output = Result<Bytes, DashboardError>>;

    /// Submits a state-changing transaction signed by `from` and resolves
    /// once it is mined successfully.
    fn send(
        &self,
        from: Address,
        to: Address,
        input: Bytes,
    ) -> impl Future<Output = Result<TxHash, DashboardError>>;

    /// Number of the most recent block.
    fn block_number(&self) -> impl Future<Output = Result<u64, DashboardError>>;

    /// Typed read of a single contract method.
    fn read<C: SolCall>(
        &self,
        to: Address,
        call: &C,
    ) -> impl Future<Output = Result<C::Return, DashboardError>> {
        self.read_as(None, to, call)
    }

    /// Typed read simulated on behalf of `from`, e.g. to preview the
    /// outcome of a transaction the account would send.
    fn read_as<C: SolCall>(
        &self,
        from: Option<Address>,
        to: Address,
        call: &C,
    ) -> impl Future<Output = Result<C::Return, DashboardError>> {
        let input = Bytes::from(call.abi_encode());
        async move {
            let output = self.call(from, to, input).await?;
            C::abi_decode_returns(&output).map_err(DashboardError::from)
        }
    }

    /// Executes several raw calls, returning outputs in request order.
    /// Fails as a whole if any call fails.
    fn batch_read(
        &self,
        calls: Vec<(Address, Bytes)>,
    ) -> impl Future<Output = Result<Vec<Bytes>, DashboardError>> {
        futures::future::try_join_all(
            calls
                .into_iter()
                .map(|(to, input)| self.call(None, to, input)),
        )
    }

    /// Typed transaction submission.
    fn send_call<C: SolCall>(
        &self,
        from: Address,
        to: Address,
        call: &C,
    ) -> impl Future<Output = Result<TxHash, DashboardError>> {
        self.send(from, to, Bytes::from(call.abi_encode()))
    }
}

/// Decodes outputs of [`ContractClient::batch_read`] of calls of the same type.
pub fn decode_all<C: SolCall>(outputs: &[Bytes]) -> Result<Vec<C::Return>, DashboardError> {
    outputs
        .iter()
        .map(|output| C::abi_decode_returns(output).map_err(DashboardError::from))
        .collect()
}

/// [`ContractClient`] backed by an alloy [`Provider`].
///
/// The provider is expected to be configured with a wallet able to sign
/// for the accounts transactions are sent from.
#[derive(Clone, Debug)]
pub struct AlloyContractClient<P> {
    provider: P,
    block_id: Option<BlockId>,
}

impl<P: Provider> AlloyContractClient<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            block_id: None,
        }
    }

    /// Pins all reads to the given block (default: latest).
    pub fn at_block(mut self, block: BlockId) -> Self {
        self.block_id = Some(block);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> ContractClient for AlloyContractClient<P> {
    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        input: Bytes,
    ) -> Result<Bytes, DashboardError> {
        let mut tx = TransactionRequest::default().with_to(to).with_input(input);
        if let Some(from) = from {
            tx = tx.with_from(from);
        }
        let call = self.provider.call(tx);
        let call = match self.block_id {
            Some(block) => call.block(block),
            None => call,
        };
        call.await.map_err(DashboardError::from)
    }

    async fn send(
        &self,
        from: Address,
        to: Address,
        input: Bytes,
    ) -> Result<TxHash, DashboardError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input);
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(%tx_hash, %from, %to, "Transaction submitted");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            tracing::warn!(%tx_hash, "Transaction reverted");
            return Err(DashboardError::Reverted(RevertReason::Unknown));
        }
        Ok(tx_hash)
    }

    async fn block_number(&self) -> Result<u64, DashboardError> {
        self.provider
            .get_block_number()
            .await
            .map_err(DashboardError::from)
    }
}
