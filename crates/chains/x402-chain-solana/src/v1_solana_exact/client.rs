//! Offline payment construction for the V1 Solana "exact" scheme.
//!
//! [`ExactPaymentBuilder`] assembles the transaction a buyer would sign: compute
//! budget, an optional CreateATA for the seller, one transfer, and a random memo. It needs no RPC access; the caller
//! supplies the recent blockhash when the transaction is meant to land.
//!
//! # Usage
//!
//! ```rust
//! use solana_keypair::Keypair;
//! use solana_signer::Signer;
//! use x402_chain_solana::chain::SolanaNetwork;
//! use x402_chain_solana::v1_solana_exact::{ExactPaymentBuilder, TransferAsset};
//! use x402_types::timestamp::UnixTimestamp;
//!
//! let buyer = Keypair::new();
//! let seller = Keypair::new();
//! let builder = ExactPaymentBuilder::new(
//!     SolanaNetwork::Devnet,
//!     seller.pubkey(),
//!     TransferAsset::Native,
//!     1_000_000,
//! );
//! let payload = builder.payment_payload(&buyer, UnixTimestamp::now()).unwrap();
//! let requirements = builder.requirements();
//! assert_eq!(payload.network, requirements.network);
//! ```

use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_instruction::{AccountMeta, Instruction};
use solana_message::v0::Message as MessageV0;
use solana_message::{Hash, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use std::num::NonZeroU64;
use x402_types::proto::v1::{PaymentPayload, PaymentRequirements, Scheme, X402Version1};
use x402_types::timestamp::UnixTimestamp;
use x402_types::util::Base64Bytes;

use crate::chain::{
    ATA_PROGRAM_PUBKEY, SolanaNetwork, SolanaTokenDeployment, associated_token_address,
};
use crate::v1_solana_exact::types::{
    MEMO_PROGRAM_PUBKEY, NATIVE_SOL_ASSET, SYSTEM_PROGRAM_PUBKEY, SYSTEM_TRANSFER_DISCRIMINANT,
    SolanaExactExtra, TransactionInt, TransactionSignError, TransactionToB64Error,
};

/// What the payment moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAsset {
    /// Lamports, via the System program.
    Native,
    /// An SPL token, via `TransferChecked` between associated token accounts.
    Token(SolanaTokenDeployment),
}

impl TransferAsset {
    /// The `asset` string used in payment requirements.
    pub fn asset_id(&self) -> String {
        match self {
            TransferAsset::Native => NATIVE_SOL_ASSET.to_string(),
            TransferAsset::Token(deployment) => deployment.address.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExactPaymentBuildError {
    #[error("Can not build transfer instruction: {0}")]
    Instruction(String),
    #[error("Can not compile message: {0}")]
    Compile(String),
    #[error(transparent)]
    Sign(#[from] TransactionSignError),
    #[error(transparent)]
    Encode(#[from] TransactionToB64Error),
}

/// System program `Transfer` instruction, encoded by hand.
pub fn native_transfer_instruction(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_DISCRIMINANT.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    Instruction::new_with_bytes(
        SYSTEM_PROGRAM_PUBKEY,
        &data,
        vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
    )
}

/// Associated Token Account program `CreateIdempotent` for `owner`'s account of `mint`.
pub fn create_ata_instruction(
    funding: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    let ata = associated_token_address(owner, token_program, mint);
    Instruction::new_with_bytes(
        ATA_PROGRAM_PUBKEY,
        &[1],
        vec![
            AccountMeta::new(*funding, true),
            AccountMeta::new(ata, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_PUBKEY, false),
            AccountMeta::new_readonly(*token_program, false),
        ],
    )
}

/// Build a memo instruction with a random nonce for transaction uniqueness.
/// The SPL Memo program requires valid UTF-8 data, so the random bytes are base64-encoded.
pub fn random_memo_instruction() -> Instruction {
    let nonce: [u8; 16] = rand::random();
    let memo_data = Base64Bytes::encode(nonce).to_string();

    Instruction::new_with_bytes(
        MEMO_PROGRAM_PUBKEY,
        memo_data.as_bytes(),
        Vec::new(), // SPL Memo doesn't require signers
    )
}

/// Builds signed exact-scheme payments and the requirements they satisfy.
#[derive(Debug, Clone)]
pub struct ExactPaymentBuilder {
    network: SolanaNetwork,
    pay_to: Pubkey,
    asset: TransferAsset,
    amount: u64,
    fee_payer: Option<Pubkey>,
    compute_unit_limit: u32,
    compute_unit_price: u64,
    memo: bool,
    create_ata: bool,
    recent_blockhash: Hash,
    max_timeout_seconds: NonZeroU64,
}

impl ExactPaymentBuilder {
    pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 200_000;
    pub const DEFAULT_COMPUTE_UNIT_PRICE: u64 = 1;
    pub const DEFAULT_MAX_TIMEOUT_SECONDS: NonZeroU64 = match NonZeroU64::new(60) {
        Some(seconds) => seconds,
        None => NonZeroU64::MIN,
    };

    pub fn new(network: SolanaNetwork, pay_to: Pubkey, asset: TransferAsset, amount: u64) -> Self {
        Self {
            network,
            pay_to,
            asset,
            amount,
            fee_payer: None,
            compute_unit_limit: Self::DEFAULT_COMPUTE_UNIT_LIMIT,
            compute_unit_price: Self::DEFAULT_COMPUTE_UNIT_PRICE,
            memo: true,
            create_ata: false,
            recent_blockhash: Hash::default(),
            max_timeout_seconds: Self::DEFAULT_MAX_TIMEOUT_SECONDS,
        }
    }

    /// Designates a facilitator that pays fees and co-signs slot 0 later.
    pub fn with_fee_payer(mut self, fee_payer: Pubkey) -> Self {
        self.fee_payer = Some(fee_payer);
        self
    }

    pub fn with_compute_budget(mut self, unit_limit: u32, unit_price: u64) -> Self {
        self.compute_unit_limit = unit_limit;
        self.compute_unit_price = unit_price;
        self
    }

    pub fn with_memo(mut self, memo: bool) -> Self {
        self.memo = memo;
        self
    }

    /// Opens the seller's token account, funded by the sender, before a token transfer.
    /// Ignored for native transfers.
    pub fn with_create_ata(mut self, create_ata: bool) -> Self {
        self.create_ata = create_ata;
        self
    }

    pub fn with_recent_blockhash(mut self, recent_blockhash: Hash) -> Self {
        self.recent_blockhash = recent_blockhash;
        self
    }

    pub fn with_max_timeout_seconds(mut self, max_timeout_seconds: NonZeroU64) -> Self {
        self.max_timeout_seconds = max_timeout_seconds;
        self
    }

    pub fn network(&self) -> SolanaNetwork {
        self.network
    }

    /// Compute budget, then the CreateATA if enabled, then the transfer, then the memo if enabled.
    pub fn instructions(&self, sender: &Pubkey) -> Result<Vec<Instruction>, ExactPaymentBuildError> {
        let mut ixs = Vec::with_capacity(5);
        ixs.push(ComputeBudgetInstruction::set_compute_unit_limit(
            self.compute_unit_limit,
        ));
        ixs.push(ComputeBudgetInstruction::set_compute_unit_price(
            self.compute_unit_price,
        ));
        if let (true, TransferAsset::Token(deployment)) = (self.create_ata, &self.asset) {
            ixs.push(create_ata_instruction(
                sender,
                &self.pay_to,
                deployment.address.pubkey(),
                &deployment.token_program,
            ));
        }
        ixs.push(self.transfer_instruction(sender)?);
        if self.memo {
            ixs.push(random_memo_instruction());
        }
        Ok(ixs)
    }

    fn transfer_instruction(&self, sender: &Pubkey) -> Result<Instruction, ExactPaymentBuildError> {
        match &self.asset {
            TransferAsset::Native => Ok(native_transfer_instruction(
                sender,
                &self.pay_to,
                self.amount,
            )),
            TransferAsset::Token(deployment) => {
                let mint = deployment.address.pubkey();
                let token_program = deployment.token_program;
                let source_ata = associated_token_address(sender, &token_program, mint);
                let destination_ata = associated_token_address(&self.pay_to, &token_program, mint);
                if token_program == spl_token_2022::ID {
                    spl_token_2022::instruction::transfer_checked(
                        &token_program,
                        &source_ata,
                        mint,
                        &destination_ata,
                        sender,
                        &[],
                        self.amount,
                        deployment.decimals,
                    )
                    .map_err(|e| ExactPaymentBuildError::Instruction(format!("{e}")))
                } else {
                    spl_token::instruction::transfer_checked(
                        &token_program,
                        &source_ata,
                        mint,
                        &destination_ata,
                        sender,
                        &[],
                        self.amount,
                        deployment.decimals,
                    )
                    .map_err(|e| ExactPaymentBuildError::Instruction(format!("{e}")))
                }
            }
        }
    }

    /// Compiles and signs the transaction with `signer` only.
    ///
    /// When a fee payer is designated, its slot is left empty for the facilitator.
    pub fn build_transaction<S: Signer + ?Sized>(
        &self,
        signer: &S,
    ) -> Result<TransactionInt, ExactPaymentBuildError> {
        let sender = signer.pubkey();
        let fee_payer = self.fee_payer.unwrap_or(sender);
        let instructions = self.instructions(&sender)?;
        let message =
            MessageV0::try_compile(&fee_payer, &instructions, &[], self.recent_blockhash)
                .map_err(|e| ExactPaymentBuildError::Compile(format!("{e:?}")))?;
        let message = VersionedMessage::V0(message);
        let num_required_signatures = message.header().num_required_signatures as usize;
        let tx = VersionedTransaction {
            signatures: vec![Signature::default(); num_required_signatures],
            message,
        };
        let signed = TransactionInt::new(tx).sign_with_keypair(signer)?;
        Ok(signed)
    }

    /// A complete payment payload carrying the signed transaction.
    pub fn payment_payload<S: Signer + ?Sized>(
        &self,
        signer: &S,
        timestamp: UnixTimestamp,
    ) -> Result<PaymentPayload, ExactPaymentBuildError> {
        let transaction = self.build_transaction(signer)?.as_base64()?;
        let mut payload = serde_json::Map::new();
        payload.insert(
            "transaction".to_string(),
            serde_json::Value::String(transaction),
        );
        Ok(PaymentPayload {
            x402_version: X402Version1::VALUE,
            scheme: Scheme::Exact,
            network: self.network.network_name().to_string(),
            payload,
            timestamp,
        })
    }

    /// The requirements this builder's payments satisfy.
    pub fn requirements(&self) -> PaymentRequirements {
        let extra = self.fee_payer.and_then(|fee_payer| {
            serde_json::to_value(SolanaExactExtra {
                fee_payer: Some(fee_payer.into()),
            })
            .ok()
        });
        PaymentRequirements {
            scheme: Scheme::Exact,
            network: self.network.network_name().to_string(),
            max_amount_required: self.amount.into(),
            asset: self.asset.asset_id(),
            pay_to: self.pay_to.to_string(),
            resource: String::new(),
            description: String::new(),
            mime_type: String::new(),
            max_timeout_seconds: self.max_timeout_seconds,
            output_schema: None,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_keypair::Keypair;

    use crate::networks::usdc_deployment;

    #[test]
    fn test_native_transfer_encoding() {
        let from = Pubkey::new_from_array([1; 32]);
        let to = Pubkey::new_from_array([2; 32]);
        let ix = native_transfer_instruction(&from, &to, 42);
        assert_eq!(ix.program_id, SYSTEM_PROGRAM_PUBKEY);
        assert_eq!(ix.data, [2, 0, 0, 0, 42, 0, 0, 0, 0, 0, 0, 0]);
        assert!(ix.accounts[0].is_signer);
        assert!(!ix.accounts[1].is_signer);
    }

    #[test]
    fn test_memo_is_unique() {
        assert_ne!(random_memo_instruction().data, random_memo_instruction().data);
    }

    #[test]
    fn test_token_transfer_layout() {
        let buyer = Keypair::new();
        let seller = Pubkey::new_from_array([5; 32]);
        let builder = ExactPaymentBuilder::new(
            SolanaNetwork::Devnet,
            seller,
            TransferAsset::Token(usdc_deployment(SolanaNetwork::Devnet)),
            10,
        )
        .with_memo(false);
        let tx = builder.build_transaction(&buyer).unwrap();
        assert_eq!(tx.instruction_count(), 3);
        assert_eq!(tx.instruction(2).unwrap().program_id().unwrap(), spl_token::ID);
        assert_eq!(tx.num_required_signatures(), 1);
        assert_eq!(tx.fee_payer(), Some(&buyer.pubkey()));
    }

    #[test]
    fn test_create_ata_precedes_transfer() {
        let buyer = Keypair::new();
        let seller = Pubkey::new_from_array([5; 32]);
        let usdc = usdc_deployment(SolanaNetwork::Devnet);
        let builder = ExactPaymentBuilder::new(
            SolanaNetwork::Devnet,
            seller,
            TransferAsset::Token(usdc.clone()),
            10,
        )
        .with_memo(false)
        .with_create_ata(true);
        let ixs = builder.instructions(&buyer.pubkey()).unwrap();
        assert_eq!(ixs.len(), 4);
        assert_eq!(ixs[2].program_id, ATA_PROGRAM_PUBKEY);
        assert_eq!(ixs[2].data, [1]);
        assert_eq!(
            ixs[2].accounts[1].pubkey,
            associated_token_address(&seller, &spl_token::ID, usdc.address.pubkey())
        );
        assert_eq!(ixs[2].accounts[2].pubkey, seller);
        assert_eq!(ixs[3].program_id, spl_token::ID);

        let native = ExactPaymentBuilder::new(SolanaNetwork::Devnet, seller, TransferAsset::Native, 10)
            .with_memo(false)
            .with_create_ata(true);
        assert_eq!(native.instructions(&buyer.pubkey()).unwrap().len(), 3);
    }

    #[test]
    fn test_fee_payer_slot_left_empty() {
        let buyer = Keypair::new();
        let facilitator = Pubkey::new_from_array([8; 32]);
        let builder = ExactPaymentBuilder::new(
            SolanaNetwork::Devnet,
            Pubkey::new_from_array([5; 32]),
            TransferAsset::Native,
            10,
        )
        .with_fee_payer(facilitator);
        let tx = builder.build_transaction(&buyer).unwrap();
        assert_eq!(tx.num_required_signatures(), 2);
        assert_eq!(tx.fee_payer(), Some(&facilitator));
        assert_eq!(tx.inner().signatures[0], Signature::default());
        assert_ne!(tx.inner().signatures[1], Signature::default());

        let requirements = builder.requirements();
        let extra = requirements.extra_as::<SolanaExactExtra>().unwrap().unwrap();
        assert_eq!(extra.fee_payer, Some(facilitator.into()));
    }
}
