//! Type definitions for the V1 Solana "exact" payment scheme.
//!
//! The payload of an exact Solana payment is a single base64 field holding a
//! bincode-serialized [`VersionedTransaction`], signed by the buyer.

use serde::{Deserialize, Serialize};
use solana_message::compiled_instruction::CompiledInstruction;
use solana_pubkey::{Pubkey, pubkey};
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use x402_types::proto::PaymentVerificationError;
use x402_types::util::Base64Bytes;

use crate::chain::Address;

/// SPL Memo program ID - used to add transaction uniqueness and prevent duplicate transaction attacks
/// See: https://github.com/coinbase/x402/issues/828
pub const MEMO_PROGRAM_PUBKEY: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// Phantom Lighthouse program ID - security program injected by Phantom wallet on mainnet
/// See: https://github.com/coinbase/x402/issues/828
pub const PHANTOM_LIGHTHOUSE_PROGRAM_PUBKEY: Pubkey =
    pubkey!("L2TExMFKdjpN9kozasaurPirfHy9P8sbXoAN1qA3S95");

pub const SYSTEM_PROGRAM_PUBKEY: Pubkey = pubkey!("11111111111111111111111111111111");

/// Asset identifier used in requirements for native SOL transfers.
pub const NATIVE_SOL_ASSET: &str = "SOL";

/// Maximum size of a serialized Solana transaction (one network packet).
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// `SystemInstruction::Transfer` discriminant in the bincode encoding (u32 LE).
pub const SYSTEM_TRANSFER_DISCRIMINANT: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactSolanaPayload {
    pub transaction: String,
}

/// Scheme-specific `extra` in payment requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SolanaExactExtra {
    /// Facilitator that co-signs and pays fees; must be the transaction fee payer.
    #[serde(default, alias = "fee_payer", skip_serializing_if = "Option::is_none")]
    pub fee_payer: Option<Address>,
}

pub struct InstructionInt {
    index: usize,
    instruction: CompiledInstruction,
    account_keys: Vec<Pubkey>,
}

pub struct TransactionInt {
    inner: VersionedTransaction,
}

impl TransactionInt {
    pub fn new(transaction: VersionedTransaction) -> Self {
        Self { inner: transaction }
    }

    /// Decodes base64 bincode, enforcing the packet size limit before deserializing.
    pub fn from_base64(transaction: &str) -> Result<Self, SolanaExactError> {
        let bytes = Base64Bytes::from(transaction)
            .decode_bounded(MAX_TRANSACTION_SIZE)
            .map_err(|e| SolanaExactError::TransactionDecoding(e.to_string()))?;
        let transaction = bincode::deserialize::<VersionedTransaction>(bytes.as_slice())
            .map_err(|e| SolanaExactError::TransactionDecoding(e.to_string()))?;
        Ok(Self::new(transaction))
    }

    pub fn inner(&self) -> &VersionedTransaction {
        &self.inner
    }

    pub fn into_inner(self) -> VersionedTransaction {
        self.inner
    }

    pub fn num_required_signatures(&self) -> usize {
        self.inner.message.header().num_required_signatures as usize
    }

    pub fn static_account_keys(&self) -> &[Pubkey] {
        self.inner.message.static_account_keys()
    }

    /// Keys expected to sign, in signature slot order.
    pub fn required_signers(&self) -> &[Pubkey] {
        let keys = self.static_account_keys();
        &keys[..self.num_required_signatures().min(keys.len())]
    }

    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.static_account_keys().first()
    }

    /// The signature in the slot of `signer`, if it is a required signer.
    pub fn signature_of(&self, signer: &Pubkey) -> Option<&Signature> {
        let slot = self.required_signers().iter().position(|key| key == signer)?;
        self.inner.signatures.get(slot)
    }

    pub fn instruction_count(&self) -> usize {
        self.inner.message.instructions().len()
    }

    pub fn instruction(&self, index: usize) -> Result<InstructionInt, SolanaExactError> {
        let instruction = self
            .inner
            .message
            .instructions()
            .get(index)
            .cloned()
            .ok_or(SolanaExactError::NoInstructionAtIndex(index))?;
        let account_keys = self.inner.message.static_account_keys().to_vec();

        Ok(InstructionInt {
            index,
            instruction,
            account_keys,
        })
    }

    /// Checks the signature vector against the message header.
    pub fn assert_signature_layout(&self) -> Result<(), SolanaExactError> {
        let required = self.num_required_signatures();
        if required == 0 {
            return Err(SolanaExactError::NoRequiredSigners);
        }
        if self.inner.signatures.len() != required {
            return Err(SolanaExactError::SignatureCountMismatch {
                signatures: self.inner.signatures.len(),
                required,
            });
        }
        if required > self.static_account_keys().len() {
            return Err(SolanaExactError::SignatureCountMismatch {
                signatures: required,
                required: self.static_account_keys().len(),
            });
        }
        Ok(())
    }

    /// Whether any instruction references `pubkey` among its accounts.
    pub fn instructions_reference(&self, pubkey: &Pubkey) -> Result<bool, SolanaExactError> {
        for index in 0..self.instruction_count() {
            let instruction = self.instruction(index)?;
            for position in 0..instruction.account_count() {
                if instruction.account(position)? == *pubkey {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Sign the transaction with any Signer, placing the signature in the signer's slot.
    pub fn sign_with_keypair<S: Signer + ?Sized>(
        self,
        signer: &S,
    ) -> Result<Self, TransactionSignError> {
        let mut tx = self.inner;
        let msg_bytes = tx.message.serialize();
        let signature = signer
            .try_sign_message(msg_bytes.as_slice())
            .map_err(|e| TransactionSignError(format!("{e}")))?;

        let num_required = tx.message.header().num_required_signatures as usize;
        let static_keys = tx.message.static_account_keys();
        let pos = static_keys
            .iter()
            .take(num_required)
            .position(|k| *k == signer.pubkey())
            .ok_or(TransactionSignError(
                "Signer not found in required signers".to_string(),
            ))?;

        if tx.signatures.len() < num_required {
            tx.signatures.resize(num_required, Signature::default());
        }
        tx.signatures[pos] = signature;
        Ok(Self { inner: tx })
    }

    pub fn as_base64(&self) -> Result<String, TransactionToB64Error> {
        let bytes =
            bincode::serialize(&self.inner).map_err(|e| TransactionToB64Error(format!("{e}")))?;
        Ok(Base64Bytes::encode(bytes).to_string())
    }
}

impl InstructionInt {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn has_data(&self) -> bool {
        !self.instruction.data.is_empty()
    }

    pub fn has_accounts(&self) -> bool {
        !self.instruction.accounts.is_empty()
    }

    pub fn account_count(&self) -> usize {
        self.instruction.accounts.len()
    }

    pub fn data_slice(&self) -> &[u8] {
        self.instruction.data.as_slice()
    }

    pub fn assert_not_empty(&self) -> Result<(), SolanaExactError> {
        if !self.has_data() || !self.has_accounts() {
            return Err(SolanaExactError::EmptyInstructionAtIndex(self.index));
        }
        Ok(())
    }

    /// Program invoked by this instruction; the index is checked against the static keys.
    pub fn program_id(&self) -> Result<Pubkey, SolanaExactError> {
        let program_index = self.instruction.program_id_index;
        self.account_keys
            .get(program_index as usize)
            .cloned()
            .ok_or(SolanaExactError::NoProgramAtIndex(program_index))
    }

    pub fn account(&self, index: usize) -> Result<Pubkey, SolanaExactError> {
        let account_index = self
            .instruction
            .accounts
            .get(index)
            .cloned()
            .ok_or(SolanaExactError::NoAccountAtIndex(index))?;
        let pubkey = self
            .account_keys
            .get(account_index as usize)
            .cloned()
            .ok_or(SolanaExactError::NoAccountAtIndex(index))?;
        Ok(pubkey)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Can not encode transaction to base64: {0}")]
pub struct TransactionToB64Error(String);

#[derive(Debug, thiserror::Error)]
#[error("Can not sign transaction: {0}")]
pub struct TransactionSignError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum SolanaExactError {
    #[error("Can not decode payload: {0}")]
    PayloadDecoding(String),
    #[error("Can not decode transaction: {0}")]
    TransactionDecoding(String),
    #[error("Transaction declares no required signers")]
    NoRequiredSigners,
    #[error("Transaction carries {signatures} signatures, header requires {required}")]
    SignatureCountMismatch { signatures: usize, required: usize },
    #[error("Compute unit limit exceeds maximum")]
    MaxComputeUnitLimitExceeded,
    #[error("Compute unit price exceeds maximum")]
    MaxComputeUnitPriceExceeded,
    #[error("Duplicate compute budget instruction at index {0}")]
    DuplicateComputeBudgetInstruction(usize),
    #[error("Unsupported compute budget instruction at index {0}")]
    UnsupportedComputeBudgetInstruction(usize),
    #[error("Transaction contains no transfer instruction")]
    MissingTransferInstruction,
    #[error("Additional instructions not allowed")]
    AdditionalInstructionsNotAllowed,
    #[error("Instruction count exceeds maximum: {0}")]
    InstructionCountExceedsMax(usize),
    #[error("Blocked program in transaction: {0}")]
    BlockedProgram(Pubkey),
    #[error("Program not in allowed list: {0}")]
    ProgramNotAllowed(Pubkey),
    #[error("CreateATA instruction not supported - destination ATA must exist")]
    CreateATANotSupported,
    #[error("Invalid CreateATA instruction")]
    InvalidCreateATAInstruction,
    #[error("CreateATA instruction does not create the transfer destination")]
    CreateATADestinationMismatch,
    #[error("Native SOL transfers are not accepted")]
    NativeTransferNotAllowed,
    #[error("Transaction fee payer {actual} is not the designated fee payer {expected}")]
    FeePayerMismatch { expected: Pubkey, actual: Pubkey },
    #[error("Fee payer included in instruction accounts")]
    FeePayerIncludedInInstructionAccounts,
    #[error("Fee payer found transferring funds")]
    FeePayerTransferringFunds,
    #[error("Transfer sender {0} is not a required signer")]
    SenderNotSigner(Pubkey),
    #[error("Instruction at index {0} not found")]
    NoInstructionAtIndex(usize),
    #[error("No program at account index {0}")]
    NoProgramAtIndex(u8),
    #[error("No account at index {0}")]
    NoAccountAtIndex(usize),
    #[error("Empty instruction at index {0}")]
    EmptyInstructionAtIndex(usize),
    #[error("Invalid compute limit instruction")]
    InvalidComputeLimitInstruction,
    #[error("Invalid compute price instruction")]
    InvalidComputePriceInstruction,
    #[error("Invalid transfer instruction")]
    InvalidTransferInstruction,
    #[error("Missing sender account in transaction")]
    MissingSenderAccount,
    #[error("Transaction signature verification failed")]
    InvalidSignature,
}

impl From<SolanaExactError> for PaymentVerificationError {
    fn from(e: SolanaExactError) -> Self {
        match e {
            SolanaExactError::InvalidSignature => {
                PaymentVerificationError::InvalidSignature(e.to_string())
            }
            SolanaExactError::PayloadDecoding(_)
            | SolanaExactError::TransactionDecoding(_)
            | SolanaExactError::NoRequiredSigners
            | SolanaExactError::SignatureCountMismatch { .. }
            | SolanaExactError::MaxComputeUnitLimitExceeded
            | SolanaExactError::MaxComputeUnitPriceExceeded
            | SolanaExactError::DuplicateComputeBudgetInstruction(_)
            | SolanaExactError::UnsupportedComputeBudgetInstruction(_)
            | SolanaExactError::MissingTransferInstruction
            | SolanaExactError::AdditionalInstructionsNotAllowed
            | SolanaExactError::InstructionCountExceedsMax(_)
            | SolanaExactError::BlockedProgram(_)
            | SolanaExactError::ProgramNotAllowed(_)
            | SolanaExactError::CreateATANotSupported
            | SolanaExactError::InvalidCreateATAInstruction
            | SolanaExactError::CreateATADestinationMismatch
            | SolanaExactError::NativeTransferNotAllowed
            | SolanaExactError::FeePayerMismatch { .. }
            | SolanaExactError::FeePayerIncludedInInstructionAccounts
            | SolanaExactError::FeePayerTransferringFunds
            | SolanaExactError::SenderNotSigner(_)
            | SolanaExactError::NoInstructionAtIndex(_)
            | SolanaExactError::NoProgramAtIndex(_)
            | SolanaExactError::NoAccountAtIndex(_)
            | SolanaExactError::EmptyInstructionAtIndex(_)
            | SolanaExactError::InvalidComputeLimitInstruction
            | SolanaExactError::InvalidComputePriceInstruction
            | SolanaExactError::InvalidTransferInstruction
            | SolanaExactError::MissingSenderAccount => {
                PaymentVerificationError::InvalidPayloadStructure(e.to_string())
            }
        }
    }
}
