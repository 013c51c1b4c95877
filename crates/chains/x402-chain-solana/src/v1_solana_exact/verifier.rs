use serde::{Deserialize, Serialize};
use solana_compute_budget_interface::ID as ComputeBudgetInstructionId;
use solana_pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use x402_types::chain::{NetworkClient, TransactionStatus};
use x402_types::proto::PaymentVerificationError;
use x402_types::proto::v1::{PaymentPayload, PaymentRequirements, X402Version1};
use x402_types::scheme::{VerifiedPayment, VerifyContext, X402SchemeVerifier};

use crate::chain::{ATA_PROGRAM_PUBKEY, Address, SolanaNetwork, associated_token_address};
use crate::v1_solana_exact::signature::verify_signatures;
use crate::v1_solana_exact::types::{
    ExactSolanaPayload, InstructionInt, MEMO_PROGRAM_PUBKEY, NATIVE_SOL_ASSET,
    PHANTOM_LIGHTHOUSE_PROGRAM_PUBKEY, SYSTEM_PROGRAM_PUBKEY, SYSTEM_TRANSFER_DISCRIMINANT,
    SolanaExactError, SolanaExactExtra, TransactionInt,
};

/// The single value-moving instruction of an exact payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferInstruction {
    /// SPL Token or Token-2022 `TransferChecked`.
    Token {
        amount: u64,
        source: Pubkey,
        mint: Pubkey,
        destination: Pubkey,
        authority: Pubkey,
        token_program: Pubkey,
    },
    /// System program `Transfer` of lamports.
    Native { lamports: u64, from: Pubkey, to: Pubkey },
}

impl TransferInstruction {
    pub fn amount(&self) -> u64 {
        match self {
            TransferInstruction::Token { amount, .. } => *amount,
            TransferInstruction::Native { lamports, .. } => *lamports,
        }
    }

    /// The party whose funds move; must sign the transaction.
    pub fn sender(&self) -> &Pubkey {
        match self {
            TransferInstruction::Token { authority, .. } => authority,
            TransferInstruction::Native { from, .. } => from,
        }
    }

    /// Accounts that must exist on chain: the debited one, then the credited one.
    pub fn source_and_destination(&self) -> (&Pubkey, &Pubkey) {
        match self {
            TransferInstruction::Token {
                source,
                destination,
                ..
            } => (source, destination),
            TransferInstruction::Native { from, to, .. } => (from, to),
        }
    }
}

/// Associated Token Account program `Create` or `CreateIdempotent`, placed right before
/// a token transfer to open the recipient's account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAtaInstruction {
    pub funding: Pubkey,
    pub ata: Pubkey,
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub token_program: Pubkey,
}

/// The instructions of an exact payment that carry meaning for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInstructions {
    pub create_ata: Option<CreateAtaInstruction>,
    pub transfer: TransferInstruction,
}

/// Configuration for the V1 Solana exact verifier.
///
/// Controls transaction verification behavior, including support for
/// additional instructions from third-party wallets like Phantom.
///
/// By default, the Phantom Lighthouse and SPL Memo programs are allowed, and no
/// network calls are made.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V1SolanaExactConfig {
    /// Upper bound for `SetComputeUnitLimit`.
    /// Default: 400000
    #[serde(default = "config_defaults::default_max_compute_unit_limit")]
    pub max_compute_unit_limit: u32,

    /// Upper bound for `SetComputeUnitPrice`, in micro-lamports.
    /// Default: 1000000
    #[serde(default = "config_defaults::default_max_compute_unit_price")]
    pub max_compute_unit_price: u64,

    /// Allow additional instructions after the transfer.
    /// Default: true (to support Phantom Lighthouse)
    #[serde(default = "config_defaults::default_allow_additional_instructions")]
    pub allow_additional_instructions: bool,

    /// Maximum number of instructions allowed in a transaction
    /// Default: 10
    #[serde(default = "config_defaults::default_max_instruction_count")]
    pub max_instruction_count: usize,

    /// Explicitly allowed program IDs for additional instructions.
    /// Only checked if allow_additional_instructions is true.
    ///
    /// Default: [Phantom Lighthouse program, SPL Memo program]
    ///
    /// SECURITY: If this list is empty and allow_additional_instructions is true,
    /// ALL additional instructions will be rejected.
    #[serde(default = "config_defaults::default_allowed_program_ids")]
    pub allowed_program_ids: Vec<Address>,

    /// Blocked program IDs (always rejected, takes precedence over allowed).
    #[serde(default)]
    pub blocked_program_ids: Vec<Address>,

    /// SECURITY: Require the designated fee payer is NOT present in any instruction's accounts
    /// Default: true - strongly recommended to keep this enabled
    #[serde(default = "config_defaults::default_require_fee_payer_not_in_instructions")]
    pub require_fee_payer_not_in_instructions: bool,

    /// Accept System program transfers of native SOL.
    /// Default: true
    #[serde(default = "config_defaults::default_allow_native_sol")]
    pub allow_native_sol: bool,

    /// Accept a CreateATA instruction that opens the recipient's token account
    /// right before the transfer. The funding account must not be the designated
    /// fee payer while `require_fee_payer_not_in_instructions` is set.
    /// Default: false
    #[serde(default)]
    pub allow_create_ata: bool,

    /// Ask the network client whether source and destination accounts exist.
    /// Default: false
    #[serde(default)]
    pub check_accounts: bool,

    /// Ask the network client whether the transaction has landed successfully.
    /// Default: false
    #[serde(default)]
    pub require_confirmation: bool,
}

mod config_defaults {
    use super::*;

    pub fn default_max_compute_unit_limit() -> u32 {
        400_000
    }

    pub fn default_max_compute_unit_price() -> u64 {
        1_000_000
    }

    pub fn default_allow_additional_instructions() -> bool {
        true
    }

    pub fn default_max_instruction_count() -> usize {
        10
    }

    pub fn default_allowed_program_ids() -> Vec<Address> {
        vec![
            Address::new(PHANTOM_LIGHTHOUSE_PROGRAM_PUBKEY),
            Address::new(MEMO_PROGRAM_PUBKEY),
        ]
    }

    pub fn default_require_fee_payer_not_in_instructions() -> bool {
        true
    }

    pub fn default_allow_native_sol() -> bool {
        true
    }
}

impl Default for V1SolanaExactConfig {
    fn default() -> Self {
        Self {
            max_compute_unit_limit: config_defaults::default_max_compute_unit_limit(),
            max_compute_unit_price: config_defaults::default_max_compute_unit_price(),
            allow_additional_instructions: config_defaults::default_allow_additional_instructions(
            ),
            max_instruction_count: config_defaults::default_max_instruction_count(),
            allowed_program_ids: config_defaults::default_allowed_program_ids(),
            blocked_program_ids: Vec::new(),
            require_fee_payer_not_in_instructions:
                config_defaults::default_require_fee_payer_not_in_instructions(),
            allow_native_sol: config_defaults::default_allow_native_sol(),
            allow_create_ata: false,
            check_accounts: false,
            require_confirmation: false,
        }
    }
}

impl V1SolanaExactConfig {
    /// Check if a program ID is in the blocked list
    pub fn is_blocked(&self, program_id: &Pubkey) -> bool {
        self.blocked_program_ids
            .iter()
            .any(|addr| addr.pubkey() == program_id)
    }

    /// Check if a program ID is in the allowed list.
    ///
    /// SECURITY: If the allowed list is empty, NO programs are allowed.
    pub fn is_allowed(&self, program_id: &Pubkey) -> bool {
        self.allowed_program_ids
            .iter()
            .any(|addr| addr.pubkey() == program_id)
    }

    /// Whether any check needs the network client.
    pub fn needs_network(&self) -> bool {
        self.check_accounts || self.require_confirmation
    }
}

/// Programs that move value or set fees; they may only appear in their fixed positions.
fn is_reserved_program(program_id: &Pubkey) -> bool {
    *program_id == spl_token::ID
        || *program_id == spl_token_2022::ID
        || *program_id == SYSTEM_PROGRAM_PUBKEY
        || *program_id == ComputeBudgetInstructionId
        || *program_id == ATA_PROGRAM_PUBKEY
}

pub fn verify_compute_limit_instruction(
    instruction: &InstructionInt,
    max_compute_unit_limit: u32,
) -> Result<u32, SolanaExactError> {
    let data = instruction.data_slice();
    // 1 byte discriminator + 4 bytes u32
    if data.first().cloned().unwrap_or(0) != 2 || data.len() != 5 {
        return Err(SolanaExactError::InvalidComputeLimitInstruction);
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[1..5]);
    let compute_units = u32::from_le_bytes(buf);
    if compute_units > max_compute_unit_limit {
        return Err(SolanaExactError::MaxComputeUnitLimitExceeded);
    }
    Ok(compute_units)
}

pub fn verify_compute_price_instruction(
    instruction: &InstructionInt,
    max_compute_unit_price: u64,
) -> Result<u64, SolanaExactError> {
    let data = instruction.data_slice();
    if data.first().cloned().unwrap_or(0) != 3 || data.len() != 9 {
        return Err(SolanaExactError::InvalidComputePriceInstruction);
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[1..]);
    let microlamports = u64::from_le_bytes(buf);
    if microlamports > max_compute_unit_price {
        return Err(SolanaExactError::MaxComputeUnitPriceExceeded);
    }
    Ok(microlamports)
}

/// Decodes the transfer instruction, which must be Token, Token-2022 or System.
pub fn parse_transfer_instruction(
    instruction: &InstructionInt,
    config: &V1SolanaExactConfig,
) -> Result<TransferInstruction, SolanaExactError> {
    instruction.assert_not_empty()?;
    let program_id = instruction.program_id()?;
    let amount = if program_id == spl_token::ID {
        let token_instruction =
            spl_token::instruction::TokenInstruction::unpack(instruction.data_slice())
                .map_err(|_| SolanaExactError::InvalidTransferInstruction)?;
        match token_instruction {
            spl_token::instruction::TokenInstruction::TransferChecked {
                amount,
                decimals: _,
            } => amount,
            _ => return Err(SolanaExactError::InvalidTransferInstruction),
        }
    } else if program_id == spl_token_2022::ID {
        let token_instruction =
            spl_token_2022::instruction::TokenInstruction::unpack(instruction.data_slice())
                .map_err(|_| SolanaExactError::InvalidTransferInstruction)?;
        match token_instruction {
            spl_token_2022::instruction::TokenInstruction::TransferChecked {
                amount,
                decimals: _,
            } => amount,
            _ => return Err(SolanaExactError::InvalidTransferInstruction),
        }
    } else if program_id == SYSTEM_PROGRAM_PUBKEY {
        if !config.allow_native_sol {
            return Err(SolanaExactError::NativeTransferNotAllowed);
        }
        return parse_system_transfer(instruction);
    } else if program_id == ATA_PROGRAM_PUBKEY {
        return Err(SolanaExactError::CreateATANotSupported);
    } else {
        return Err(SolanaExactError::InvalidTransferInstruction);
    };

    Ok(TransferInstruction::Token {
        amount,
        source: instruction.account(0)?,
        mint: instruction.account(1)?,
        destination: instruction.account(2)?,
        authority: instruction.account(3)?,
        token_program: program_id,
    })
}

fn parse_system_transfer(
    instruction: &InstructionInt,
) -> Result<TransferInstruction, SolanaExactError> {
    // u32 LE discriminant + u64 LE lamports
    let data = instruction.data_slice();
    if data.len() != 12 {
        return Err(SolanaExactError::InvalidTransferInstruction);
    }
    let mut discriminant = [0u8; 4];
    discriminant.copy_from_slice(&data[..4]);
    if u32::from_le_bytes(discriminant) != SYSTEM_TRANSFER_DISCRIMINANT {
        return Err(SolanaExactError::InvalidTransferInstruction);
    }
    let mut lamports = [0u8; 8];
    lamports.copy_from_slice(&data[4..]);
    Ok(TransferInstruction::Native {
        lamports: u64::from_le_bytes(lamports),
        from: instruction.account(0)?,
        to: instruction.account(1)?,
    })
}

/// Decodes an Associated Token Account program `Create` / `CreateIdempotent`.
///
/// Accounts: `[funding, ata, owner, mint, system_program, token_program]`.
pub fn parse_create_ata_instruction(
    instruction: &InstructionInt,
) -> Result<CreateAtaInstruction, SolanaExactError> {
    if instruction.program_id()? != ATA_PROGRAM_PUBKEY {
        return Err(SolanaExactError::InvalidCreateATAInstruction);
    }
    // Empty data is the legacy encoding of Create
    if !matches!(instruction.data_slice(), [] | [0] | [1]) || instruction.account_count() < 6 {
        return Err(SolanaExactError::InvalidCreateATAInstruction);
    }
    let create = CreateAtaInstruction {
        funding: instruction.account(0)?,
        ata: instruction.account(1)?,
        owner: instruction.account(2)?,
        mint: instruction.account(3)?,
        token_program: instruction.account(5)?,
    };
    if instruction.account(4)? != SYSTEM_PROGRAM_PUBKEY
        || (create.token_program != spl_token::ID && create.token_program != spl_token_2022::ID)
        || create.ata != associated_token_address(&create.owner, &create.token_program, &create.mint)
    {
        return Err(SolanaExactError::InvalidCreateATAInstruction);
    }
    Ok(create)
}

/// Validates the instruction structure of the transaction and returns the payment.
///
/// Required structure:
/// - Leading compute budget instructions: at most one `SetComputeUnitLimit` and
///   at most one `SetComputeUnitPrice`, in any order
/// - Optionally, if `allow_create_ata`, a CreateATA for the transfer destination
/// - Then exactly one transfer: `TransferChecked` (Token or Token-2022) or System `Transfer`
/// - Then additional instructions, only if allowed and whitelisted
pub fn validate_instructions(
    transaction: &TransactionInt,
    config: &V1SolanaExactConfig,
) -> Result<PaymentInstructions, SolanaExactError> {
    let count = transaction.instruction_count();
    if count > config.max_instruction_count {
        return Err(SolanaExactError::InstructionCountExceedsMax(
            config.max_instruction_count,
        ));
    }

    let mut index = 0;
    let mut limit_seen = false;
    let mut price_seen = false;
    while index < count {
        let instruction = transaction.instruction(index)?;
        if instruction.program_id()? != ComputeBudgetInstructionId {
            break;
        }
        match instruction.data_slice().first() {
            Some(2) => {
                if limit_seen {
                    return Err(SolanaExactError::DuplicateComputeBudgetInstruction(index));
                }
                limit_seen = true;
                let _compute_units =
                    verify_compute_limit_instruction(&instruction, config.max_compute_unit_limit)?;
                #[cfg(feature = "telemetry")]
                tracing::debug!(compute_units = _compute_units, "Verified compute unit limit");
            }
            Some(3) => {
                if price_seen {
                    return Err(SolanaExactError::DuplicateComputeBudgetInstruction(index));
                }
                price_seen = true;
                verify_compute_price_instruction(&instruction, config.max_compute_unit_price)?;
            }
            _ => return Err(SolanaExactError::UnsupportedComputeBudgetInstruction(index)),
        }
        index += 1;
    }

    if index >= count {
        return Err(SolanaExactError::MissingTransferInstruction);
    }
    let mut create_ata = None;
    let instruction = transaction.instruction(index)?;
    if config.allow_create_ata && instruction.program_id()? == ATA_PROGRAM_PUBKEY {
        create_ata = Some(parse_create_ata_instruction(&instruction)?);
        index += 1;
        if index >= count {
            return Err(SolanaExactError::MissingTransferInstruction);
        }
    }
    let transfer = parse_transfer_instruction(&transaction.instruction(index)?, config)?;
    if let Some(create) = &create_ata {
        let creates_destination = matches!(
            &transfer,
            TransferInstruction::Token { destination, mint, token_program, .. }
                if *destination == create.ata
                    && *mint == create.mint
                    && *token_program == create.token_program
        );
        if !creates_destination {
            return Err(SolanaExactError::CreateATADestinationMismatch);
        }
    }

    let additional = (index + 1)..count;
    if !additional.is_empty() && !config.allow_additional_instructions {
        return Err(SolanaExactError::AdditionalInstructionsNotAllowed);
    }
    for i in additional {
        let program_id = transaction.instruction(i)?.program_id()?;
        // Check blocked list first (takes precedence)
        if config.is_blocked(&program_id) {
            return Err(SolanaExactError::BlockedProgram(program_id));
        }
        if is_reserved_program(&program_id) || !config.is_allowed(&program_id) {
            return Err(SolanaExactError::ProgramNotAllowed(program_id));
        }
    }

    Ok(PaymentInstructions {
        create_ata,
        transfer,
    })
}

/// Checks the designated fee payer from `extra` against the transaction.
///
/// Returns the fee payer when one is designated.
pub fn verify_fee_payer(
    transaction: &TransactionInt,
    transfer: &TransferInstruction,
    extra: Option<SolanaExactExtra>,
    config: &V1SolanaExactConfig,
) -> Result<Option<Pubkey>, SolanaExactError> {
    let Some(fee_payer) = extra.and_then(|e| e.fee_payer).map(Pubkey::from) else {
        return Ok(None);
    };
    let actual = transaction
        .fee_payer()
        .cloned()
        .ok_or(SolanaExactError::NoAccountAtIndex(0))?;
    if actual != fee_payer {
        return Err(SolanaExactError::FeePayerMismatch {
            expected: fee_payer,
            actual,
        });
    }
    // Verify that the fee payer is not transferring funds
    if *transfer.sender() == fee_payer {
        return Err(SolanaExactError::FeePayerTransferringFunds);
    }
    if config.require_fee_payer_not_in_instructions
        && transaction.instructions_reference(&fee_payer)?
    {
        return Err(SolanaExactError::FeePayerIncludedInInstructionAccounts);
    }
    Ok(Some(fee_payer))
}

/// Decodes the transaction and checks everything that needs no signature work.
pub fn verify_transaction_structure(
    payload: &PaymentPayload,
    requirements: &PaymentRequirements,
    config: &V1SolanaExactConfig,
) -> Result<(TransactionInt, PaymentInstructions, Option<Pubkey>), PaymentVerificationError> {
    let exact_payload: ExactSolanaPayload = payload
        .payload_as()
        .map_err(|e| SolanaExactError::PayloadDecoding(e.to_string()))?;
    let transaction = TransactionInt::from_base64(&exact_payload.transaction)?;
    transaction.assert_signature_layout()?;
    let instructions = validate_instructions(&transaction, config)?;

    let extra = requirements.extra_as::<SolanaExactExtra>()?;
    let fee_payer = verify_fee_payer(&transaction, &instructions.transfer, extra, config)?;

    let sender = instructions.transfer.sender();
    if !transaction.required_signers().contains(sender) {
        return Err(SolanaExactError::SenderNotSigner(*sender).into());
    }
    Ok((transaction, instructions, fee_payer))
}

/// Checks recipient, asset and amount of a decoded payment against the requirements.
pub fn verify_transfer_terms(
    instructions: &PaymentInstructions,
    requirements: &PaymentRequirements,
) -> Result<(), PaymentVerificationError> {
    let transfer = &instructions.transfer;
    // A pay_to that is not a pubkey can never match
    let pay_to = Pubkey::from_str(&requirements.pay_to)
        .map_err(|_| PaymentVerificationError::RecipientMismatch)?;
    if let Some(create) = &instructions.create_ata {
        if create.owner != pay_to {
            return Err(PaymentVerificationError::RecipientMismatch);
        }
        let mint = create.mint.to_string();
        if mint != requirements.asset {
            return Err(PaymentVerificationError::AssetMismatch {
                expected: requirements.asset.clone(),
                actual: mint,
            });
        }
    }
    match transfer {
        TransferInstruction::Token {
            mint,
            destination,
            token_program,
            ..
        } => {
            let ata = associated_token_address(&pay_to, token_program, mint);
            if *destination != ata {
                return Err(PaymentVerificationError::RecipientMismatch);
            }
            let mint = mint.to_string();
            if mint != requirements.asset {
                return Err(PaymentVerificationError::AssetMismatch {
                    expected: requirements.asset.clone(),
                    actual: mint,
                });
            }
        }
        TransferInstruction::Native { to, .. } => {
            if *to != pay_to {
                return Err(PaymentVerificationError::RecipientMismatch);
            }
            if requirements.asset != NATIVE_SOL_ASSET {
                return Err(PaymentVerificationError::AssetMismatch {
                    expected: requirements.asset.clone(),
                    actual: NATIVE_SOL_ASSET.to_string(),
                });
            }
        }
    }
    let paid = transfer.amount();
    let required = requirements.max_amount_required.inner();
    if paid < required {
        return Err(PaymentVerificationError::InsufficientAmount { paid, required });
    }
    Ok(())
}

pub struct V1SolanaExactVerifier {
    network: SolanaNetwork,
    config: V1SolanaExactConfig,
    network_client: Option<Arc<dyn NetworkClient>>,
}

impl V1SolanaExactVerifier {
    pub fn new(
        network: SolanaNetwork,
        config: V1SolanaExactConfig,
        network_client: Option<Arc<dyn NetworkClient>>,
    ) -> Self {
        Self {
            network,
            config,
            network_client,
        }
    }

    pub fn network(&self) -> SolanaNetwork {
        self.network
    }

    pub fn config(&self) -> &V1SolanaExactConfig {
        &self.config
    }

    async fn verify_on_chain(
        &self,
        network: &str,
        transaction: &TransactionInt,
        instructions: &PaymentInstructions,
    ) -> Result<(), PaymentVerificationError> {
        if !self.config.needs_network() {
            return Ok(());
        }
        let client = self.network_client.as_ref().ok_or_else(|| {
            PaymentVerificationError::NetworkUnavailable(format!(
                "no network client configured for {network}"
            ))
        })?;

        let transfer = &instructions.transfer;
        if self.config.check_accounts {
            let (source, destination) = transfer.source_and_destination();
            // A destination opened by the transaction itself does not exist yet
            let mut addresses = vec![source.to_string()];
            if instructions.create_ata.is_none() {
                addresses.push(destination.to_string());
            }
            let exists = client.accounts_exist(network, &addresses).await?;
            if !exists.first().copied().unwrap_or(false) {
                return Err(SolanaExactError::MissingSenderAccount.into());
            }
            if addresses.len() > 1 && !exists.get(1).copied().unwrap_or(false) {
                return Err(PaymentVerificationError::RecipientMismatch);
            }
        }

        if self.config.require_confirmation {
            // Slot 0 may be an unsigned fee payer placeholder; the sender's slot is always signed
            let sender = transfer.sender();
            let signature = transaction
                .signature_of(sender)
                .ok_or(SolanaExactError::SenderNotSigner(*sender))?
                .to_string();
            match client.transaction_status(network, &signature).await? {
                TransactionStatus::Confirmed => {}
                TransactionStatus::NotFound => {
                    return Err(PaymentVerificationError::TransactionNotFound(format!(
                        "transaction {signature} not found on {network}"
                    )));
                }
                TransactionStatus::Failed(reason) => {
                    return Err(PaymentVerificationError::TransactionNotFound(format!(
                        "transaction {signature} failed on {network}: {reason}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl X402SchemeVerifier for V1SolanaExactVerifier {
    async fn verify(
        &self,
        payload: &PaymentPayload,
        requirements: &PaymentRequirements,
        context: &VerifyContext,
    ) -> Result<VerifiedPayment, PaymentVerificationError> {
        if X402Version1 != payload.x402_version {
            return Err(PaymentVerificationError::UnsupportedVersion(
                payload.x402_version,
            ));
        }
        if payload.network != requirements.network {
            return Err(PaymentVerificationError::NetworkMismatch {
                payload: payload.network.clone(),
                required: requirements.network.clone(),
            });
        }

        let (transaction, instructions, fee_payer) =
            verify_transaction_structure(payload, requirements, &self.config)?;
        verify_signatures(&transaction, fee_payer.as_ref())?;
        verify_transfer_terms(&instructions, requirements)?;
        payload
            .timestamp
            .check_window(context.now, requirements.max_timeout_seconds.get())?;
        self.verify_on_chain(&requirements.network, &transaction, &instructions)
            .await?;

        let transfer = &instructions.transfer;
        let payer = transfer.sender().to_string();
        #[cfg(feature = "telemetry")]
        tracing::debug!(network = %self.network, payer = %payer, amount = transfer.amount(), "Verified exact payment");
        Ok(VerifiedPayment { payer })
    }
}
