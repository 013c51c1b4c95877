//! Ed25519 authenticity checks over the transaction message.

use ed25519_dalek::VerifyingKey;
use solana_pubkey::Pubkey;
use solana_signature::Signature;

use crate::v1_solana_exact::types::{SolanaExactError, TransactionInt};

/// Verifies every required signer slot against the serialized message.
///
/// `pending_fee_payer` names a fee payer whose slot 0 may still be empty, awaiting
/// the facilitator's co-signature. Every slot is checked regardless of earlier
/// failures so the outcome does not depend on which slot is bad.
pub fn verify_signatures(
    transaction: &TransactionInt,
    pending_fee_payer: Option<&Pubkey>,
) -> Result<(), SolanaExactError> {
    let message = transaction.inner().message.serialize();
    let signers = transaction.required_signers();
    let signatures = &transaction.inner().signatures;
    if signers.len() != signatures.len() {
        return Err(SolanaExactError::InvalidSignature);
    }

    let mut valid = true;
    for (slot, (signer, signature)) in signers.iter().zip(signatures.iter()).enumerate() {
        let pending = slot == 0
            && pending_fee_payer == Some(signer)
            && *signature == Signature::default();
        valid &= pending | verify_signature(signer, signature, &message);
    }

    if valid {
        Ok(())
    } else {
        Err(SolanaExactError::InvalidSignature)
    }
}

fn verify_signature(signer: &Pubkey, signature: &Signature, message: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(&signer.to_bytes()) else {
        return false;
    };
    let Ok(signature) = ed25519_dalek::Signature::from_slice(signature.as_ref()) else {
        return false;
    };
    key.verify_strict(message, &signature).is_ok()
}
