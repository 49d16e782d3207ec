//! Instrument Builder — validate, encode, hash, sign
//!
//! Turns caller-supplied terms into fully signed, verifier-ready loan
//! offerings and exchange orders. Terms are validated before anything is
//! hashed or signed; a signature is only attached after it has been
//! recovered back to the signer's address.

use alloy_primitives::{Address, B256, U256};
use margin_types::errors::{InstrumentError, InstrumentKind};
use margin_types::loan::{LoanOffering, Rates};
use margin_types::order::ExchangeOrder;
use margin_types::signature::EcSignature;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::digest::{exchange_order_hash, loan_offering_hash, HashScheme};
use crate::signing::{recover, DigestSigner, DEFAULT_V_OFFSET};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the instrument builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Margin contract instance whose address prefixes loan offering hashes.
    pub margin_contract: Address,
    /// Exchange contract instance stamped into every built order.
    pub exchange_contract: Address,
    /// How instrument hashes become signing digests.
    pub hash_scheme: HashScheme,
    /// `v` offset expected by the verifier.
    pub v_offset: u8,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            margin_contract: Address::ZERO,
            exchange_contract: Address::ZERO,
            hash_scheme: HashScheme::default(),
            v_offset: DEFAULT_V_OFFSET,
        }
    }
}

impl BuilderConfig {
    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// Caller-supplied terms for a loan offering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOfferingTerms {
    pub underlying_token: Address,
    pub base_token: Address,
    pub lender: Address,
    pub taker: Address,
    pub fee_recipient: Address,
    pub rates: Rates,
    pub expiration_timestamp: U256,
    pub lockout_time: U256,
    pub call_time_limit: U256,
    /// Random when absent
    #[serde(default)]
    pub salt: Option<U256>,
}

/// Caller-supplied terms for an exchange order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOrderTerms {
    pub maker: Address,
    pub taker: Address,
    pub maker_token: Address,
    pub taker_token: Address,
    pub fee_recipient: Address,
    pub maker_token_amount: U256,
    pub taker_token_amount: U256,
    pub maker_fee: U256,
    pub taker_fee: U256,
    pub expiration_timestamp_sec: U256,
    /// Random when absent
    #[serde(default)]
    pub salt: Option<U256>,
}

fn resolve_salt(salt: Option<U256>) -> U256 {
    salt.unwrap_or_else(|| U256::from_be_bytes(rand::random::<[u8; 32]>()))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds and verifies signed instruments.
///
/// Holds only immutable configuration, so one builder can serve any number
/// of concurrent builds.
#[derive(Debug, Clone)]
pub struct InstrumentBuilder {
    config: BuilderConfig,
}

impl InstrumentBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        info!(
            margin_contract = %config.margin_contract,
            exchange_contract = %config.exchange_contract,
            hash_scheme = ?config.hash_scheme,
            v_offset = config.v_offset,
            "InstrumentBuilder initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(BuilderConfig::default())
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Loan offering hash under this builder's margin contract.
    pub fn loan_offering_hash(&self, offering: &LoanOffering) -> B256 {
        loan_offering_hash(&self.config.margin_contract, offering)
    }

    /// Build and sign a loan offering.
    ///
    /// `signer` must be the lender named in `terms`.
    pub async fn build_loan_offering(
        &self,
        terms: LoanOfferingTerms,
        signer: &dyn DigestSigner,
    ) -> Result<LoanOffering, InstrumentError> {
        let mut offering = LoanOffering {
            underlying_token: terms.underlying_token,
            base_token: terms.base_token,
            lender: terms.lender,
            taker: terms.taker,
            fee_recipient: terms.fee_recipient,
            rates: terms.rates,
            expiration_timestamp: terms.expiration_timestamp,
            lockout_time: terms.lockout_time,
            call_time_limit: terms.call_time_limit,
            salt: resolve_salt(terms.salt),
            signature: None,
        };

        if let Err(err) = offering.validate() {
            warn!(lender = %offering.lender, error = %err, "Rejecting loan offering terms");
            return Err(err);
        }
        check_signer(LoanOffering::KIND, &offering.lender, signer)?;

        let hash = self.loan_offering_hash(&offering);
        debug!(lender = %offering.lender, salt = %offering.salt, hash = %hash, "Loan offering hashed");

        let signature = self.sign_checked(LoanOffering::KIND, &hash, signer).await?;
        offering.signature = Some(signature);

        info!(lender = %offering.lender, hash = %hash, v = signature.v, "Loan offering signed");
        Ok(offering)
    }

    /// Build and sign an exchange order.
    ///
    /// `signer` must be the maker named in `terms`.
    pub async fn build_exchange_order(
        &self,
        terms: ExchangeOrderTerms,
        signer: &dyn DigestSigner,
    ) -> Result<ExchangeOrder, InstrumentError> {
        let mut order = ExchangeOrder {
            exchange_contract: self.config.exchange_contract,
            maker: terms.maker,
            taker: terms.taker,
            maker_token: terms.maker_token,
            taker_token: terms.taker_token,
            fee_recipient: terms.fee_recipient,
            maker_token_amount: terms.maker_token_amount,
            taker_token_amount: terms.taker_token_amount,
            maker_fee: terms.maker_fee,
            taker_fee: terms.taker_fee,
            expiration_timestamp_sec: terms.expiration_timestamp_sec,
            salt: resolve_salt(terms.salt),
            ec_signature: None,
        };

        if let Err(err) = order.validate() {
            warn!(maker = %order.maker, error = %err, "Rejecting exchange order terms");
            return Err(err);
        }
        check_signer(ExchangeOrder::KIND, &order.maker, signer)?;

        let hash = exchange_order_hash(&order);
        debug!(maker = %order.maker, salt = %order.salt, hash = %hash, "Exchange order hashed");

        let signature = self.sign_checked(ExchangeOrder::KIND, &hash, signer).await?;
        order.ec_signature = Some(signature);

        info!(maker = %order.maker, hash = %hash, v = signature.v, "Exchange order signed");
        Ok(order)
    }

    /// Check a loan offering's signature against its lender.
    pub fn verify_loan_offering(&self, offering: &LoanOffering) -> Result<(), InstrumentError> {
        let signature = offering.signature.as_ref().ok_or_else(|| {
            InstrumentError::invalid_terms(LoanOffering::KIND, "loan offering is not signed")
        })?;
        let hash = self.loan_offering_hash(offering);
        self.verify(LoanOffering::KIND, &hash, signature, &offering.lender)
    }

    /// Check an exchange order's signature against its maker.
    pub fn verify_exchange_order(&self, order: &ExchangeOrder) -> Result<(), InstrumentError> {
        let signature = order.ec_signature.as_ref().ok_or_else(|| {
            InstrumentError::invalid_terms(ExchangeOrder::KIND, "exchange order is not signed")
        })?;
        let hash = exchange_order_hash(order);
        self.verify(ExchangeOrder::KIND, &hash, signature, &order.maker)
    }

    async fn sign_checked(
        &self,
        kind: InstrumentKind,
        hash: &B256,
        signer: &dyn DigestSigner,
    ) -> Result<EcSignature, InstrumentError> {
        let digest = self.config.hash_scheme.signing_digest(hash);
        let signature = match signer.sign_digest(&digest).await {
            Ok(signature) => signature,
            Err(err) => {
                warn!(%kind, signer = %signer.address(), error = %err, "Signer failed");
                return Err(err.into());
            }
        };
        self.verify(kind, hash, &signature, &signer.address())?;
        Ok(signature)
    }

    fn verify(
        &self,
        kind: InstrumentKind,
        hash: &B256,
        signature: &EcSignature,
        expected: &Address,
    ) -> Result<(), InstrumentError> {
        let digest = self.config.hash_scheme.signing_digest(hash);
        let recovered = recover(&digest, signature, self.config.v_offset)?;
        if recovered != *expected {
            warn!(%kind, expected = %expected, recovered = %recovered, "Signature mismatch");
            return Err(InstrumentError::SignatureMismatch {
                kind,
                expected: *expected,
                recovered,
            });
        }
        Ok(())
    }
}

fn check_signer(
    kind: InstrumentKind,
    party: &Address,
    signer: &dyn DigestSigner,
) -> Result<(), InstrumentError> {
    let signer_address = signer.address();
    if signer_address != *party {
        warn!(%kind, party = %party, signer = %signer_address, "Signer is not the signing party");
        return Err(InstrumentError::invalid_terms(
            kind,
            format!("signer {signer_address} is not the signing party {party}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{LocalKeySigner, UnavailableSigner};
    use alloy_primitives::address;
    use margin_types::errors::SigningError;
    use margin_types::ids::ANY_TAKER;

    const E18: u128 = 1_000_000_000_000_000_000;
    const LENDER_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const OTHER_KEY: &str = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn lender() -> LocalKeySigner {
        LocalKeySigner::from_hex(LENDER_KEY).unwrap()
    }

    fn builder() -> InstrumentBuilder {
        InstrumentBuilder::new(BuilderConfig {
            margin_contract: address!("4444444444444444444444444444444444444444"),
            exchange_contract: address!("5555555555555555555555555555555555555555"),
            ..BuilderConfig::default()
        })
    }

    fn loan_terms(signer: &LocalKeySigner) -> LoanOfferingTerms {
        LoanOfferingTerms {
            underlying_token: address!("1111111111111111111111111111111111111111"),
            base_token: address!("2222222222222222222222222222222222222222"),
            lender: signer.address(),
            taker: ANY_TAKER,
            fee_recipient: address!("3333333333333333333333333333333333333333"),
            rates: Rates {
                minimum_deposit: U256::from(E18),
                max_amount: U256::from(3 * E18),
                min_amount: U256::from(E18 / 10),
                interest_rate: U256::from(E18 / 10),
                lender_fee: U256::from(E18 / 100),
                taker_fee: U256::from(2 * E18 / 100),
            },
            expiration_timestamp: U256::from(1_000_000_000_000u64),
            lockout_time: U256::from(100_000u64),
            call_time_limit: U256::from(100_000u64),
            salt: Some(U256::from(123u64)),
        }
    }

    fn order_terms(signer: &LocalKeySigner) -> ExchangeOrderTerms {
        ExchangeOrderTerms {
            maker: signer.address(),
            taker: ANY_TAKER,
            maker_token: address!("1111111111111111111111111111111111111111"),
            taker_token: address!("2222222222222222222222222222222222222222"),
            fee_recipient: address!("3333333333333333333333333333333333333333"),
            maker_token_amount: U256::from(6 * E18),
            taker_token_amount: U256::from(2 * E18),
            maker_fee: U256::from(E18 / 10),
            taker_fee: U256::from(5 * E18 / 100),
            expiration_timestamp_sec: U256::from(1_000_000_000_000u64),
            salt: Some(U256::from(456u64)),
        }
    }

    /// Signs with one key but claims another key's address.
    struct ImpostorSigner {
        claimed: Address,
        inner: LocalKeySigner,
    }

    #[async_trait::async_trait]
    impl DigestSigner for ImpostorSigner {
        fn address(&self) -> Address {
            self.claimed
        }

        async fn sign_digest(&self, digest: &B256) -> Result<EcSignature, SigningError> {
            self.inner.sign_digest(digest).await
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = BuilderConfig::default();
        assert_eq!(config.v_offset, 27);
        assert_eq!(config.hash_scheme, HashScheme::EthSignedMessage);
        assert_eq!(config.margin_contract, Address::ZERO);
    }

    #[test]
    fn test_config_from_json_partial() {
        let config = BuilderConfig::from_json(
            r#"{"marginContract":"0x4444444444444444444444444444444444444444","hashScheme":"raw"}"#,
        )
        .unwrap();
        assert_eq!(
            config.margin_contract,
            address!("4444444444444444444444444444444444444444")
        );
        assert_eq!(config.hash_scheme, HashScheme::Raw);
        assert_eq!(config.v_offset, 27);
        assert_eq!(config.exchange_contract, Address::ZERO);
    }

    #[tokio::test]
    async fn test_build_loan_offering_signs_and_verifies() {
        let signer = lender();
        let builder = builder();
        let offering = builder
            .build_loan_offering(loan_terms(&signer), &signer)
            .await
            .unwrap();
        assert!(offering.is_signed());
        assert_eq!(offering.salt, U256::from(123u64));
        assert!(builder.verify_loan_offering(&offering).is_ok());
    }

    #[tokio::test]
    async fn test_build_exchange_order_signs_and_verifies() {
        let signer = lender();
        let builder = builder();
        let order = builder
            .build_exchange_order(order_terms(&signer), &signer)
            .await
            .unwrap();
        assert_eq!(
            order.exchange_contract,
            address!("5555555555555555555555555555555555555555")
        );
        assert!(builder.verify_exchange_order(&order).is_ok());
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let signer = lender();
        let builder = builder();
        let a = builder.build_loan_offering(loan_terms(&signer), &signer).await.unwrap();
        let b = builder.build_loan_offering(loan_terms(&signer), &signer).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_missing_salt_is_generated() {
        let signer = lender();
        let builder = builder();
        let mut terms = order_terms(&signer);
        terms.salt = None;
        let a = builder.build_exchange_order(terms.clone(), &signer).await.unwrap();
        let b = builder.build_exchange_order(terms, &signer).await.unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.ec_signature, b.ec_signature);
        assert!(builder.verify_exchange_order(&a).is_ok());
        assert!(builder.verify_exchange_order(&b).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_terms_fail_before_signing() {
        let signer = lender();
        let mut terms = loan_terms(&signer);
        terms.rates.min_amount = U256::from(4 * E18);
        // An unavailable signer proves no signing was attempted
        let unavailable = UnavailableSigner::new(signer.address(), "must not be called");
        let err = builder()
            .build_loan_offering(terms, &unavailable)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::InvalidTerms {
                kind: InstrumentKind::LoanOffering,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_signer_must_be_party() {
        let signer = lender();
        let other = LocalKeySigner::from_hex(OTHER_KEY).unwrap();
        let err = builder()
            .build_exchange_order(order_terms(&signer), &other)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::InvalidTerms {
                kind: InstrumentKind::ExchangeOrder,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unavailable_signer_propagates() {
        let signer = lender();
        let unavailable = UnavailableSigner::new(signer.address(), "hsm offline");
        let err = builder()
            .build_exchange_order(order_terms(&signer), &unavailable)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InstrumentError::Signing(SigningError::Unavailable {
                reason: "hsm offline".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_impostor_signer_detected() {
        let signer = lender();
        let impostor = ImpostorSigner {
            claimed: signer.address(),
            inner: LocalKeySigner::from_hex(OTHER_KEY).unwrap(),
        };
        let err = builder()
            .build_loan_offering(loan_terms(&signer), &impostor)
            .await
            .unwrap_err();
        match err {
            InstrumentError::SignatureMismatch {
                kind,
                expected,
                recovered,
            } => {
                assert_eq!(kind, InstrumentKind::LoanOffering);
                assert_eq!(expected, signer.address());
                assert_eq!(recovered, impostor.inner.address());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_v_offset_disagreement_rejected() {
        let signer = lender().with_v_offset(0);
        let err = builder()
            .build_loan_offering(loan_terms(&signer), &signer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::Signing(SigningError::MalformedSignature { .. })
        ));
    }

    #[tokio::test]
    async fn test_tampered_offering_fails_verification() {
        let signer = lender();
        let builder = builder();
        let mut offering = builder
            .build_loan_offering(loan_terms(&signer), &signer)
            .await
            .unwrap();
        offering.salt = U256::from(124u64);
        assert!(builder.verify_loan_offering(&offering).is_err());
    }

    #[tokio::test]
    async fn test_other_margin_contract_fails_verification() {
        let signer = lender();
        let offering = builder()
            .build_loan_offering(loan_terms(&signer), &signer)
            .await
            .unwrap();
        let elsewhere = InstrumentBuilder::new(BuilderConfig {
            margin_contract: address!("6666666666666666666666666666666666666666"),
            ..BuilderConfig::default()
        });
        assert!(elsewhere.verify_loan_offering(&offering).is_err());
    }

    #[test]
    fn test_unsigned_instrument_rejected() {
        let offering = LoanOffering {
            underlying_token: address!("1111111111111111111111111111111111111111"),
            base_token: address!("2222222222222222222222222222222222222222"),
            lender: address!("2c7536e3605d9c16a7a3d7b1898e529396a65c23"),
            taker: ANY_TAKER,
            fee_recipient: ANY_TAKER,
            rates: Rates {
                minimum_deposit: U256::ZERO,
                max_amount: U256::ZERO,
                min_amount: U256::ZERO,
                interest_rate: U256::ZERO,
                lender_fee: U256::ZERO,
                taker_fee: U256::ZERO,
            },
            expiration_timestamp: U256::ZERO,
            lockout_time: U256::ZERO,
            call_time_limit: U256::ZERO,
            salt: U256::ZERO,
            signature: None,
        };
        assert!(matches!(
            builder().verify_loan_offering(&offering),
            Err(InstrumentError::InvalidTerms { .. })
        ));
    }
}
