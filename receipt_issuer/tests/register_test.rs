// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use async_trait::async_trait;
use p256::ecdsa::{signature::hazmat::PrehashVerifier, Signature};
use rand::rngs::OsRng;
use receipt_format::{codec, receipt_hash, signed, ReceiptHash, TaxRate};
use receipt_issuer::{
    adapters::{ReceiptBank, ReceiptSigner, Submission},
    config::{StoreInfo, Timeouts},
    context::memory::{InMemoryError, InMemoryReceiptBank, LocalSigner},
    sequence::CounterSequence,
    Catalog, Category, Error, IssueStep, Register, RegisterStatus,
};
use receipt_sealing::{open, point, OneTimeKey, SecretKey};
use rstest::*;

#[fixture]
fn store() -> StoreInfo {
    StoreInfo {
        registration_id: 1234567890,
        name: "Corner Shop".into(),
        address: "1 Main Street".into(),
    }
}

#[fixture]
fn catalog() -> Catalog {
    [
        (
            1,
            Category {
                name: "Household".into(),
                tax_rate: TaxRate::Standard,
                preset_price: 10.50,
            },
        ),
        (
            2,
            Category {
                name: "Groceries".into(),
                tax_rate: TaxRate::Reduced,
                preset_price: 15.00,
            },
        ),
    ]
    .into_iter()
    .collect()
}

#[fixture]
fn customer() -> SecretKey {
    SecretKey::random(&mut OsRng)
}

fn compressed(key: &SecretKey) -> [u8; point::COMPRESSED_LEN] {
    point::compress(&key.public_key())
}

type LocalRegister<S = LocalSigner> = Register<S, InMemoryReceiptBank>;

fn register_with<S>(signer: S, store: StoreInfo, catalog: Catalog) -> LocalRegister<S> {
    Register::new(
        signer,
        InMemoryReceiptBank::default(),
        CounterSequence::default(),
        store,
        catalog,
    )
}

#[fixture]
fn register(store: StoreInfo, catalog: Catalog) -> LocalRegister {
    register_with(LocalSigner::random(), store, catalog)
}

fn ring_up<S, B>(register: &mut Register<S, B>) {
    register.start().unwrap();
    register.add_item(1, 2, None).unwrap();
    register.add_item(2, 1, None).unwrap();
    register.set_payment_method("CARD").unwrap();
}

/// Returns a signature one byte short.
struct ShortSigner;

#[async_trait]
impl ReceiptSigner for ShortSigner {
    type AdapterError = InMemoryError;

    async fn sign(&self, _hash: &ReceiptHash) -> Result<Vec<u8>, Self::AdapterError> {
        Ok(vec![0x11; 63])
    }

    async fn public_key(&self) -> Result<Vec<u8>, Self::AdapterError> {
        Ok(vec![0x04; 65])
    }
}

/// Takes far longer than any sane timeout to answer.
struct SlowSigner(LocalSigner);

#[async_trait]
impl ReceiptSigner for SlowSigner {
    type AdapterError = InMemoryError;

    async fn sign(&self, hash: &ReceiptHash) -> Result<Vec<u8>, Self::AdapterError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        self.0.sign(hash).await
    }

    async fn public_key(&self) -> Result<Vec<u8>, Self::AdapterError> {
        self.0.public_key().await
    }
}

struct UnavailableBank;

#[async_trait]
impl ReceiptBank for UnavailableBank {
    type AdapterError = InMemoryError;

    async fn submit(&self, _submission: Submission) -> Result<(), Self::AdapterError> {
        Err(InMemoryError::AdapterError {
            error: "connection refused".to_owned(),
        })
    }
}

struct SlowBank(InMemoryReceiptBank);

#[async_trait]
impl ReceiptBank for SlowBank {
    type AdapterError = InMemoryError;

    async fn submit(&self, submission: Submission) -> Result<(), Self::AdapterError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        self.0.submit(submission).await
    }
}

#[rstest]
#[tokio::test]
async fn issued_receipt_can_be_collected_opened_and_verified(
    mut register: LocalRegister,
    customer: SecretKey,
) {
    ring_up(&mut register);
    let receipt = register.issue(&compressed(&customer)).await.unwrap();

    assert_eq!(register.status(), RegisterStatus::Closed);
    assert_eq!(register.last_issued(), Some(&receipt));
    assert_eq!(receipt.serial(), "F0001");
    assert_eq!(receipt.report_number(), "Z0001");
    assert_eq!(receipt.registration_id(), "1234567890");
    assert!(receipt.transaction_id().ends_with("0001"));

    let index_key = OneTimeKey::from_public_key(customer.public_key());
    let submission = register.bank().take(&index_key).unwrap().unwrap();
    assert_eq!(
        submission.tracking_id.as_deref(),
        Some(receipt.transaction_id())
    );

    let signed_receipt = open(&customer, &submission.payload).unwrap();
    let (binary, signature) = signed::split(&signed_receipt).unwrap();
    let signature = Signature::from_slice(signature).unwrap();
    register
        .signer()
        .verifying_key()
        .verify_prehash(&receipt_hash(binary), &signature)
        .unwrap();

    let decoded = codec::decode(binary).unwrap();
    assert_eq!(decoded.transaction_id(), receipt.transaction_id());
    assert_eq!(decoded.timestamp(), receipt.timestamp());
    assert_eq!(decoded.items(), receipt.items());
    assert_eq!(decoded.total_amount(), receipt.total_amount());
    assert_eq!(codec::encode(&decoded).unwrap(), binary);
}

#[rstest]
#[tokio::test]
async fn mixed_rate_receipt_totals(mut register: LocalRegister, customer: SecretKey) {
    ring_up(&mut register);
    let receipt = register.issue(&compressed(&customer)).await.unwrap();

    assert_eq!(receipt.total_amount(), 36.0);
    let taxes = receipt.tax_breakdown();
    assert!((taxes.reduced.taxable_amount - 13.636).abs() < 1e-3);
    assert!((taxes.reduced.tax_amount - 1.364).abs() < 1e-3);
    assert!((taxes.standard.taxable_amount - 17.50).abs() < 1e-9);
    assert!((taxes.standard.tax_amount - 3.50).abs() < 1e-9);
    assert!((taxes.total_tax - 4.864).abs() < 1e-3);
}

#[rstest]
#[tokio::test]
async fn empty_receipt_is_discarded(mut register: LocalRegister, customer: SecretKey) {
    register.start().unwrap();
    register.set_payment_method("CASH").unwrap();

    let err = register.issue(&compressed(&customer)).await.unwrap_err();
    assert!(matches!(err, Error::EmptyReceipt));
    assert_eq!(err.step(), Some(IssueStep::Validate));
    assert_eq!(register.status(), RegisterStatus::NoReceipt);
    assert!(register.bank().is_empty().unwrap());
}

#[rstest]
#[tokio::test]
async fn short_signature_is_never_submitted(
    store: StoreInfo,
    catalog: Catalog,
    customer: SecretKey,
) {
    let mut register = register_with(ShortSigner, store, catalog);
    ring_up(&mut register);

    let err = register.issue(&compressed(&customer)).await.unwrap_err();
    assert!(matches!(err, Error::Assemble(_)));
    assert_eq!(err.step(), Some(IssueStep::Assemble));
    assert_eq!(register.status(), RegisterStatus::NoReceipt);
    assert!(register.bank().is_empty().unwrap());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_signer_times_out(store: StoreInfo, catalog: Catalog, customer: SecretKey) {
    let mut register = register_with(SlowSigner(LocalSigner::random()), store, catalog)
        .with_timeouts(Timeouts {
            signer: Duration::from_secs(10),
            bank: Duration::from_secs(15),
        });
    ring_up(&mut register);

    let err = register.issue(&compressed(&customer)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Timeout {
            step: IssueStep::Sign,
            ..
        }
    ));
    assert_eq!(register.status(), RegisterStatus::NoReceipt);
    assert!(register.bank().is_empty().unwrap());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_bank_times_out(store: StoreInfo, catalog: Catalog, customer: SecretKey) {
    let mut register = Register::new(
        LocalSigner::random(),
        SlowBank(InMemoryReceiptBank::default()),
        CounterSequence::default(),
        store,
        catalog,
    )
    .with_timeouts(Timeouts {
        signer: Duration::from_secs(10),
        bank: Duration::from_secs(15),
    });
    ring_up(&mut register);

    let err = register.issue(&compressed(&customer)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Timeout {
            step: IssueStep::Submit,
            timeout,
        } if timeout == Duration::from_secs(15)
    ));
    assert_eq!(register.status(), RegisterStatus::NoReceipt);
    assert_eq!(register.last_issued(), None);
    assert!(register.bank().0.is_empty().unwrap());
}

#[rstest]
#[tokio::test]
async fn bank_failure_discards_the_receipt(
    store: StoreInfo,
    catalog: Catalog,
    customer: SecretKey,
) {
    let mut register = Register::new(
        LocalSigner::random(),
        UnavailableBank,
        CounterSequence::default(),
        store,
        catalog,
    );
    ring_up(&mut register);

    let err = register.issue(&compressed(&customer)).await.unwrap_err();
    assert!(matches!(err, Error::Bank { .. }));
    assert_eq!(err.step(), Some(IssueStep::Submit));
    assert_eq!(register.status(), RegisterStatus::NoReceipt);
    assert_eq!(register.last_issued(), None);
}

#[rstest]
#[tokio::test]
async fn failed_submission_burns_its_receipt_number(
    mut register: LocalRegister,
    customer: SecretKey,
) {
    ring_up(&mut register);
    register.issue(&compressed(&customer)).await.unwrap();

    // Same one-time key again: the bank refuses it.
    ring_up(&mut register);
    let err = register.issue(&compressed(&customer)).await.unwrap_err();
    assert!(matches!(err, Error::Bank { .. }));

    ring_up(&mut register);
    let receipt = register
        .issue(&compressed(&SecretKey::random(&mut OsRng)))
        .await
        .unwrap();
    assert_eq!(receipt.serial(), "F0003");
}

#[rstest]
#[case::wrong_length(vec![0x02; 32])]
#[case::bad_tag(vec![0x05; 33])]
#[case::uncompressed(vec![0x04; 65])]
#[tokio::test]
async fn invalid_receiver_key_keeps_the_sequence(
    mut register: LocalRegister,
    customer: SecretKey,
    #[case] receiver_key: Vec<u8>,
) {
    ring_up(&mut register);
    let err = register.issue(&receiver_key).await.unwrap_err();
    assert!(matches!(err, Error::InvalidReceiverKey(_)));
    assert_eq!(register.status(), RegisterStatus::NoReceipt);

    ring_up(&mut register);
    let receipt = register.issue(&compressed(&customer)).await.unwrap();
    assert_eq!(receipt.serial(), "F0001");
}

#[rstest]
fn actions_require_an_open_receipt(mut register: LocalRegister) {
    assert!(matches!(
        register.add_item(1, 1, None),
        Err(Error::NoOpenReceipt)
    ));
    assert!(matches!(
        register.set_payment_method("CASH"),
        Err(Error::NoOpenReceipt)
    ));
    assert!(matches!(register.cancel(), Err(Error::NoOpenReceipt)));

    register.start().unwrap();
    assert!(matches!(
        register.start(),
        Err(Error::InvalidStateForRequestedAction {
            status: RegisterStatus::Open
        })
    ));

    register.add_item(1, 1, None).unwrap();
    register.cancel().unwrap();
    assert_eq!(register.status(), RegisterStatus::NoReceipt);
    assert_eq!(register.current_receipt(), None);
}

#[rstest]
#[tokio::test]
async fn issue_without_open_receipt_keeps_the_state(
    mut register: LocalRegister,
    customer: SecretKey,
) {
    assert!(matches!(
        register.issue(&compressed(&customer)).await,
        Err(Error::NoOpenReceipt)
    ));
    assert_eq!(register.status(), RegisterStatus::NoReceipt);

    ring_up(&mut register);
    register.issue(&compressed(&customer)).await.unwrap();
    assert!(matches!(
        register.issue(&compressed(&customer)).await,
        Err(Error::NoOpenReceipt)
    ));
    assert_eq!(register.status(), RegisterStatus::Closed);
}

#[rstest]
#[case::unknown_category(9, 1, None)]
#[case::zero_quantity(1, 0, None)]
#[case::zero_price(1, 1, Some(0.0))]
#[case::negative_price(1, 1, Some(-2.0))]
#[case::nan_price(1, 1, Some(f64::NAN))]
fn rejected_items_leave_the_receipt_untouched(
    mut register: LocalRegister,
    #[case] category_id: u16,
    #[case] quantity: u16,
    #[case] custom_price: Option<f64>,
) {
    register.start().unwrap();
    let err = register
        .add_item(category_id, quantity, custom_price)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownCategory(_) | Error::ZeroQuantity | Error::InvalidPrice(_)
    ));
    assert_eq!(register.status(), RegisterStatus::Open);
    assert!(register.current_receipt().unwrap().items().is_empty());
}

#[rstest]
fn custom_price_gets_its_own_line(mut register: LocalRegister) {
    register.start().unwrap();
    register.add_item(1, 1, None).unwrap();
    let line = register.add_item(1, 1, Some(9.99)).unwrap();
    assert_eq!(line.unit_price(), 9.99);
    assert_eq!(line.tax_rate(), TaxRate::Standard);
    let line = register.add_item(1, 2, Some(10.50)).unwrap();
    assert_eq!(line.quantity(), 3);

    let draft = register.current_receipt().unwrap();
    assert_eq!(draft.items().len(), 2);
    assert!((draft.total() - 41.49).abs() < 1e-9);
}
