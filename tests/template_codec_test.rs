//! Template codec and ciphertext serialization tests.

mod common;

use biometric_service::ckks::{Ciphertext, CkksContext, CkksError, CkksParams};
use biometric_service::crypto::{self, EncryptedTemplate};
use biometric_service::error::BiometricError;

/// encode/decode is lossless for arbitrary bytes.
#[test]
fn codec_round_trip() {
    let raw: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();
    let blob = crypto::encode(&raw).unwrap();

    assert!(blob.is_ascii());
    assert_eq!(crypto::decode(&blob).unwrap(), raw);
}

/// Sealing then opening a template recovers a ciphertext that decrypts to
/// the enrolled values.
#[test]
fn sealed_template_decrypts_to_original() {
    let context = common::test_context();
    let ciphertext = context.encrypt(&common::ALICE).unwrap();

    let template = EncryptedTemplate::seal(&ciphertext).unwrap();
    let stored = EncryptedTemplate::from_stored(template.as_bytes()).unwrap();
    let reopened = stored.open(&context).unwrap();

    assert_eq!(reopened.size(), common::ALICE.len());
    let values = context.decrypt(&reopened).unwrap();
    for (got, want) in values.iter().zip(common::ALICE) {
        assert!((got - want).abs() < 1e-4, "{got} vs {want}");
    }
}

/// Raw ciphertext bytes survive a round trip unchanged.
#[test]
fn ciphertext_bytes_round_trip() {
    let context = common::test_context();
    let ciphertext = context.encrypt(&[1.5, -2.25, 3.0]).unwrap();

    let bytes = ciphertext.to_bytes().unwrap();
    let restored = Ciphertext::from_bytes(&bytes, &context).unwrap();
    assert_eq!(restored.to_bytes().unwrap(), bytes);
}

/// A template sealed under one context cannot be opened under another.
#[test]
fn foreign_context_template_is_rejected() {
    let context = common::test_context();
    let other = CkksContext::new(CkksParams::for_tests()).unwrap();

    let ciphertext = other.encrypt(&common::ALICE).unwrap();
    let bytes = ciphertext.to_bytes().unwrap();
    assert!(matches!(
        Ciphertext::from_bytes(&bytes, &context),
        Err(CkksError::ContextMismatch)
    ));

    let template = EncryptedTemplate::seal(&ciphertext).unwrap();
    assert!(matches!(template.open(&context), Err(BiometricError::Codec(_))));
}

#[test]
fn truncated_blob_is_codec_error() {
    let context = common::test_context();
    let ciphertext = context.encrypt(&common::ALICE).unwrap();
    let template = EncryptedTemplate::seal(&ciphertext).unwrap();

    let truncated = EncryptedTemplate::from_blob(&template.as_str()[..template.as_str().len() / 2]);
    assert!(matches!(truncated.open(&context), Err(BiometricError::Codec(_))));
}
