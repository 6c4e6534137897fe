//! Signature and certificate-chain verification against generated PKI.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::fs;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::rand::SystemRandom;
use ring::signature::RSA_PKCS1_SHA256;
use ring::signature::RsaKeyPair;
use tempfile::TempDir;
use veocheck_core::IssueId;
use veocheck_core::Severity;
use veocheck_core::Validated;
use veocheck_core::VeoError;
use veocheck_core::signature::Signature;
use veocheck_core::test_utils::TestSigner;
use veocheck_core::test_utils::signature_xml;
use veocheck_core::xml::Schema;
use veocheck_core::xml::SchemaKind;

const LOCATION: &str = "VEOContentSignature1.xml";
const BAD_CERTIFICATE_ENCODING: IssueId = IssueId::new("Signature", "parse", 7);
const BAD_CERTIFICATE: IssueId = IssueId::new("Signature", "verify", 3);
const UNSUPPORTED: IssueId = IssueId::new("Signature", "verify", 4);
const MISMATCH: IssueId = IssueId::new("Signature", "verify", 5);
const LINK_FAILED: IssueId = IssueId::new("Signature", "chain", 3);
const NOT_SELF_SIGNED: IssueId = IssueId::new("Signature", "chain", 4);
const BAD_SELF_SIGNATURE: IssueId = IssueId::new("Signature", "chain", 5);

const SIGNER_KEY: &[u8] = include_bytes!("../fixtures/signer.pk8");

/// Self-signed 2048-bit RSA signer.
const RSA_KEY: &[u8] = include_bytes!("../fixtures/rsa-signer.pk8");
const RSA_CERTIFICATE: &[u8] = include_bytes!("../fixtures/rsa-signer.der");

/// Self-signed 1024-bit RSA certificate, and its SHA256withRSA signature
/// over `SHORT_KEY_MESSAGE`.
const SHORT_RSA_CERTIFICATE: &[u8] = include_bytes!("../fixtures/rsa1024-signer.der");
const SHORT_RSA_SIGNATURE: &[u8] = include_bytes!("../fixtures/rsa1024-signature.bin");
const SHORT_KEY_MESSAGE: &[u8] = b"short key companion";

fn schema() -> Schema {
    Schema::for_kind(SchemaKind::Signature, None).unwrap()
}

fn parse(xml: &str) -> Signature {
    Signature::parse_str(xml, LOCATION, &schema())
}

fn error_ids(signature: &Signature) -> Vec<IssueId> {
    signature
        .collect(Severity::Error)
        .iter()
        .map(|i| i.id)
        .collect()
}

fn rsa_sign(data: &[u8]) -> Vec<u8> {
    let key = RsaKeyPair::from_pkcs8(RSA_KEY).unwrap();
    let mut signature = vec![0; key.public().modulus_len()];
    key.sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), data, &mut signature)
        .unwrap();
    signature
}

/// Signature file by `signer` whose certificate at `slot` is replaced by
/// text that is not base64.
fn with_undecodable_certificate(signer: &TestSigner, slot: usize, data: &[u8]) -> Signature {
    let encoded = STANDARD.encode(&signer.chain()[slot]);
    let xml = signer.signature_file(data).replacen(
        &format!("<vers:Certificate>{encoded}</vers:Certificate>"),
        "<vers:Certificate>not*base64</vers:Certificate>",
        1,
    );
    parse(&xml)
}

fn chain_signer() -> TestSigner {
    let [leaf, intermediate, root] = common::three_level_chain();
    common::signer(&leaf, vec![leaf.der(), intermediate.der(), root.der()])
}

#[test]
fn test_round_trip_verifies() {
    let signer = chain_signer();
    let data = b"<vers:VEO>signed content</vers:VEO>";
    let mut signature = parse(&signer.signature_file(data));

    assert!(signature.verify_bytes(data));
    assert!(signature.verify_chain());
    assert!(!signature.has_errors(), "{:?}", error_ids(&signature));
}

#[test]
fn test_flipped_companion_byte_fails() {
    let signer = TestSigner::fixture();
    let data = b"original companion".to_vec();
    let mut signature = parse(&signer.signature_file(&data));

    let mut tampered = data;
    tampered[0] ^= 0x01;

    assert!(!signature.verify_bytes(&tampered));
    assert_eq!(error_ids(&signature), [MISMATCH]);
}

#[test]
fn test_flipped_signature_byte_fails() {
    let signer = TestSigner::fixture();
    let data = b"companion";
    let mut bytes = signer.sign(data);
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    let chain: Vec<&[u8]> = signer.chain().iter().map(Vec::as_slice).collect();
    let mut signature = parse(&signature_xml("SHA256withECDSA", "2015", &bytes, &chain));

    assert!(!signature.verify_bytes(data));
    assert!(error_ids(&signature).contains(&MISMATCH));
}

#[test]
fn test_three_level_chain_verifies() {
    let [leaf, intermediate, root] = common::three_level_chain();
    let signer = common::signer(&leaf, vec![leaf.der(), intermediate.der(), root.der()]);
    let mut signature = parse(&signer.signature_file(b"x"));

    assert!(signature.verify_chain());
    assert!(error_ids(&signature).is_empty());
}

#[test]
fn test_unrelated_root_breaks_only_the_last_link() {
    let [leaf, intermediate, _root] = common::three_level_chain();
    let stranger = common::root("Unrelated Root CA");
    let signer = common::signer(&leaf, vec![leaf.der(), intermediate.der(), stranger.der()]);
    let mut signature = parse(&signer.signature_file(b"x"));

    assert!(!signature.verify_chain());
    let ids = error_ids(&signature);
    assert_eq!(ids, [LINK_FAILED]);
    assert!(!ids.contains(&NOT_SELF_SIGNED));
    assert!(!ids.contains(&BAD_SELF_SIGNATURE));
    assert!(signature.collect(Severity::Error)[0].message.contains("certificate 2"));
}

#[test]
fn test_chain_ending_below_root_is_not_self_signed() {
    let [leaf, intermediate, _root] = common::three_level_chain();
    let signer = common::signer(&leaf, vec![leaf.der(), intermediate.der()]);
    let mut signature = parse(&signer.signature_file(b"x"));

    assert!(!signature.verify_chain());
    assert_eq!(error_ids(&signature), [NOT_SELF_SIGNED]);
}

#[test]
fn test_each_broken_link_reported() {
    let [leaf, _intermediate, root] = common::three_level_chain();
    let other = common::root("Other CA");
    // leaf is not signed by other; other is not signed by root.
    let signer = common::signer(&leaf, vec![leaf.der(), other.der(), root.der()]);
    let mut signature = parse(&signer.signature_file(b"x"));

    signature.verify_chain();
    assert_eq!(error_ids(&signature), [LINK_FAILED, LINK_FAILED]);
}

#[test]
fn test_unknown_algorithm_still_checks_chain() {
    let signer = TestSigner::fixture();
    let chain: Vec<&[u8]> = signer.chain().iter().map(Vec::as_slice).collect();
    let mut signature = parse(&signature_xml("1.2.3.4.5", "2015", &signer.sign(b"x"), &chain));

    assert!(!signature.verify_bytes(b"x"));
    assert!(signature.verify_chain());
    assert_eq!(error_ids(&signature), [IssueId::new("Signature", "parse", 3)]);
}

#[test]
fn test_verify_reads_companion_file() {
    let temp = TempDir::new().unwrap();
    let companion = temp.path().join("VEOContent.xml");
    fs::write(&companion, b"<vers:VEO/>").unwrap();
    let signer = TestSigner::fixture();
    let mut signature = parse(&signer.signature_file(b"<vers:VEO/>"));

    assert!(signature.verify(&companion).unwrap());
}

#[test]
fn test_unreadable_companion_is_fatal() {
    let temp = TempDir::new().unwrap();
    let signer = TestSigner::fixture();
    let mut signature = parse(&signer.signature_file(b"x"));

    let result = signature.verify(&temp.path().join("VEOContent.xml"));
    assert!(matches!(result, Err(VeoError::Companion { .. })));
}

#[test]
fn test_rsa_round_trip_verifies() {
    let data = b"<vers:VEO>signed with RSA</vers:VEO>";
    let mut signature = parse(&signature_xml("SHA256withRSA", "2015", &rsa_sign(data), &[RSA_CERTIFICATE]));

    assert!(signature.verify_bytes(data));
    assert!(signature.verify_chain());
    assert!(!signature.has_errors(), "{:?}", error_ids(&signature));
}

#[test]
fn test_rsa_over_other_bytes_is_mismatch() {
    let mut signature = parse(&signature_xml(
        "1.2.840.113549.1.1.11",
        "2015",
        &rsa_sign(b"original"),
        &[RSA_CERTIFICATE],
    ));

    assert!(!signature.verify_bytes(b"altered"));
    assert_eq!(error_ids(&signature), [MISMATCH]);
}

#[test]
fn test_short_rsa_key_is_unsupported_not_mismatch() {
    let mut signature = parse(&signature_xml(
        "SHA256withRSA",
        "2015",
        SHORT_RSA_SIGNATURE,
        &[SHORT_RSA_CERTIFICATE],
    ));

    assert!(!signature.verify_bytes(SHORT_KEY_MESSAGE));
    assert_eq!(error_ids(&signature), [UNSUPPORTED]);
    assert!(signature.collect(Severity::Error)[0].message.contains("1024-bit"));
}

#[test]
fn test_undecodable_root_fails_chain() {
    let leaf = TestSigner::fixture().chain()[0].clone();
    let signer = TestSigner::from_pkcs8(SIGNER_KEY, vec![leaf, b"root".to_vec()]);
    let mut signature = with_undecodable_certificate(&signer, 1, b"x");

    assert!(signature.verify_bytes(b"x"));
    assert!(!signature.verify_chain());
    assert_eq!(error_ids(&signature), [BAD_CERTIFICATE_ENCODING]);
}

#[test]
fn test_undecodable_intermediate_keeps_link_numbers() {
    let [leaf, intermediate, root] = common::three_level_chain();
    let signer = common::signer(&leaf, vec![leaf.der(), intermediate.der(), root.der()]);
    let mut signature = with_undecodable_certificate(&signer, 1, b"x");

    assert_eq!(signature.certificates.len(), 3);
    assert!(signature.certificates[1].is_none());
    assert!(signature.verify_bytes(b"x"));
    assert!(!signature.verify_chain());
    // The leaf is never checked against the root.
    assert_eq!(error_ids(&signature), [BAD_CERTIFICATE_ENCODING]);
    assert!(signature.collect(Severity::Error)[0].message.contains("certificate 2"));
}

#[test]
fn test_undecodable_end_entity_reported_by_verify() {
    let leaf = TestSigner::fixture().chain()[0].clone();
    let signer = TestSigner::from_pkcs8(SIGNER_KEY, vec![b"first".to_vec(), leaf]);
    let mut signature = with_undecodable_certificate(&signer, 0, b"x");

    assert!(!signature.verify_bytes(b"x"));
    assert_eq!(error_ids(&signature), [BAD_CERTIFICATE_ENCODING, BAD_CERTIFICATE]);
    assert!(signature.collect(Severity::Error)[1].message.contains("not valid base64"));
}
