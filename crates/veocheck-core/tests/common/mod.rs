//! Certificate fixtures generated at test time.

#![allow(dead_code, clippy::unwrap_used)]

use rcgen::BasicConstraints;
use rcgen::Certificate;
use rcgen::CertificateParams;
use rcgen::DnType;
use rcgen::IsCa;
use rcgen::KeyPair;
use veocheck_core::test_utils::TestSigner;

/// A certificate with the key that signed it.
pub struct Issued {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl Issued {
    pub fn der(&self) -> Vec<u8> {
        self.cert.der().to_vec()
    }
}

fn params(common_name: &str, ca: bool) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    if ca {
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    }
    params
}

/// A self-signed CA certificate.
pub fn root(common_name: &str) -> Issued {
    let key = KeyPair::generate().unwrap();
    let cert = params(common_name, true).self_signed(&key).unwrap();
    Issued { cert, key }
}

/// A certificate for `common_name` signed by `issuer`.
pub fn issue(common_name: &str, ca: bool, issuer: &Issued) -> Issued {
    let key = KeyPair::generate().unwrap();
    let cert = params(common_name, ca)
        .signed_by(&key, &issuer.cert, &issuer.key)
        .unwrap();
    Issued { cert, key }
}

/// Leaf, intermediate and root, in signing order.
pub fn three_level_chain() -> [Issued; 3] {
    let root = root("Test Root CA");
    let intermediate = issue("Test Intermediate CA", true, &root);
    let leaf = issue("Test Signer", false, &intermediate);
    [leaf, intermediate, root]
}

/// A signer using `leaf`'s key that presents `chain`.
pub fn signer(leaf: &Issued, chain: Vec<Vec<u8>>) -> TestSigner {
    TestSigner::from_pkcs8(&leaf.key.serialize_der(), chain)
}
