//! Accepted signature algorithms and their run-time verifiers.

use std::ops::RangeInclusive;

use ring::signature::ECDSA_P256_SHA256_ASN1;
use ring::signature::ECDSA_P256_SHA384_ASN1;
use ring::signature::ECDSA_P384_SHA256_ASN1;
use ring::signature::ECDSA_P384_SHA384_ASN1;
use ring::signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY;
use ring::signature::RSA_PKCS1_2048_8192_SHA256;
use ring::signature::RSA_PKCS1_2048_8192_SHA384;
use ring::signature::RSA_PKCS1_2048_8192_SHA512;
use ring::signature::UnparsedPublicKey;
use ring::signature::VerificationAlgorithm;

/// Uncompressed SEC1 point lengths.
const P256_POINT_LEN: usize = 65;
const P384_POINT_LEN: usize = 97;

/// RSA modulus sizes the PKCS#1 verifiers accept.
const RSA_MODULUS_BITS: RangeInclusive<usize> = 2048..=8192;

/// A signature algorithm VERS packages may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// `1.2.840.113549.1.1.5`
    Sha1WithRsa,
    /// `1.2.840.113549.1.1.11`
    Sha256WithRsa,
    /// `1.2.840.113549.1.1.12`
    Sha384WithRsa,
    /// `1.2.840.113549.1.1.13`
    Sha512WithRsa,
    /// `1.2.840.10040.4.3`
    Sha1WithDsa,
    /// `2.16.840.1.101.3.4.3.2`
    Sha256WithDsa,
    /// `1.2.840.10045.4.1`
    Sha1WithEcdsa,
    /// `1.2.840.10045.4.3.2`
    Sha256WithEcdsa,
    /// `1.2.840.10045.4.3.3`
    Sha384WithEcdsa,
    /// `1.2.840.10045.4.3.4`
    Sha512WithEcdsa,
}

/// Why a signature did not verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    /// No verifier exists for this algorithm and key.
    Unsupported(String),
    /// The signature does not match.
    Mismatch,
}

const ALL: [SignatureAlgorithm; 10] = [
    SignatureAlgorithm::Sha1WithRsa,
    SignatureAlgorithm::Sha256WithRsa,
    SignatureAlgorithm::Sha384WithRsa,
    SignatureAlgorithm::Sha512WithRsa,
    SignatureAlgorithm::Sha1WithDsa,
    SignatureAlgorithm::Sha256WithDsa,
    SignatureAlgorithm::Sha1WithEcdsa,
    SignatureAlgorithm::Sha256WithEcdsa,
    SignatureAlgorithm::Sha384WithEcdsa,
    SignatureAlgorithm::Sha512WithEcdsa,
];

impl SignatureAlgorithm {
    /// Looks up an algorithm by OID or by `SHA256withRSA`-style name.
    ///
    /// # Examples
    ///
    /// ```
    /// use veocheck_core::signature::SignatureAlgorithm;
    ///
    /// let by_oid = SignatureAlgorithm::from_identifier("1.2.840.113549.1.1.11");
    /// let by_name = SignatureAlgorithm::from_identifier("SHA256withRSA");
    /// assert_eq!(by_oid, Some(SignatureAlgorithm::Sha256WithRsa));
    /// assert_eq!(by_oid, by_name);
    /// assert!(SignatureAlgorithm::from_identifier("MD5withRSA").is_none());
    /// ```
    #[must_use]
    pub fn from_identifier(id: &str) -> Option<Self> {
        let id = id.trim();
        ALL.into_iter()
            .find(|a| a.oid() == id || a.name().eq_ignore_ascii_case(id))
    }

    /// Dotted OID.
    #[must_use]
    pub const fn oid(self) -> &'static str {
        match self {
            Self::Sha1WithRsa => "1.2.840.113549.1.1.5",
            Self::Sha256WithRsa => "1.2.840.113549.1.1.11",
            Self::Sha384WithRsa => "1.2.840.113549.1.1.12",
            Self::Sha512WithRsa => "1.2.840.113549.1.1.13",
            Self::Sha1WithDsa => "1.2.840.10040.4.3",
            Self::Sha256WithDsa => "2.16.840.1.101.3.4.3.2",
            Self::Sha1WithEcdsa => "1.2.840.10045.4.1",
            Self::Sha256WithEcdsa => "1.2.840.10045.4.3.2",
            Self::Sha384WithEcdsa => "1.2.840.10045.4.3.3",
            Self::Sha512WithEcdsa => "1.2.840.10045.4.3.4",
        }
    }

    /// Conventional name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1WithRsa => "SHA1withRSA",
            Self::Sha256WithRsa => "SHA256withRSA",
            Self::Sha384WithRsa => "SHA384withRSA",
            Self::Sha512WithRsa => "SHA512withRSA",
            Self::Sha1WithDsa => "SHA1withDSA",
            Self::Sha256WithDsa => "SHA256withDSA",
            Self::Sha1WithEcdsa => "SHA1withECDSA",
            Self::Sha256WithEcdsa => "SHA256withECDSA",
            Self::Sha384WithEcdsa => "SHA384withECDSA",
            Self::Sha512WithEcdsa => "SHA512withECDSA",
        }
    }

    /// Whether this is one of the RSA PKCS#1 algorithms.
    #[must_use]
    pub const fn is_rsa(self) -> bool {
        matches!(
            self,
            Self::Sha1WithRsa | Self::Sha256WithRsa | Self::Sha384WithRsa | Self::Sha512WithRsa
        )
    }

    /// Checks that an RSA modulus of `bits` is within what can be verified.
    /// Always passes for non-RSA algorithms.
    ///
    /// # Errors
    ///
    /// Returns `VerifyFailure::Unsupported` for a modulus outside 2048 to
    /// 8192 bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use veocheck_core::signature::SignatureAlgorithm;
    ///
    /// assert!(SignatureAlgorithm::Sha256WithRsa.check_rsa_modulus(2048).is_ok());
    /// assert!(SignatureAlgorithm::Sha256WithRsa.check_rsa_modulus(1024).is_err());
    /// ```
    pub fn check_rsa_modulus(self, bits: usize) -> Result<(), VerifyFailure> {
        if !self.is_rsa() || RSA_MODULUS_BITS.contains(&bits) {
            return Ok(());
        }
        Err(VerifyFailure::Unsupported(format!(
            "{} with a {bits}-bit key",
            self.name()
        )))
    }

    /// Picks the verifier for this algorithm and key. ECDSA curves are told
    /// apart by the encoded point length.
    fn verifier(self, public_key: &[u8]) -> Result<&'static dyn VerificationAlgorithm, VerifyFailure> {
        let curve = public_key.len();
        let algorithm: &'static dyn VerificationAlgorithm = match (self, curve) {
            (Self::Sha1WithRsa, _) => &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
            (Self::Sha256WithRsa, _) => &RSA_PKCS1_2048_8192_SHA256,
            (Self::Sha384WithRsa, _) => &RSA_PKCS1_2048_8192_SHA384,
            (Self::Sha512WithRsa, _) => &RSA_PKCS1_2048_8192_SHA512,
            (Self::Sha256WithEcdsa, P256_POINT_LEN) => &ECDSA_P256_SHA256_ASN1,
            (Self::Sha256WithEcdsa, P384_POINT_LEN) => &ECDSA_P384_SHA256_ASN1,
            (Self::Sha384WithEcdsa, P256_POINT_LEN) => &ECDSA_P256_SHA384_ASN1,
            (Self::Sha384WithEcdsa, P384_POINT_LEN) => &ECDSA_P384_SHA384_ASN1,
            (Self::Sha256WithEcdsa | Self::Sha384WithEcdsa, _) => {
                return Err(VerifyFailure::Unsupported(format!(
                    "{} with a {curve}-byte public key",
                    self.name()
                )));
            }
            (Self::Sha1WithDsa | Self::Sha256WithDsa | Self::Sha1WithEcdsa | Self::Sha512WithEcdsa, _) => {
                return Err(VerifyFailure::Unsupported(self.name().to_string()));
            }
        };
        Ok(algorithm)
    }

    /// Verifies `signature` over `message` with a certificate's raw
    /// subject public key.
    ///
    /// # Errors
    ///
    /// Returns `VerifyFailure::Unsupported` if no verifier is available at
    /// run time, or `VerifyFailure::Mismatch` if verification fails.
    pub fn verify(self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), VerifyFailure> {
        let verifier = self.verifier(public_key)?;
        UnparsedPublicKey::new(verifier, public_key)
            .verify(message, signature)
            .map_err(|_| VerifyFailure::Mismatch)
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.oid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_oid_round_trips() {
        for algorithm in ALL {
            assert_eq!(SignatureAlgorithm::from_identifier(algorithm.oid()), Some(algorithm));
            assert_eq!(SignatureAlgorithm::from_identifier(algorithm.name()), Some(algorithm));
        }
    }

    #[test]
    fn test_unknown_identifier() {
        assert!(SignatureAlgorithm::from_identifier("1.2.840.113549.1.1.4").is_none());
        assert!(SignatureAlgorithm::from_identifier("").is_none());
    }

    #[test]
    fn test_dsa_unsupported_at_run_time() {
        let result = SignatureAlgorithm::Sha1WithDsa.verify(&[0; 65], b"msg", b"sig");
        assert!(matches!(result, Err(VerifyFailure::Unsupported(_))));
    }

    #[test]
    fn test_ecdsa_unknown_curve_unsupported() {
        let result = SignatureAlgorithm::Sha256WithEcdsa.verify(&[4; 133], b"msg", b"sig");
        assert!(matches!(result, Err(VerifyFailure::Unsupported(_))));
    }

    #[test]
    fn test_rsa_modulus_bounds() {
        let rsa = SignatureAlgorithm::Sha1WithRsa;
        assert!(rsa.check_rsa_modulus(2048).is_ok());
        assert!(rsa.check_rsa_modulus(8192).is_ok());
        assert_eq!(
            rsa.check_rsa_modulus(1024),
            Err(VerifyFailure::Unsupported("SHA1withRSA with a 1024-bit key".to_string()))
        );
        assert!(rsa.check_rsa_modulus(16384).is_err());
        assert!(SignatureAlgorithm::Sha256WithEcdsa.check_rsa_modulus(256).is_ok());
    }

    #[test]
    fn test_garbage_key_is_mismatch() {
        let result = SignatureAlgorithm::Sha256WithRsa.verify(b"not a key", b"msg", b"sig");
        assert_eq!(result, Err(VerifyFailure::Mismatch));
    }
}
