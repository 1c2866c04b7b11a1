//! Client certificate model for mutual-TLS authentication (RFC 8705)
//!
//! The transport layer terminates TLS and hands the peer certificate to the
//! authenticators, either pre-parsed (when the proxy forwards header fields)
//! or as DER. [`ClientCertificate`] keeps exactly the material the two mTLS
//! methods need: the subject DN and SAN entries for CA-issued binding, and
//! the public key in JWK-comparable components for self-signed binding.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk};
use thiserror::Error;
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// Certificate decoding failures.
#[derive(Debug, Clone, Error)]
pub enum CertificateError {
    /// The DER bytes do not parse as an X.509 certificate.
    #[error("malformed certificate: {0}")]
    Malformed(String),
    /// The certificate key type is neither RSA nor a supported EC curve.
    #[error("unsupported certificate public key: {0}")]
    UnsupportedKey(String),
}

/// The certificate's public key, reduced to the components a JWK carries.
///
/// All byte fields are base64url without padding and with leading zero
/// octets stripped, so equality against JWK parameters is a direct string
/// comparison after renormalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateKey {
    /// RSA public key.
    Rsa {
        /// Modulus.
        n: String,
        /// Public exponent.
        e: String,
    },
    /// Elliptic curve public key on a named curve.
    Ec {
        /// Curve name (`P-256`, `P-384`, `P-521`).
        crv: String,
        /// X coordinate.
        x: String,
        /// Y coordinate.
        y: String,
    },
}

/// A parsed peer TLS certificate.
#[derive(Debug, Clone)]
pub struct ClientCertificate {
    /// Subject distinguished name, RFC 4514 string form.
    pub subject_dn: Option<String>,
    /// SAN dNSName entries.
    pub san_dns: Vec<String>,
    /// SAN uniformResourceIdentifier entries.
    pub san_uri: Vec<String>,
    /// SAN iPAddress entries, text form.
    pub san_ip: Vec<String>,
    /// SAN rfc822Name entries.
    pub san_email: Vec<String>,
    /// Public key.
    pub key: CertificateKey,
}

impl ClientCertificate {
    /// Decode a DER-encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] when the bytes are not a certificate or
    /// the public key is of an unsupported type.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (_, certificate) = parse_x509_certificate(der)
            .map_err(|e| CertificateError::Malformed(e.to_string()))?;

        let subject_dn = Some(certificate.subject().to_string());

        let mut san_dns = Vec::new();
        let mut san_uri = Vec::new();
        let mut san_ip = Vec::new();
        let mut san_email = Vec::new();
        if let Ok(Some(extension)) = certificate.subject_alternative_name() {
            for name in &extension.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => san_dns.push((*dns).to_string()),
                    GeneralName::URI(uri) => san_uri.push((*uri).to_string()),
                    GeneralName::RFC822Name(email) => san_email.push((*email).to_string()),
                    GeneralName::IPAddress(bytes) => {
                        if let Some(ip) = format_ip(bytes) {
                            san_ip.push(ip);
                        }
                    }
                    _ => {}
                }
            }
        }

        let key = extract_key(certificate.public_key())?;

        Ok(Self {
            subject_dn,
            san_dns,
            san_uri,
            san_ip,
            san_email,
            key,
        })
    }

    /// Whether this certificate's public key is the key described by `jwk`.
    ///
    /// RSA keys match on modulus and exponent; EC keys match on curve and
    /// both point coordinates. Key ids, algorithms, and use hints on the JWK
    /// are ignored.
    pub fn matches_key(&self, jwk: &Jwk) -> bool {
        match (&self.key, &jwk.algorithm) {
            (CertificateKey::Rsa { n, e }, AlgorithmParameters::RSA(params)) => {
                b64url_eq(n, &params.n) && b64url_eq(e, &params.e)
            }
            (CertificateKey::Ec { crv, x, y }, AlgorithmParameters::EllipticCurve(params)) => {
                curve_name(&params.curve) == Some(crv.as_str())
                    && b64url_eq(x, &params.x)
                    && b64url_eq(y, &params.y)
            }
            _ => false,
        }
    }
}

fn extract_key(spki: &SubjectPublicKeyInfo<'_>) -> Result<CertificateKey, CertificateError> {
    match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => Ok(CertificateKey::Rsa {
            n: encode_unsigned(rsa.modulus),
            e: encode_unsigned(rsa.exponent),
        }),
        Ok(PublicKey::EC(point)) => {
            let crv = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|params| params.as_oid().ok())
                .and_then(|oid| match oid.to_id_string().as_str() {
                    "1.2.840.10045.3.1.7" => Some("P-256"),
                    "1.3.132.0.34" => Some("P-384"),
                    "1.3.132.0.35" => Some("P-521"),
                    _ => None,
                })
                .ok_or_else(|| CertificateError::UnsupportedKey("unknown EC curve".into()))?;

            // SEC 1 uncompressed point: 0x04 || X || Y.
            let data = point.data();
            if data.first() != Some(&0x04) || data.len() % 2 != 1 {
                return Err(CertificateError::UnsupportedKey(
                    "EC point is not in uncompressed form".into(),
                ));
            }
            let coordinate_len = (data.len() - 1) / 2;
            Ok(CertificateKey::Ec {
                crv: crv.to_string(),
                x: encode_unsigned(&data[1..=coordinate_len]),
                y: encode_unsigned(&data[1 + coordinate_len..]),
            })
        }
        Ok(other) => Err(CertificateError::UnsupportedKey(format!("{other:?}"))),
        Err(e) => Err(CertificateError::Malformed(e.to_string())),
    }
}

fn format_ip(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(std::net::Ipv4Addr::from(octets).to_string())
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(std::net::Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

/// Base64url-encode big-endian unsigned bytes, minus any leading zero octets
/// (DER integers are signed and may carry a zero pad; JWK parameters are
/// minimal unsigned).
fn encode_unsigned(bytes: &[u8]) -> String {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    URL_SAFE_NO_PAD.encode(&bytes[start..])
}

/// Compare two base64url values by decoded content, tolerating padding and
/// non-minimal encodings on the JWK side.
fn b64url_eq(left: &str, right: &str) -> bool {
    match (decode_lenient(left), decode_lenient(right)) {
        (Some(a), Some(b)) => strip_leading_zeros(&a) == strip_leading_zeros(&b),
        _ => false,
    }
}

fn decode_lenient(value: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(value.trim_end_matches('=')).ok()
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn curve_name(curve: &EllipticCurve) -> Option<&'static str> {
    match curve {
        EllipticCurve::P256 => Some("P-256"),
        EllipticCurve::P384 => Some("P-384"),
        EllipticCurve::P521 => Some("P-521"),
        EllipticCurve::Ed25519 => None,
    }
}
