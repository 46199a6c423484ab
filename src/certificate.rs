use chrono::{DateTime, Duration, Utc};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::x509::extension::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
};
use openssl::x509::{X509, X509Name, X509NameBuilder};

use crate::error::CertError;
use crate::keypair::{Curve, KeyFamily, KeyPair};
use crate::request::ResolvedParams;

/// The unsigned shape of a certificate: serial number, identity, validity
/// window and the per-family/per-role usage flags. Built once per request
/// and handed to [`sign_self`] unchanged.
#[derive(Debug, Clone)]
pub struct CertTemplate {
    /// 128-bit random serial, big-endian. Unique per issuance with
    /// overwhelming probability; issued serials are not tracked.
    pub serial: Vec<u8>,
    /// Used for CN, O and OU alike. These are single-identity certificates,
    /// not real-world subject hierarchies.
    pub subject_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// Set for RSA keys only. In TLS this usage covers RSA key exchange and
    /// means nothing for ECDSA or Ed25519 keys.
    pub key_encipherment: bool,
    /// When set the certificate carries the CA basic constraint and the
    /// certificate-signing usage bit.
    pub is_authority: bool,
    /// DNS subject-alternative-names; the hostname.
    pub dns_names: Vec<String>,
}

/// Builds the unsigned certificate template for the resolved parameters and
/// the generated key's family. Pure aside from drawing the random serial.
pub fn build_template(
    params: &ResolvedParams,
    family: KeyFamily,
) -> Result<CertTemplate, CertError> {
    let not_before = params.valid_from;
    Ok(CertTemplate {
        serial: random_serial()?,
        subject_name: params.hostname.clone(),
        not_before,
        not_after: not_before + Duration::days(params.valid_for_days),
        key_encipherment: matches!(family, KeyFamily::Rsa),
        is_authority: params.is_authority,
        dns_names: vec![params.hostname.clone()],
    })
}

/// The signed certificate together with the key pair that produced it.
/// Immutable once built.
pub struct SignedCert {
    pub x509: X509,
    key_pair: KeyPair,
}

impl SignedCert {
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Encodes both artifacts as PEM: the certificate as a `CERTIFICATE`
    /// block and the private key as a PKCS#8 `PRIVATE KEY` block. PKCS#8
    /// carries the algorithm tag, so any of the three key families can be
    /// reconstructed from it. Output is byte-identical across calls.
    pub fn to_pem(&self) -> Result<(Vec<u8>, Vec<u8>), CertError> {
        let cert_pem = self.x509.to_pem().map_err(CertError::EncodingFailed)?;
        let key_pem = self
            .key_pair
            .pkey()
            .private_key_to_pem_pkcs8()
            .map_err(CertError::EncodingFailed)?;
        Ok((cert_pem, key_pem))
    }
}

/// Self-signs the template: the same name is issuer and subject, the key
/// pair's public half is embedded and its private half produces the
/// signature. The signature digest is fixed by the key family and is not
/// configurable.
pub fn sign_self(template: &CertTemplate, key_pair: KeyPair) -> Result<SignedCert, CertError> {
    let x509 = assemble_and_sign(template, &key_pair).map_err(CertError::SigningFailed)?;
    Ok(SignedCert { x509, key_pair })
}

fn assemble_and_sign(template: &CertTemplate, key_pair: &KeyPair) -> Result<X509, ErrorStack> {
    let name = subject_name(&template.subject_name)?;

    let mut builder = X509::builder()?;
    builder.set_version(2)?;

    let serial = BigNum::from_slice(&template.serial)?.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(key_pair.pkey())?;
    let not_before = to_asn1_time(&template.not_before)?;
    builder.set_not_before(&not_before)?;
    let not_after = to_asn1_time(&template.not_after)?;
    builder.set_not_after(&not_after)?;

    if template.is_authority {
        builder.append_extension(BasicConstraints::new().critical().ca().build()?)?;
    } else {
        builder.append_extension(BasicConstraints::new().critical().build()?)?;
    }

    let mut usage = KeyUsage::new();
    usage.critical().digital_signature();
    if template.key_encipherment {
        usage.key_encipherment();
    }
    if template.is_authority {
        usage.key_cert_sign();
    }
    builder.append_extension(usage.build()?)?;

    builder.append_extension(ExtendedKeyUsage::new().server_auth().build()?)?;

    let mut san = SubjectAlternativeName::new();
    for dns in &template.dns_names {
        san.dns(dns);
    }
    builder.append_extension(san.build(&builder.x509v3_context(None, None))?)?;

    builder.sign(key_pair.pkey(), signature_digest(key_pair.family()))?;
    Ok(builder.build())
}

fn subject_name(hostname: &str) -> Result<X509Name, ErrorStack> {
    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COMMONNAME, hostname)?;
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, hostname)?;
    name.append_entry_by_nid(Nid::ORGANIZATIONALUNITNAME, hostname)?;
    Ok(name.build())
}

/// Uniform in `[0, 2^128)`, drawn from OpenSSL's secure random source.
fn random_serial() -> Result<Vec<u8>, CertError> {
    let mut serial = BigNum::new().map_err(CertError::KeyGenerationFailed)?;
    serial
        .rand(128, MsbOption::MAYBE_ZERO, false)
        .map_err(CertError::KeyGenerationFailed)?;
    Ok(serial.to_vec())
}

fn to_asn1_time(at: &DateTime<Utc>) -> Result<Asn1Time, ErrorStack> {
    Asn1Time::from_str(&at.format("%Y%m%d%H%M%SZ").to_string())
}

fn signature_digest(family: KeyFamily) -> MessageDigest {
    match family {
        KeyFamily::Rsa | KeyFamily::Ecdsa(Curve::P224) | KeyFamily::Ecdsa(Curve::P256) => {
            MessageDigest::sha256()
        }
        KeyFamily::Ecdsa(Curve::P384) => MessageDigest::sha384(),
        KeyFamily::Ecdsa(Curve::P521) => MessageDigest::sha512(),
        // Ed25519 signs the message directly; OpenSSL expects no digest.
        KeyFamily::Ed25519 => MessageDigest::null(),
    }
}
