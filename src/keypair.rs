use std::str::FromStr;

use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;

use crate::error::CertError;
use crate::request::ResolvedParams;

/// The named ECDSA curves this crate can generate keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    P224,
    P256,
    P384,
    P521,
}

impl Curve {
    fn nid(self) -> Nid {
        match self {
            Curve::P224 => Nid::SECP224R1,
            Curve::P256 => Nid::X9_62_PRIME256V1,
            Curve::P384 => Nid::SECP384R1,
            Curve::P521 => Nid::SECP521R1,
        }
    }
}

impl FromStr for Curve {
    type Err = CertError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "P224" => Ok(Curve::P224),
            "P256" => Ok(Curve::P256),
            "P384" => Ok(Curve::P384),
            "P521" => Ok(Curve::P521),
            other => Err(CertError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// The algorithm family of a generated key pair.
///
/// Every downstream decision that depends on the algorithm (key usage bits,
/// signature digest, encoding) matches on this exhaustively, so supporting a
/// new algorithm means extending this enum and following the compile errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ecdsa(Curve),
    Ed25519,
}

/// A freshly generated private/public key pair together with its family tag.
///
/// Generated once per request and owned by that request until handed to the
/// caller; never pooled or cached.
pub struct KeyPair {
    family: KeyFamily,
    pkey: PKey<Private>,
}

impl KeyPair {
    pub fn family(&self) -> KeyFamily {
        self.family
    }

    pub fn pkey(&self) -> &PKey<Private> {
        &self.pkey
    }
}

/// Generates a key pair for the algorithm the resolved parameters select:
/// a named curve picks ECDSA, otherwise `use_ed25519` picks Ed25519,
/// otherwise RSA of `rsa_bits` bits.
///
/// Naming a curve and requesting Ed25519 together fails as ambiguous, and an
/// unknown curve name fails as unsupported; both are rejected before any
/// entropy is consumed. Generation failures are fatal to the request, there
/// are no retries.
pub fn generate(params: &ResolvedParams) -> Result<KeyPair, CertError> {
    let family = select_family(params)?;
    let pkey = match family {
        KeyFamily::Ecdsa(curve) => {
            let group =
                EcGroup::from_curve_name(curve.nid()).map_err(CertError::KeyGenerationFailed)?;
            let key = EcKey::generate(&group).map_err(CertError::KeyGenerationFailed)?;
            PKey::from_ec_key(key).map_err(CertError::KeyGenerationFailed)?
        }
        KeyFamily::Ed25519 => PKey::generate_ed25519().map_err(CertError::KeyGenerationFailed)?,
        KeyFamily::Rsa => {
            let rsa = Rsa::generate(params.rsa_bits).map_err(CertError::KeyGenerationFailed)?;
            PKey::from_rsa(rsa).map_err(CertError::KeyGenerationFailed)?
        }
    };
    Ok(KeyPair { family, pkey })
}

fn select_family(params: &ResolvedParams) -> Result<KeyFamily, CertError> {
    match (params.curve.as_deref(), params.use_ed25519) {
        (Some(_), true) => Err(CertError::AmbiguousAlgorithmSelection),
        (Some(name), false) => Ok(KeyFamily::Ecdsa(name.parse()?)),
        (None, true) => Ok(KeyFamily::Ed25519),
        (None, false) => Ok(KeyFamily::Rsa),
    }
}
