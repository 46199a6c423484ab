use chrono::{DateTime, Utc};

use crate::certificate::{build_template, sign_self, SignedCert};
use crate::error::CertError;
use crate::keypair;

/// Source of the two environment values parameter resolution may read: the
/// local machine's hostname and the current time. Production code uses
/// [`SystemHost`]; tests substitute a fixed implementation to pin both.
pub trait HostInfo {
    /// The machine's network name, or `None` if the lookup fails.
    fn hostname(&self) -> Option<String>;
    fn now(&self) -> DateTime<Utc>;
}

/// The real machine: `hostname::get` and the system clock.
pub struct SystemHost;

impl HostInfo for SystemHost {
    fn hostname(&self) -> Option<String> {
        hostname::get().ok().and_then(|name| name.into_string().ok())
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Parameters for one certificate request.
///
/// Every defaultable field is optional: unset fields are filled in by
/// [`resolve`](CertRequest::resolve), while a field the caller explicitly set
/// is kept as-is even when it holds a zero value (`valid_for_days(0)` yields a
/// zero-length validity window, it is not re-defaulted to a year).
///
/// `curve` and `ed25519` select the key algorithm; leaving both unset selects
/// RSA. Setting both is rejected by key generation as ambiguous.
#[derive(Debug, Clone, Default)]
pub struct CertRequest {
    hostname: Option<String>,
    valid_from: Option<DateTime<Utc>>,
    valid_for_days: Option<i64>,
    is_authority: bool,
    rsa_bits: Option<u32>,
    curve: Option<String>,
    use_ed25519: bool,
}

impl CertRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subject common name and the sole DNS name the certificate covers.
    pub fn hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Start of the validity window.
    pub fn valid_from(mut self, valid_from: DateTime<Utc>) -> Self {
        self.valid_from = Some(valid_from);
        self
    }

    /// Length of the validity window in days.
    pub fn valid_for_days(mut self, days: i64) -> Self {
        self.valid_for_days = Some(days);
        self
    }

    /// Whether this certificate may itself sign other certificates.
    pub fn is_authority(mut self, is_authority: bool) -> Self {
        self.is_authority = is_authority;
        self
    }

    /// RSA modulus size; only consulted when RSA ends up selected.
    pub fn rsa_bits(mut self, bits: u32) -> Self {
        self.rsa_bits = Some(bits);
        self
    }

    /// Select an ECDSA key on a named curve: `P224`, `P256`, `P384` or `P521`.
    pub fn curve(mut self, curve: &str) -> Self {
        self.curve = Some(curve.into());
        self
    }

    /// Select an Ed25519 key.
    pub fn ed25519(mut self, use_ed25519: bool) -> Self {
        self.use_ed25519 = use_ed25519;
        self
    }

    /// Fills every unset field with its default. Total: resolution never
    /// fails and reads nothing but the supplied [`HostInfo`]. Algorithm
    /// exclusivity is not checked here; that belongs to key generation,
    /// which sees the resolved request as a whole.
    pub fn resolve(&self, host: &impl HostInfo) -> ResolvedParams {
        ResolvedParams {
            hostname: self
                .hostname
                .clone()
                .or_else(|| host.hostname())
                .unwrap_or_else(|| "unknown".to_string()),
            valid_from: self.valid_from.unwrap_or_else(|| host.now()),
            valid_for_days: self.valid_for_days.unwrap_or(365),
            is_authority: self.is_authority,
            rsa_bits: self.rsa_bits.unwrap_or(2048),
            curve: self.curve.clone(),
            use_ed25519: self.use_ed25519,
        }
    }

    /// Runs the full pipeline: resolve defaults, generate a key pair, build
    /// the certificate template, self-sign it. Halts at the first failing
    /// stage.
    pub fn generate(&self) -> Result<SignedCert, CertError> {
        self.generate_with(&SystemHost)
    }

    /// Same as [`generate`](CertRequest::generate) with an explicit
    /// hostname/clock source.
    pub fn generate_with(&self, host: &impl HostInfo) -> Result<SignedCert, CertError> {
        let params = self.resolve(host);
        let key_pair = keypair::generate(&params)?;
        let template = build_template(&params, key_pair.family())?;
        sign_self(&template, key_pair)
    }
}

/// A fully defaulted request: the same shape as [`CertRequest`] with every
/// field populated.
#[derive(Debug, Clone)]
pub struct ResolvedParams {
    pub hostname: String,
    pub valid_from: DateTime<Utc>,
    pub valid_for_days: i64,
    pub is_authority: bool,
    pub rsa_bits: u32,
    pub curve: Option<String>,
    pub use_ed25519: bool,
}
