//! Identity records for the Bharosa trust network
//!
//! Two entity kinds are registered on the network: customers and merchants.
//! Records are append-only; identifiers are unique and immutable once
//! assigned, and a biometric hash is never reassigned to a different record
//! (a collision is an identity match, not an overwrite).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Exact length of a government identity number.
pub const GOVERNMENT_ID_LEN: usize = 12;

/// Exact length of a phone number.
pub const PHONE_LEN: usize = 10;

/// Full length of a tax identifier as entered.
pub const TAX_ID_LEN: usize = 10;

/// Minimum accepted tax identifier length.
pub const TAX_ID_MIN_LEN: usize = 5;

/// Unique identifier for a registered customer (e.g. `BH-CUST-7KQ2MX`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary merchant identifier: a fixed-length numeric string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerchantId(pub String);

impl MerchantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MerchantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secondary merchant reference: an uppercase alphanumeric string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerchantRef(pub String);

impl MerchantRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MerchantRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque stand-in for a captured fingerprint or face scan.
///
/// The value is treated as sensitive and wiped from memory on drop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct BiometricHash(String);

impl BiometricHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Declared annual income bracket for a merchant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeBracket {
    /// 0 – 2 Lakh
    #[serde(rename = "0-2")]
    UpToTwo,
    /// 2 – 6 Lakh
    #[serde(rename = "2-6")]
    TwoToSix,
    /// 6 – 8 Lakh
    #[serde(rename = "6-8")]
    SixToEight,
    /// 8 Lakh and above
    #[serde(rename = "8+")]
    EightPlus,
}

impl IncomeBracket {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "0-2" => Some(IncomeBracket::UpToTwo),
            "2-6" => Some(IncomeBracket::TwoToSix),
            "6-8" => Some(IncomeBracket::SixToEight),
            "8+" => Some(IncomeBracket::EightPlus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeBracket::UpToTwo => "0-2",
            IncomeBracket::TwoToSix => "2-6",
            IncomeBracket::SixToEight => "6-8",
            IncomeBracket::EightPlus => "8+",
        }
    }
}

/// A registered customer identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Account holder name
    pub name: String,

    /// 10-digit phone number
    pub phone: String,

    /// Whether a fingerprint scan was verified at registration
    pub fingerprint_verified: bool,

    /// Whether a face scan was verified at registration
    pub face_verified: bool,

    /// Generated customer identifier, immutable once assigned
    pub customer_id: CustomerId,

    /// Fingerprint hash, if captured
    pub fingerprint_hash: Option<BiometricHash>,

    /// Face hash, if captured
    pub face_hash: Option<BiometricHash>,
}

impl CustomerRecord {
    /// Whether the given claimed identifier addresses this record
    pub fn has_id(&self, claimed: &str) -> bool {
        self.customer_id.as_str() == claimed
    }
}

/// A registered merchant identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRecord {
    /// Business owner name
    pub owner_name: String,

    /// 12-digit government identity number
    pub government_id: String,

    /// 10-digit phone number
    pub phone: String,

    /// Legal name as carried on the tax card
    pub legal_name: String,

    /// Date of birth
    pub date_of_birth: NaiveDate,

    /// Secondary government tax identifier (also an identity-match key)
    pub tax_id: String,

    /// Declared income bracket
    pub income: IncomeBracket,

    /// Confirmed business location, if captured
    pub location: Option<String>,

    /// Whether a fingerprint scan was verified at registration
    pub fingerprint_verified: bool,

    /// Whether a face scan was verified at registration
    pub face_verified: bool,

    /// Generated numeric merchant identifier, immutable once assigned
    pub merchant_id: MerchantId,

    /// Generated alphanumeric reference, immutable once assigned
    pub reference: MerchantRef,

    /// Fingerprint hash, if captured
    pub fingerprint_hash: Option<BiometricHash>,

    /// Face hash, if captured
    pub face_hash: Option<BiometricHash>,
}

impl MerchantRecord {
    /// Whether the claimed identifier equals the primary id or the reference
    pub fn has_id(&self, claimed: &str) -> bool {
        self.merchant_id.as_str() == claimed || self.reference.as_str() == claimed
    }

    /// Government ID masked for review display: `XXXX XXXX 1234`
    pub fn masked_government_id(&self) -> String {
        mask_government_id(&self.government_id)
    }

    /// Tax ID masked for review display
    pub fn masked_tax_id(&self) -> String {
        mask_tax_id()
    }
}

/// Mask a government ID for display, keeping the last four digits.
pub fn mask_government_id(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("XXXX XXXX {}", tail)
}

/// Mask a tax ID for display; the full value is never shown back.
pub fn mask_tax_id() -> String {
    "X".repeat(10)
}
