//! Bharosa Identity Registry
//!
//! Append-only, in-memory registry of customer and merchant identities,
//! keyed by multiple alternate identifiers. Lookup by partial evidence
//! (biometric hashes, tax ID) resolves returning users; records are never
//! updated or deleted.

use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use bharosa_core::{BiometricHash, CustomerRecord, MerchantRecord};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Partial identity evidence for a customer lookup.
///
/// Keys may be missing; a missing key is skipped, never an error.
#[derive(Debug, Clone, Default)]
pub struct CustomerEvidence {
    pub fingerprint: Option<BiometricHash>,
    pub face: Option<BiometricHash>,
}

impl CustomerEvidence {
    fn matches(&self, record: &CustomerRecord) -> bool {
        hash_matches(self.fingerprint.as_ref(), record.fingerprint_hash.as_ref())
            || hash_matches(self.face.as_ref(), record.face_hash.as_ref())
    }
}

/// Partial identity evidence for a merchant lookup.
#[derive(Debug, Clone, Default)]
pub struct MerchantEvidence {
    pub tax_id: Option<String>,
    pub fingerprint: Option<BiometricHash>,
    pub face: Option<BiometricHash>,
}

impl MerchantEvidence {
    fn matches(&self, record: &MerchantRecord) -> bool {
        let tax_match = self
            .tax_id
            .as_deref()
            .map(|tax_id| !tax_id.is_empty() && tax_id == record.tax_id)
            .unwrap_or(false);

        tax_match
            || hash_matches(self.fingerprint.as_ref(), record.fingerprint_hash.as_ref())
            || hash_matches(self.face.as_ref(), record.face_hash.as_ref())
    }
}

fn hash_matches(supplied: Option<&BiometricHash>, stored: Option<&BiometricHash>) -> bool {
    match (supplied, stored) {
        (Some(supplied), Some(stored)) => !supplied.as_str().is_empty() && supplied == stored,
        _ => false,
    }
}

/// Trait for identity storage backends
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Append a customer record
    async fn add_customer(&self, record: CustomerRecord) -> Result<(), RegistryError>;

    /// Append a merchant record
    async fn add_merchant(&self, record: MerchantRecord) -> Result<(), RegistryError>;

    /// Resolve partial evidence to a registered customer.
    ///
    /// Returns the first record, in insertion order, for which any supplied
    /// non-empty key equals the stored key.
    async fn find_customer_by_identity(
        &self,
        evidence: &CustomerEvidence,
    ) -> Result<Option<CustomerRecord>, RegistryError>;

    /// Resolve partial evidence to a registered merchant
    async fn find_merchant_by_identity(
        &self,
        evidence: &MerchantEvidence,
    ) -> Result<Option<MerchantRecord>, RegistryError>;

    /// Exact-match lookup by customer identifier
    async fn find_customer_by_id(&self, id: &str)
        -> Result<Option<CustomerRecord>, RegistryError>;

    /// Exact-match lookup by merchant identifier or reference
    async fn find_merchant_by_id(&self, id: &str)
        -> Result<Option<MerchantRecord>, RegistryError>;

    /// All registered customers, in insertion order
    async fn customers(&self) -> Result<Vec<CustomerRecord>, RegistryError>;

    /// All registered merchants, in insertion order
    async fn merchants(&self) -> Result<Vec<MerchantRecord>, RegistryError>;
}

/// In-memory registry, constructed once per process (or per test) and
/// injected into the flows that need it.
///
/// Records live in `Vec`s: insertion order is load-bearing, because a lookup
/// satisfied by several records resolves to the earliest insert.
pub struct InMemoryRegistry {
    customers: RwLock<Vec<CustomerRecord>>,
    merchants: RwLock<Vec<MerchantRecord>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            customers: RwLock::new(Vec::new()),
            merchants: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for InMemoryRegistry {
    async fn add_customer(&self, record: CustomerRecord) -> Result<(), RegistryError> {
        let mut customers = self
            .customers
            .write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        customers.push(record);
        Ok(())
    }

    async fn add_merchant(&self, record: MerchantRecord) -> Result<(), RegistryError> {
        let mut merchants = self
            .merchants
            .write()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        merchants.push(record);
        Ok(())
    }

    async fn find_customer_by_identity(
        &self,
        evidence: &CustomerEvidence,
    ) -> Result<Option<CustomerRecord>, RegistryError> {
        let customers = self
            .customers
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(customers.iter().find(|c| evidence.matches(c)).cloned())
    }

    async fn find_merchant_by_identity(
        &self,
        evidence: &MerchantEvidence,
    ) -> Result<Option<MerchantRecord>, RegistryError> {
        let merchants = self
            .merchants
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(merchants.iter().find(|m| evidence.matches(m)).cloned())
    }

    async fn find_customer_by_id(
        &self,
        id: &str,
    ) -> Result<Option<CustomerRecord>, RegistryError> {
        let customers = self
            .customers
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(customers.iter().find(|c| c.has_id(id)).cloned())
    }

    async fn find_merchant_by_id(
        &self,
        id: &str,
    ) -> Result<Option<MerchantRecord>, RegistryError> {
        let merchants = self
            .merchants
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(merchants.iter().find(|m| m.has_id(id)).cloned())
    }

    async fn customers(&self) -> Result<Vec<CustomerRecord>, RegistryError> {
        let customers = self
            .customers
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(customers.clone())
    }

    async fn merchants(&self) -> Result<Vec<MerchantRecord>, RegistryError> {
        let merchants = self
            .merchants
            .read()
            .map_err(|e| RegistryError::Storage(e.to_string()))?;
        Ok(merchants.clone())
    }
}
