//! Seed data for development and testing
//!
//! Provides the prototype's known identities, merchant standings and bank
//! offers for local development. The seeded customer's phone number drives
//! the returning-user demo: biometric captures for it reproduce the hashes
//! stored here.

use chrono::NaiveDate;
use serde::Serialize;

use bharosa_core::{
    BiometricHash, CustomerId, CustomerRecord, IncomeBracket, MerchantId, MerchantRecord,
    MerchantRef, TrustScore,
};
use bharosa_enroll::verify::{DEMO_SEED_FACE, DEMO_SEED_FINGERPRINT, DEMO_SEED_PHONE};
use bharosa_registry::{IdentityStore, InMemoryRegistry};
use bharosa_reputation::{LoanOffer, MerchantStanding, ReputationLedger};

/// All seed data for the demo
#[derive(Clone, Serialize)]
pub struct SeedData {
    pub customers: Vec<CustomerRecord>,
    pub merchants: Vec<MerchantRecord>,
    pub standings: Vec<MerchantStanding>,
    pub offers: Vec<LoanOffer>,
}

impl SeedData {
    /// Generate seed data for development
    pub fn generate() -> Self {
        Self {
            customers: Self::create_customers(),
            merchants: Self::create_merchants(),
            standings: Self::create_standings(),
            offers: Self::create_offers(),
        }
    }

    /// Load the seed data into a registry and ledger.
    pub async fn apply(
        &self,
        registry: &InMemoryRegistry,
        ledger: &ReputationLedger,
    ) -> anyhow::Result<()> {
        for customer in &self.customers {
            registry.add_customer(customer.clone()).await?;
        }
        for merchant in &self.merchants {
            registry.add_merchant(merchant.clone()).await?;
        }
        for standing in &self.standings {
            ledger.register(standing.clone())?;
        }
        Ok(())
    }

    fn create_customers() -> Vec<CustomerRecord> {
        vec![CustomerRecord {
            name: "Conference Carl".to_string(),
            phone: DEMO_SEED_PHONE.to_string(),
            fingerprint_verified: true,
            face_verified: true,
            customer_id: CustomerId::new("BH-CUST-PROTOTYPE"),
            fingerprint_hash: Some(BiometricHash::new(DEMO_SEED_FINGERPRINT)),
            face_hash: Some(BiometricHash::new(DEMO_SEED_FACE)),
        }]
    }

    fn create_merchants() -> Vec<MerchantRecord> {
        vec![MerchantRecord {
            owner_name: "Verma Ji".to_string(),
            government_id: "123412341234".to_string(),
            phone: "8888888888".to_string(),
            legal_name: "VERMA JI".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1)
                .unwrap_or_default(),
            tax_id: "ABCDE1234F".to_string(),
            income: IncomeBracket::EightPlus,
            location: Some("Digital Plaza".to_string()),
            fingerprint_verified: true,
            face_verified: true,
            merchant_id: MerchantId::new("S-8821"),
            reference: MerchantRef::new("VERMA8821"),
            fingerprint_hash: Some(BiometricHash::new("fp-v88")),
            face_hash: Some(BiometricHash::new("face-v88")),
        }]
    }

    fn create_standings() -> Vec<MerchantStanding> {
        vec![
            MerchantStanding::new(
                MerchantId::new("S-8821"),
                "Verma Electronics",
                "Digital Plaza",
                TrustScore::new(742),
            )
            .with_history(4.8, 124),
            MerchantStanding::new(
                MerchantId::new("S-4412"),
                "Sharma General Store",
                "Old Market Road",
                TrustScore::new(510),
            )
            .with_history(3.5, 45),
            MerchantStanding::new(
                MerchantId::new("S-0092"),
                "Singh Auto Parts",
                "Highway Cross",
                TrustScore::new(340),
            )
            .with_history(2.1, 88),
        ]
    }

    fn create_offers() -> Vec<LoanOffer> {
        vec![
            LoanOffer {
                id: "b1".to_string(),
                bank_name: "Standard Trust Bank".to_string(),
                max_amount: 500_000,
                base_interest: 6.97,
                min_score: 700,
            },
            LoanOffer {
                id: "b2".to_string(),
                bank_name: "National Merchant Corp".to_string(),
                max_amount: 200_000,
                base_interest: 7.47,
                min_score: 500,
            },
            LoanOffer {
                id: "b3".to_string(),
                bank_name: "FastCredit Finance".to_string(),
                max_amount: 50_000,
                base_interest: 8.47,
                min_score: 300,
            },
            LoanOffer {
                id: "b4".to_string(),
                bank_name: "Sovereign Capital".to_string(),
                max_amount: 1_000_000,
                base_interest: 5.47,
                min_score: 800,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_data_applies_cleanly() {
        let registry = InMemoryRegistry::new();
        let ledger = ReputationLedger::new();
        let seeds = SeedData::generate();

        seeds.apply(&registry, &ledger).await.unwrap();

        // The seeded customer is matchable by its fingerprint hash.
        let found = registry
            .find_customer_by_identity(&bharosa_registry::CustomerEvidence {
                fingerprint: Some(BiometricHash::new(DEMO_SEED_FINGERPRINT)),
                face: None,
            })
            .await
            .unwrap();
        assert_eq!(
            found.map(|c| c.customer_id),
            Some(CustomerId::new("BH-CUST-PROTOTYPE"))
        );

        // The seeded merchant is addressable by either identifier.
        assert!(registry.find_merchant_by_id("S-8821").await.unwrap().is_some());
        assert!(registry
            .find_merchant_by_id("VERMA8821")
            .await
            .unwrap()
            .is_some());

        let standing = ledger
            .standing(&MerchantId::new("S-8821"))
            .unwrap()
            .unwrap();
        assert_eq!(standing.score.value(), 742);
        assert_eq!(seeds.offers.len(), 4);
    }
}
