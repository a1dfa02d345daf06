//! Credential generation
//!
//! Final identifiers minted at the end of a completed registration. The
//! enrollment machines call these exactly once per flow and keep the result;
//! identifiers are never regenerated for the same record.

use rand::distributions::Alphanumeric;
use rand::Rng;

use bharosa_core::{CustomerId, MerchantId, MerchantRef};

/// Length of the numeric merchant identifier.
pub const MERCHANT_ID_LEN: usize = 12;

/// Length of the alphanumeric merchant reference.
pub const MERCHANT_REF_LEN: usize = 12;

/// Prefix of every generated customer identifier.
pub const CUSTOMER_ID_PREFIX: &str = "BH-CUST-";

/// Length of the random suffix of a customer identifier.
pub const CUSTOMER_ID_SUFFIX_LEN: usize = 6;

/// Generate the merchant identifier pair: a fixed-length numeric primary ID
/// (leading digit non-zero) and an uppercase alphanumeric reference.
pub fn generate_merchant_credentials() -> (MerchantId, MerchantRef) {
    let mut rng = rand::thread_rng();

    let mut digits = String::with_capacity(MERCHANT_ID_LEN);
    digits.push(char::from(b'1' + rng.gen_range(0..9u8)));
    for _ in 1..MERCHANT_ID_LEN {
        digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }

    let reference: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(MERCHANT_REF_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();

    (MerchantId::new(digits), MerchantRef::new(reference))
}

/// Generate a customer identifier, e.g. `BH-CUST-7KQ2MX`.
pub fn generate_customer_id() -> CustomerId {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CUSTOMER_ID_SUFFIX_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();

    CustomerId::new(format!("{}{}", CUSTOMER_ID_PREFIX, suffix))
}
