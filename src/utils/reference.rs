// utils/reference.rs
use rand::distr::Alphanumeric;
use rand::Rng;

/// Ledger reference, e.g. `MH_4F2A9C01D3E7B6A5`.
pub fn generate_transaction_reference() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("MH_{}", &id[..16])
}

/// Opaque url-safe token for email verification and password reset links.
pub fn generate_url_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_reference_shape() {
        let reference = generate_transaction_reference();
        assert!(reference.starts_with("MH_"));
        assert_eq!(reference.len(), 19);
        assert!(reference[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn url_tokens_are_unique() {
        let a = generate_url_token();
        let b = generate_url_token();
        assert_eq!(a.len(), 48);
        assert_ne!(a, b);
    }
}
