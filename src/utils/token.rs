use rand::{Rng, distr::Alphanumeric};

use crate::consts::invitation_const::KEY_LENGTH;

/// Random lowercase alphanumeric key embedded in invitation links.
pub fn generate_invitation_key() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_key_format() {
        let key = generate_invitation_key();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_keys_do_not_repeat() {
        let keys: HashSet<String> = (0..200).map(|_| generate_invitation_key()).collect();
        assert_eq!(keys.len(), 200);
    }
}
