//! Account addresses in `workchain:hex` form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Hash256, TypesError};

/// A standard account address: workchain plus 256-bit account id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    pub workchain: i32,
    pub account: Hash256,
}

impl Address {
    pub fn new(workchain: i32, account: [u8; 32]) -> Self {
        Self {
            workchain,
            account: Hash256::new(account),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, self.account)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (wc, account) = s
            .split_once(':')
            .ok_or_else(|| TypesError::InvalidAddress(s.to_string()))?;
        let workchain = wc
            .parse::<i32>()
            .map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        let account = account
            .parse::<Hash256>()
            .map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        Ok(Self { workchain, account })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_form() {
        let text = format!("-1:{}", "33".repeat(32));
        let addr: Address = text.parse().unwrap();
        assert_eq!(addr.workchain, -1);
        assert_eq!(addr.to_string(), text);
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!("0abcdef".parse::<Address>().is_err());
    }
}
