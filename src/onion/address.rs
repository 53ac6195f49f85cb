// src/onion/address.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use super::OnionError;

/// Width of the zero-padded decimal next-hop field at the head of every layer body.
pub const ADDRESS_WIDTH: usize = 10;

/// Transport endpoint identifier. In the HTTP deployment this is a TCP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    pub const MAX: Address = Address(9_999_999_999);

    pub fn to_field(self) -> Result<String, OnionError> {
        if self > Self::MAX {
            return Err(OnionError::AddressOverflow(self.0));
        }
        Ok(format!("{:0width$}", self.0, width = ADDRESS_WIDTH))
    }

    pub fn parse_field(field: &str) -> Result<Self, OnionError> {
        if field.len() != ADDRESS_WIDTH || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OnionError::InvalidAddress);
        }
        field
            .parse()
            .map(Address)
            .map_err(|_| OnionError::InvalidAddress)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Address {
    fn from(port: u16) -> Self {
        Address(port as u64)
    }
}

/// Maps node and user identifiers onto endpoint addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPlan {
    pub relay_base: u64,
    pub user_base: u64,
}

impl AddressPlan {
    pub fn relay(&self, node_id: u32) -> Result<Address, OnionError> {
        Self::offset(self.relay_base, node_id)
    }

    pub fn user(&self, user_id: u32) -> Result<Address, OnionError> {
        Self::offset(self.user_base, user_id)
    }

    fn offset(base: u64, id: u32) -> Result<Address, OnionError> {
        match base.checked_add(id as u64) {
            Some(value) if value <= Address::MAX.0 => Ok(Address(value)),
            Some(value) => Err(OnionError::AddressOverflow(value)),
            None => Err(OnionError::AddressOverflow(base)),
        }
    }
}
