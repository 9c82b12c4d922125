//! Assignment records tagged with their routing key

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::cidr::{self, Cidr4};
use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;

/// Routing key of a record.
///
/// The fields are opaque operator-assigned identifiers; the pipeline
/// only ever compares them. Ordering is lexicographic in field order.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct RouteKey {
    pub service_code: String,
    pub group_id: String,
    pub net_code: String,
}

/// One CIDR block bound to a routing key
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub key: RouteKey,
    pub office_code: String,
    pub cidr: Cidr4,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cidr)
    }
}

impl Record {
    /// Create a record from an already-aligned CIDR block
    #[must_use]
    pub fn from_cidr(
        service_code: &str,
        group_id: &str,
        net_code: &str,
        office_code: &str,
        cidr: Cidr4,
    ) -> Self {
        Self {
            key: RouteKey {
                service_code: service_code.to_string(),
                group_id: group_id.to_string(),
                net_code: net_code.to_string(),
            },
            office_code: office_code.to_string(),
            cidr,
        }
    }

    /// Create a record from the textual `(ip_start, prefix)` pair of an
    /// assignment line. A start address that is not aligned to the
    /// prefix is masked down to its network.
    pub fn from_start_and_prefix(
        service_code: &str,
        group_id: &str,
        net_code: &str,
        office_code: &str,
        ip_start: &str,
        prefix: &str,
    ) -> Result<Self, cidr::Error> {
        let cidr = Cidr4::from_parts(ip_start, prefix)?;
        Ok(Self::from_cidr(
            service_code,
            group_id,
            net_code,
            office_code,
            cidr,
        ))
    }

    /// Create a record from an address and an explicit netmask; the mask
    /// must be contiguous.
    pub fn from_masked(
        service_code: &str,
        group_id: &str,
        net_code: &str,
        office_code: &str,
        addr: Ipv4Addr,
        mask: Ipv4Addr,
    ) -> Result<Self, cidr::Error> {
        let cidr = Cidr4::with_mask(addr, mask)?;
        Ok(Self::from_cidr(
            service_code,
            group_id,
            net_code,
            office_code,
            cidr,
        ))
    }

    #[must_use]
    pub const fn start_int(&self) -> u32 {
        self.cidr.network_int()
    }

    #[must_use]
    pub const fn next_start(&self) -> u32 {
        self.cidr.next_start()
    }

    /// Whether this record can be the lower half of a merged supernet
    #[must_use]
    pub const fn can_start_supernet(&self) -> bool {
        self.cidr.is_lower_sibling()
    }

    /// Parent-supernet record carrying the same key and office code
    #[must_use]
    pub fn to_parent(&self) -> Self {
        Self {
            key: self.key.clone(),
            office_code: self.office_code.clone(),
            cidr: self.cidr.parent(),
        }
    }

    /// Total order used by the coalescer: routing key, then start address
    pub fn order(a: &Self, b: &Self) -> Ordering {
        a.key.cmp(&b.key).then(a.start_int().cmp(&b.start_int()))
    }
}
