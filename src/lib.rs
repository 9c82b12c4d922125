//! Routing-record import pipeline.
//!
//! Converts heterogeneous address-assignment records (start/prefix
//! pairs or inclusive ranges) into key-grouped, supernet-coalesced CIDR
//! routing configurations and feeds them to the gateway configuration
//! service.

// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod cidr;
pub mod client;
pub mod coalesce;
pub mod config;
pub mod input;
pub mod record;
pub mod resolver;
