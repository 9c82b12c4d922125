//! Supernet coalescing and grouped-document assembly

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::record::Record;
use serde::Serialize;

/// A maximal run of address-adjacent records sharing one routing key.
///
/// The run is the unit of reduction: only records inside the same
/// bucket can merge into a parent supernet.
#[derive(Debug, Default)]
struct Bucket(Vec<Record>);

impl Bucket {
    /// Whether a record extends this run: same routing key and its
    /// network starts exactly where the run currently ends.
    fn accepts(&self, rec: &Record) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => {
                first.key == rec.key && last.next_start() == rec.start_int()
            }
            _ => true,
        }
    }

    /// Merge adjacent sibling blocks until a pass stops shrinking the run
    fn reduce(self) -> Vec<Record> {
        let mut recs = self.0;
        while recs.len() > 1 {
            let merged = reduce_pass(&recs);
            if merged.len() == recs.len() {
                break;
            }
            recs = merged;
        }
        recs
    }
}

/// One left-to-right merge pass over a bucket.
///
/// A record absorbs its successor iff it is the lower half of a parent
/// block and the successor has the same prefix length; adjacency holds
/// by bucket construction. A merge can create a new equal-prefix
/// adjacency, which the next pass picks up.
fn reduce_pass(recs: &[Record]) -> Vec<Record> {
    let mut merged = Vec::with_capacity(recs.len());
    let mut i = 0;
    while i < recs.len() {
        let rec = &recs[i];
        let sibling = recs
            .get(i + 1)
            .filter(|next| rec.can_start_supernet() && next.cidr.prefix() == rec.cidr.prefix());
        match sibling {
            Some(next) => {
                let parent = rec.to_parent();
                log::debug!(
                    "[{}, {}, {}] merge [{}, {}] to [{}]",
                    rec.key.service_code,
                    rec.key.group_id,
                    rec.key.net_code,
                    rec,
                    next,
                    parent
                );
                merged.push(parent);
                i += 2;
            }
            None => {
                merged.push(rec.clone());
                i += 1;
            }
        }
    }
    merged
}

/// Sort records, segment them into adjacency runs, and reduce each run
/// to its fixed point.
///
/// The result is deterministic for a given multiset of records: the
/// sort is stable over the `(service_code, group_id, net_code,
/// start_int)` total order and reduction is a pure function of the
/// sorted sequence. No consecutive same-key pair of the output can be
/// merged further.
#[must_use]
pub fn coalesce(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by(Record::order);
    let mut out = Vec::with_capacity(records.len());
    let mut bucket = Bucket::default();
    for rec in records {
        if !bucket.accepts(&rec) {
            out.extend(std::mem::take(&mut bucket).reduce());
        }
        bucket.0.push(rec);
    }
    // the trailing run reduces and flushes like any other
    out.extend(bucket.reduce());
    out
}

/// `{ netMaskAddress, netCode }` leaf of the submission document
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NetmaskEntry {
    #[serde(rename = "netMaskAddress")]
    pub netmask: String,
    #[serde(rename = "netCode")]
    pub net_code: String,
}

/// CIDR list of one group id
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupBlock {
    #[serde(rename = "glbId")]
    pub group_id: String,
    #[serde(rename = "netMaskAddressList")]
    pub netmasks: Vec<NetmaskEntry>,
}

/// Group list of one service code
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ServiceBlock {
    #[serde(rename = "serviceCode")]
    pub service_code: String,
    #[serde(rename = "glbIdNetMaskList")]
    pub groups: Vec<GroupBlock>,
}

/// Assemble the grouped document from a coalesced record stream.
///
/// Walks the records in order, starting a new service block whenever
/// the service code changes and a new group block whenever the group id
/// changes. A service change also resets the group anchor, so equal
/// group ids under different services never share a block.
#[must_use]
pub fn group(records: &[Record]) -> Vec<ServiceBlock> {
    let mut services: Vec<ServiceBlock> = Vec::new();
    for rec in records {
        if services.last().map(|s| s.service_code.as_str()) != Some(rec.key.service_code.as_str())
        {
            services.push(ServiceBlock {
                service_code: rec.key.service_code.clone(),
                groups: Vec::new(),
            });
        }
        let Some(service) = services.last_mut() else {
            continue;
        };
        if service.groups.last().map(|g| g.group_id.as_str())
            != Some(rec.key.group_id.as_str())
        {
            service.groups.push(GroupBlock {
                group_id: rec.key.group_id.clone(),
                netmasks: Vec::new(),
            });
        }
        if let Some(block) = service.groups.last_mut() {
            block.netmasks.push(NetmaskEntry {
                netmask: rec.to_string(),
                net_code: rec.key.net_code.clone(),
            });
        }
    }
    services
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(service: &str, group: &str, net: &str, cidr: &str) -> Record {
        Record::from_cidr(service, group, net, "O1", cidr.parse().unwrap())
    }

    fn cidrs(recs: &[Record]) -> Vec<String> {
        recs.iter().map(Record::to_string).collect()
    }

    /// Total addresses covered per routing key, for coverage checks
    fn coverage(recs: &[Record]) -> std::collections::HashMap<crate::record::RouteKey, u64> {
        let mut cover = std::collections::HashMap::new();
        for r in recs {
            *cover.entry(r.key.clone()).or_default() += 1u64 << (32 - r.cidr.prefix());
        }
        cover
    }

    #[test]
    fn test_two_siblings_merge_to_parent() {
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/25"),
            rec("A", "G1", "N", "10.0.0.128/25"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.0/24"]);
    }

    #[test]
    fn test_unaligned_adjacent_pair_is_kept() {
        // adjacent but the left block is not aligned to /24
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.128/25"),
            rec("A", "G1", "N", "10.0.1.0/25"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.128/25", "10.0.1.0/25"]);
    }

    #[test]
    fn test_merging_runs_to_fixed_point() {
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/26"),
            rec("A", "G1", "N", "10.0.0.64/26"),
            rec("A", "G1", "N", "10.0.0.128/26"),
            rec("A", "G1", "N", "10.0.0.192/26"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.0/24"]);
    }

    #[test]
    fn test_mixed_prefixes_cascade() {
        // the /26 pair merges first, then the resulting /25 merges up
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/25"),
            rec("A", "G1", "N", "10.0.0.128/26"),
            rec("A", "G1", "N", "10.0.0.192/26"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.0/24"]);
    }

    #[test]
    fn test_distinct_keys_never_merge() {
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/25"),
            rec("A", "G2", "N", "10.0.0.128/25"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.0/25", "10.0.0.128/25"]);
        let doc = group(&out);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc[0].groups.len(), 2);
    }

    #[test]
    fn test_distinct_net_codes_never_merge() {
        let out = coalesce(vec![
            rec("A", "G1", "N1", "10.0.0.0/25"),
            rec("A", "G1", "N2", "10.0.0.128/25"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.0/25", "10.0.0.128/25"]);
    }

    #[test]
    fn test_gap_splits_the_run() {
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/25"),
            rec("A", "G1", "N", "10.0.1.128/25"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.0/25", "10.0.1.128/25"]);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/26"),
            rec("A", "G1", "N", "10.0.0.64/26"),
            rec("B", "G1", "N", "10.0.0.0/25"),
        ]);
        let shuffled = coalesce(vec![
            rec("B", "G1", "N", "10.0.0.0/25"),
            rec("A", "G1", "N", "10.0.0.64/26"),
            rec("A", "G1", "N", "10.0.0.0/26"),
        ]);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_coalesce_is_idempotent_and_non_increasing() {
        let input = vec![
            rec("A", "G1", "N", "10.0.0.0/26"),
            rec("A", "G1", "N", "10.0.0.64/26"),
            rec("A", "G1", "N", "10.0.0.128/25"),
            rec("A", "G1", "N", "10.0.2.0/24"),
            rec("A", "G2", "N", "172.16.0.0/24"),
            rec("B", "G1", "N", "10.0.0.0/26"),
        ];
        let once = coalesce(input.clone());
        assert!(once.len() <= input.len());
        assert_eq!(coverage(&once), coverage(&input));
        let twice = coalesce(once.clone());
        assert_eq!(twice, once);
    }

    #[test]
    fn test_no_false_adjacency_across_the_wrap() {
        // 255.255.255.0/24 wraps to 0; it must not absorb a 0.0.0.0 block
        let out = coalesce(vec![
            rec("A", "G1", "N", "255.255.255.0/24"),
            rec("A", "G1", "N", "0.0.0.0/24"),
        ]);
        assert_eq!(cidrs(&out), ["0.0.0.0/24", "255.255.255.0/24"]);
    }

    #[test]
    fn test_trailing_run_is_flushed() {
        // the final bucket has no successor record to close it
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/25"),
            rec("B", "G9", "N", "10.0.0.0/25"),
            rec("B", "G9", "N", "10.0.0.128/25"),
        ]);
        assert_eq!(cidrs(&out), ["10.0.0.0/25", "10.0.0.0/24"]);
    }

    #[test]
    fn test_duplicate_records_are_preserved_not_rejected() {
        let out = coalesce(vec![
            rec("A", "G1", "N", "10.0.0.0/25"),
            rec("A", "G1", "N", "10.0.0.0/25"),
        ]);
        // equal start breaks adjacency, so the duplicate opens its own run
        assert_eq!(cidrs(&out), ["10.0.0.0/25", "10.0.0.0/25"]);
    }

    #[test]
    fn test_group_assembly_and_wire_names() {
        let merged = coalesce(vec![
            rec("A", "G1", "N1", "10.0.0.0/25"),
            rec("A", "G1", "N1", "10.0.0.128/25"),
            rec("A", "G2", "N2", "172.16.0.0/24"),
            rec("B", "G2", "N1", "192.168.0.0/24"),
        ]);
        let doc = group(&merged);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!([
                {
                    "serviceCode": "A",
                    "glbIdNetMaskList": [
                        {
                            "glbId": "G1",
                            "netMaskAddressList": [
                                { "netMaskAddress": "10.0.0.0/24", "netCode": "N1" }
                            ]
                        },
                        {
                            "glbId": "G2",
                            "netMaskAddressList": [
                                { "netMaskAddress": "172.16.0.0/24", "netCode": "N2" }
                            ]
                        }
                    ]
                },
                {
                    "serviceCode": "B",
                    "glbIdNetMaskList": [
                        {
                            "glbId": "G2",
                            "netMaskAddressList": [
                                { "netMaskAddress": "192.168.0.0/24", "netCode": "N1" }
                            ]
                        }
                    ]
                }
            ])
        );
    }

    #[test]
    fn test_group_starts_fresh_group_block_per_service() {
        // same group id on both sides of a service boundary
        let recs = [
            rec("A", "G1", "N", "10.0.0.0/24"),
            rec("B", "G1", "N", "10.0.1.0/24"),
        ];
        let doc = group(&recs);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc[0].groups[0].group_id, "G1");
        assert_eq!(doc[1].groups[0].group_id, "G1");
        assert_eq!(doc[1].groups[0].netmasks[0].netmask, "10.0.1.0/24");
    }
}
