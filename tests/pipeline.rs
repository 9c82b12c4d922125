//! Offline pipeline tests: join, parse, coalesce, group

use routecfg::coalesce::{coalesce, group};
use routecfg::config::InputFormat;
use routecfg::input::read_records;
use routecfg::resolver::{join, NodeGroupMapping, OfficeNodeMapping};
use std::io::Cursor;

fn office(office_code: &str, node_code: &str) -> OfficeNodeMapping {
    OfficeNodeMapping {
        office_code: office_code.to_string(),
        node_code: node_code.to_string(),
    }
}

fn node(node_code: &str, service_code: &str, group_id: &str) -> NodeGroupMapping {
    NodeGroupMapping {
        node_code: node_code.to_string(),
        service_code: service_code.to_string(),
        group_id: group_id.to_string(),
    }
}

#[test]
fn prefix_input_joins_and_groups_into_one_merged_block() {
    let mapping = join(vec![office("O1", "N1")], vec![node("N1", "S", "G")]);
    let input = "\
10.0.0.0|NC|x|x|x|O1|x|25\n\
10.0.0.128|NC|x|x|x|O1|x|25\n";
    let records =
        read_records(Cursor::new(input), InputFormat::Prefix, &mapping, false).unwrap();
    let doc = group(&coalesce(records));
    assert_eq!(doc.len(), 1);
    assert_eq!(doc[0].service_code, "S");
    assert_eq!(doc[0].groups.len(), 1);
    assert_eq!(doc[0].groups[0].group_id, "G");
    let netmasks: Vec<&str> = doc[0].groups[0]
        .netmasks
        .iter()
        .map(|n| n.netmask.as_str())
        .collect();
    assert_eq!(netmasks, ["10.0.0.0/24"]);
}

#[test]
fn range_input_decomposes_then_coalesces_back() {
    let mapping = join(vec![office("O1", "N1")], vec![node("N1", "S", "G")]);
    // a full /24 written as an inclusive range collapses back to one block
    let input = "10.0.0.0|10.0.0.255|x|O1|x|x|NC|x\n";
    let records = read_records(Cursor::new(input), InputFormat::Range, &mapping, false).unwrap();
    let doc = group(&coalesce(records));
    assert_eq!(doc.len(), 1);
    let netmasks: Vec<&str> = doc[0].groups[0]
        .netmasks
        .iter()
        .map(|n| n.netmask.as_str())
        .collect();
    assert_eq!(netmasks, ["10.0.0.0/24"]);
    assert_eq!(doc[0].groups[0].netmasks[0].net_code, "NC");
}

#[test]
fn offices_fanning_out_to_two_nodes_produce_two_group_blocks() {
    let mapping = join(
        vec![office("O1", "N1"), office("O2", "N2")],
        vec![node("N1", "S", "G1"), node("N2", "S", "G2")],
    );
    let input = "\
10.0.0.0|NC|x|x|x|O1|x|24\n\
10.0.1.0|NC|x|x|x|O2|x|24\n";
    let records =
        read_records(Cursor::new(input), InputFormat::Prefix, &mapping, false).unwrap();
    let doc = group(&coalesce(records));
    assert_eq!(doc.len(), 1);
    assert_eq!(doc[0].groups.len(), 2);
    assert_eq!(doc[0].groups[0].group_id, "G1");
    assert_eq!(doc[0].groups[1].group_id, "G2");
}
