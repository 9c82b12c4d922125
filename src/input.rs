//! Pipe-delimited assignment file parsing

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::cidr::{self, Cidr4};
use crate::config::InputFormat;
use crate::record::{Record, RouteKey};
use crate::resolver::{OfficeGroups, ServiceGroup};
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::net::Ipv4Addr;

/// Error type for input file parsing
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed record, line[{line}], {source}")]
    MalformedRecord { line: usize, source: cidr::Error },
}

/// Read assignment lines and expand them into routing records.
///
/// Recoverable problems (short lines, unmapped offices, bad range
/// addresses, inverted ranges, duplicates when deduplication is on)
/// skip the line and are counted; a record that fails to construct in
/// prefix layout means the file itself is corrupt and aborts.
pub fn read_records<R: BufRead>(
    reader: R,
    format: InputFormat,
    mapping: &OfficeGroups,
    dedup: bool,
) -> Result<Vec<Record>, Error> {
    let mut parse = FileParse::new(format, mapping, dedup);
    for line in reader.lines() {
        parse.feed_line(&line?)?;
    }
    Ok(parse.finish())
}

/// Accumulates records and per-line statistics over one input file
struct FileParse<'a> {
    format: InputFormat,
    mapping: &'a OfficeGroups,
    dedup: bool,
    records: Vec<Record>,
    lines: usize,
    invalid: usize,
    unmapped_offices: HashMap<String, usize>,
    seen: HashSet<(RouteKey, Cidr4)>,
}

impl<'a> FileParse<'a> {
    fn new(format: InputFormat, mapping: &'a OfficeGroups, dedup: bool) -> Self {
        Self {
            format,
            mapping,
            dedup,
            records: Vec::new(),
            lines: 0,
            invalid: 0,
            unmapped_offices: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    fn feed_line(&mut self, line: &str) -> Result<(), Error> {
        self.lines += 1;
        let fields: Vec<&str> = line.split('|').collect();
        match self.format {
            InputFormat::Prefix => self.feed_prefix_line(line, &fields),
            InputFormat::Range => {
                self.feed_range_line(line, &fields);
                Ok(())
            }
        }
    }

    /// `ip_start | net_code | _ | _ | _ | office_code | _ | prefix`
    fn feed_prefix_line(&mut self, line: &str, fields: &[&str]) -> Result<(), Error> {
        if fields.len() < 8 {
            self.skip_line(line);
            return Ok(());
        }
        let office_code = fields[5];
        let Some(groups) = self.lookup_office(office_code) else {
            return Ok(());
        };
        for sg in groups {
            let rec = Record::from_start_and_prefix(
                &sg.service_code,
                &sg.group_id,
                fields[1],
                office_code,
                fields[0],
                fields[7],
            )
            .map_err(|source| Error::MalformedRecord {
                line: self.lines,
                source,
            })?;
            self.push(rec, line);
        }
        Ok(())
    }

    /// `ip_start | ip_end | _ | office_code | _ | _ | net_code | _`
    fn feed_range_line(&mut self, line: &str, fields: &[&str]) {
        if fields.len() != 8 {
            self.skip_line(line);
            return;
        }
        let office_code = fields[3];
        let Some(groups) = self.lookup_office(office_code) else {
            return;
        };
        let (Ok(lo), Ok(hi)) = (
            fields[0].trim().parse::<Ipv4Addr>(),
            fields[1].trim().parse::<Ipv4Addr>(),
        ) else {
            log::warn!(
                "invalid line[{}], {}, {}",
                self.lines,
                fields[0],
                fields[1]
            );
            self.invalid += 1;
            return;
        };
        let blocks = match cidr::range_to_cidrs(lo, hi) {
            Ok(blocks) => blocks,
            Err(e) => {
                log::warn!("invalid line[{}], {e}", self.lines);
                self.invalid += 1;
                return;
            }
        };
        for sg in groups {
            for block in &blocks {
                let rec = Record::from_cidr(
                    &sg.service_code,
                    &sg.group_id,
                    fields[6],
                    office_code,
                    *block,
                );
                self.push(rec, line);
            }
        }
    }

    fn lookup_office(&mut self, office_code: &str) -> Option<&'a [ServiceGroup]> {
        match self.mapping.get(office_code) {
            Some(groups) => Some(groups),
            None => {
                *self
                    .unmapped_offices
                    .entry(office_code.to_string())
                    .or_default() += 1;
                self.invalid += 1;
                None
            }
        }
    }

    fn skip_line(&mut self, line: &str) {
        log::warn!("invalid line[{}], {line}", self.lines);
        self.invalid += 1;
    }

    fn push(&mut self, rec: Record, line: &str) {
        if self.dedup && !self.seen.insert((rec.key.clone(), rec.cidr)) {
            log::warn!("duplicate record, line[{}], {line}", self.lines);
            self.invalid += 1;
            return;
        }
        self.records.push(rec);
    }

    fn finish(self) -> Vec<Record> {
        for (office, count) in &self.unmapped_offices {
            log::warn!("invalid office code, {office}, lines[{count}]");
        }
        log::info!(
            "success to parse file, lines[{}], invalid lines[{}], records[{}]",
            self.lines,
            self.invalid,
            self.records.len()
        );
        self.records
    }
}
