use std::{collections::BTreeMap, fmt::Write as _};

use crate::{
    codec::{
        CodecFormat, Decoded, PatternCodec,
        binary::{BinaryCodec, BinaryLayout, LEDM_MAGIC},
        infer::{InferenceHint, choose_packing},
        warn_dropped_sequence,
    },
    foundation::{
        core::Frame,
        error::{CodecError, LmsError, LmsResult},
    },
    instruction::sequence::InstructionSequence,
    pattern::model::PatternMetadata,
};

const DATA: u8 = 0x00;
const EOF: u8 = 0x01;
const EXT_SEGMENT: u8 = 0x02;
const START_SEGMENT: u8 = 0x03;
const EXT_LINEAR: u8 = 0x04;
const START_LINEAR: u8 = 0x05;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Intel HEX writer settings.
pub struct HexOptions {
    /// Data bytes per record.
    pub record_len: u8,
    /// Packed binary layout wrapped in the records.
    pub layout: BinaryLayout,
}

impl Default for HexOptions {
    fn default() -> Self {
        Self {
            record_len: 16,
            layout: BinaryLayout::Headered,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HexCodec {
    options: HexOptions,
}

impl HexCodec {
    pub fn new(options: HexOptions) -> Self {
        Self { options }
    }
}

struct Record {
    kind: u8,
    address: u16,
    data: Vec<u8>,
}

fn malformed(line: usize, detail: impl std::fmt::Display) -> LmsError {
    LmsError::malformed("hex", format!("line {line}: {detail}"))
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}

fn parse_record(line: &str, line_no: usize) -> LmsResult<Record> {
    let body = line
        .strip_prefix(':')
        .ok_or_else(|| malformed(line_no, "record does not start with ':'"))?;
    if body.len() % 2 != 0 || !body.is_ascii() {
        return Err(malformed(line_no, "record is not an even run of hex digits"));
    }
    let bytes = (0..body.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&body[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| malformed(line_no, "invalid hex digit"))?;
    if bytes.len() < 5 {
        return Err(malformed(line_no, "record shorter than 5 bytes"));
    }
    let count = bytes[0] as usize;
    if bytes.len() != count + 5 {
        return Err(malformed(
            line_no,
            format!("byte count {count} does not match record length"),
        ));
    }
    let (payload, stored) = bytes.split_at(bytes.len() - 1);
    let expected = checksum(payload);
    if expected != stored[0] {
        return Err(CodecError::ChecksumMismatch {
            line: line_no,
            expected,
            found: stored[0],
        }
        .into());
    }
    Ok(Record {
        kind: bytes[3],
        address: u16::from_be_bytes([bytes[1], bytes[2]]),
        data: bytes[4..4 + count].to_vec(),
    })
}

fn push_record(out: &mut String, address: u16, kind: u8, data: &[u8]) {
    let mut raw = Vec::with_capacity(data.len() + 4);
    raw.push(data.len() as u8);
    raw.extend_from_slice(&address.to_be_bytes());
    raw.push(kind);
    raw.extend_from_slice(data);
    out.push(':');
    for b in &raw {
        let _ = write!(out, "{b:02X}");
    }
    let _ = writeln!(out, "{:02X}", checksum(&raw));
}

/// Most common data record length; ties prefer the longer record.
fn dominant_record_len(counts: &BTreeMap<usize, usize>) -> Option<usize> {
    counts
        .iter()
        .max_by_key(|&(len, n)| (*n, *len))
        .map(|(len, _)| *len)
}

/// Joins data records in address order; the image must be one contiguous run.
fn flatten(chunks: BTreeMap<u32, Vec<u8>>) -> LmsResult<Vec<u8>> {
    let mut data = Vec::new();
    let mut next: Option<u64> = None;
    for (addr, bytes) in chunks {
        let start = u64::from(addr);
        if let Some(n) = next
            && n != start
        {
            let what = if start < n { "overlaps" } else { "leaves a gap after" };
            return Err(LmsError::malformed(
                "hex",
                format!("data record at 0x{addr:08X} {what} the previous record"),
            ));
        }
        next = Some(start + bytes.len() as u64);
        data.extend_from_slice(&bytes);
    }
    Ok(data)
}

impl PatternCodec for HexCodec {
    fn format(&self) -> CodecFormat {
        CodecFormat::Hex
    }

    #[tracing::instrument(skip_all, fields(record_len = self.options.record_len))]
    fn encode(
        &self,
        metadata: &PatternMetadata,
        sequence: Option<&InstructionSequence>,
        frames: Option<&[Frame]>,
    ) -> LmsResult<Vec<u8>> {
        warn_dropped_sequence(CodecFormat::Hex, sequence);
        if self.options.record_len == 0 {
            return Err(LmsError::validation("hex record_len must be > 0"));
        }
        let payload = BinaryCodec::new(self.options.layout).encode(metadata, None, frames)?;
        if u32::try_from(payload.len()).is_err() {
            return Err(LmsError::validation(
                "payload exceeds the 4 GiB Intel HEX address space",
            ));
        }

        let record_len = usize::from(self.options.record_len);
        let mut out = String::new();
        let mut upper = 0u16;
        let mut offset = 0usize;
        while offset < payload.len() {
            let hi = (offset >> 16) as u16;
            if hi != upper {
                push_record(&mut out, 0, EXT_LINEAR, &hi.to_be_bytes());
                upper = hi;
            }
            let lo = offset & 0xFFFF;
            let n = record_len.min(0x1_0000 - lo).min(payload.len() - offset);
            push_record(&mut out, lo as u16, DATA, &payload[offset..offset + n]);
            offset += n;
        }
        push_record(&mut out, 0, EOF, &[]);
        Ok(out.into_bytes())
    }

    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    fn decode(&self, bytes: &[u8], hint: &InferenceHint) -> LmsResult<Decoded> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| LmsError::malformed("hex", "payload is not UTF-8 text"))?;

        let mut chunks: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
        let mut lengths: BTreeMap<usize, usize> = BTreeMap::new();
        let mut base = 0u32;
        let mut saw_eof = false;

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let rec = parse_record(line, i + 1)?;
            match rec.kind {
                DATA if rec.data.is_empty() => {}
                DATA => {
                    let addr = base.wrapping_add(u32::from(rec.address));
                    *lengths.entry(rec.data.len()).or_default() += 1;
                    if chunks.insert(addr, rec.data).is_some() {
                        return Err(malformed(i + 1, format!("second data record at 0x{addr:08X}")));
                    }
                }
                EOF => {
                    saw_eof = true;
                    break;
                }
                EXT_SEGMENT | EXT_LINEAR => {
                    let &[a, b] = rec.data.as_slice() else {
                        return Err(malformed(i + 1, "address record must carry 2 bytes"));
                    };
                    let v = u32::from(u16::from_be_bytes([a, b]));
                    base = if rec.kind == EXT_SEGMENT { v << 4 } else { v << 16 };
                }
                START_SEGMENT | START_LINEAR => {}
                other => return Err(malformed(i + 1, format!("unknown record type {other:02X}"))),
            }
        }
        if !saw_eof {
            tracing::warn!("intel hex payload has no EOF record");
        }
        if chunks.is_empty() {
            return Err(LmsError::malformed("hex", "no data records"));
        }
        let data = flatten(chunks)?;

        let mut hint = hint.clone();
        if hint.width.is_none()
            && !data.starts_with(LEDM_MAGIC)
            && let Some(len) = dominant_record_len(&lengths)
        {
            let bpp = choose_packing(data.len(), &hint).bytes_per_pixel();
            if len % bpp == 0 {
                hint.width = Some((len / bpp) as u32);
                tracing::debug!(record_len = len, width = len / bpp, "preferred width from records");
            }
        }
        BinaryCodec::default().decode(&data, &hint)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/hex.rs"]
mod tests;
