use crate::{
    codec::{
        CodecFormat, Decoded, PatternCodec,
        infer::InferenceHint,
        require_frames,
        rows::{parse_frame_row, write_frame_row},
        warn_dropped_sequence,
    },
    foundation::{
        core::Frame,
        error::{LmsError, LmsResult},
    },
    instruction::sequence::InstructionSequence,
    pattern::model::PatternMetadata,
};

/// Simple text export: `W H`, frame count, then one hex row per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct DatCodec;

fn header_value(line_no: usize, token: &str) -> LmsResult<u32> {
    let v: i64 = token.parse().map_err(|_| {
        LmsError::malformed("dat", format!("line {line_no}: '{token}' is not a number"))
    })?;
    if v <= 0 {
        return Err(LmsError::malformed(
            "dat",
            format!("line {line_no}: header values must be > 0, got {v}"),
        ));
    }
    u32::try_from(v)
        .map_err(|_| LmsError::malformed("dat", format!("line {line_no}: {v} is too large")))
}

impl PatternCodec for DatCodec {
    fn format(&self) -> CodecFormat {
        CodecFormat::Dat
    }

    #[tracing::instrument(skip_all)]
    fn encode(
        &self,
        metadata: &PatternMetadata,
        sequence: Option<&InstructionSequence>,
        frames: Option<&[Frame]>,
    ) -> LmsResult<Vec<u8>> {
        warn_dropped_sequence(CodecFormat::Dat, sequence);
        let frames = require_frames(CodecFormat::Dat, metadata, frames)?;
        if frames.is_empty() {
            return Err(LmsError::validation("dat format needs at least one frame"));
        }
        let mut out = format!("{} {}\n{}\n", metadata.width, metadata.height, frames.len());
        for f in frames {
            out.push_str(&write_frame_row(f));
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    fn decode(&self, bytes: &[u8], _hint: &InferenceHint) -> LmsResult<Decoded> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| LmsError::malformed("dat", "payload is not UTF-8 text"))?;
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (n1, dims) = lines
            .next()
            .ok_or_else(|| LmsError::malformed("dat", "missing dimensions header"))?;
        let toks: Vec<&str> = dims.split_whitespace().collect();
        let &[w, h] = toks.as_slice() else {
            return Err(LmsError::malformed(
                "dat",
                format!("line {n1}: expected '<width> <height>'"),
            ));
        };
        let width = header_value(n1, w)?;
        let height = header_value(n1, h)?;

        let (n2, count) = lines
            .next()
            .ok_or_else(|| LmsError::malformed("dat", "missing frame count header"))?;
        let frame_count = header_value(n2, count)?;

        let led_count = width as usize * height as usize;
        let frames = lines
            .map(|(n, l)| parse_frame_row(l, led_count, "dat", n))
            .collect::<LmsResult<Vec<_>>>()?;
        if frames.len() != frame_count as usize {
            return Err(LmsError::malformed(
                "dat",
                format!("header declares {frame_count} frames, found {}", frames.len()),
            ));
        }
        Ok(Decoded::frames_only(
            PatternMetadata::without_wiring(width, height, frame_count),
            frames,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/dat.rs"]
mod tests;
