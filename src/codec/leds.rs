use std::{collections::HashMap, fmt::Write as _};

use crate::{
    codec::{
        CodecFormat, Decoded, PatternCodec, check_frames,
        infer::InferenceHint,
        rows::{parse_frame_row, write_frame_row},
    },
    foundation::{
        core::Frame,
        error::{CodecError, LmsError, LmsResult},
    },
    instruction::{
        action::ActionCode,
        model::{Instruction, LayerBinding, NULL_SLOT, PatternInstruction},
        sequence::InstructionSequence,
    },
    pattern::model::{ColorOrder, DataInCorner, PatternMetadata, WiringMode},
};

/// Container version written by the encoder and the newest one the decoder reads.
pub const LEDS_VERSION: u32 = 1;

const BANNER: &str = "# LED Matrix Studio Export";
const NO_FRAMES: &str = "# (frame data omitted)";

/// Rich text container: metadata comments, automation queue, optional frame rows.
///
/// Gap, parameters, brightness and binding details ride in `# patternN_*` comments
/// so legacy readers still see a plain instruction list.
#[derive(Clone, Debug, Default)]
pub struct LedsCodec {
    name: Option<String>,
}

impl LedsCodec {
    /// Encoder that also writes a `# Name:` line.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
struct BindingExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
}

impl BindingExtras {
    fn of(b: &LayerBinding) -> Option<Self> {
        b.is_extended().then(|| Self {
            frame_index: b.frame_index,
            alias: b.alias.clone(),
        })
    }

    fn apply(self, b: &mut LayerBinding) {
        b.frame_index = self.frame_index;
        b.alias = self.alias;
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct InstructionBindings {
    #[serde(default)]
    source: Option<BindingExtras>,
    #[serde(default)]
    layer2: Option<BindingExtras>,
    #[serde(default)]
    mask: Option<BindingExtras>,
}

fn malformed(detail: impl Into<String>) -> LmsError {
    LmsError::malformed("leds", detail)
}

fn push_meta(out: &mut String, key: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# {key}: {value}");
}

fn check_slot(slot: &str) -> LmsResult<()> {
    if slot.trim().is_empty()
        || slot.trim() != slot
        || slot.eq_ignore_ascii_case(NULL_SLOT)
        || slot.contains([',', '\n', '\r'])
    {
        return Err(LmsError::validation(format!(
            "slot '{slot}' cannot be written to a LEDS instruction line"
        )));
    }
    Ok(())
}

fn parse_meta_line(comment: &str) -> Option<(String, String)> {
    let (key, value) = comment.split_once(':')?;
    let key = key.trim();
    let value = value.trim();
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == ' ');
    (valid_key && !value.is_empty()).then(|| (key.to_ascii_lowercase(), value.to_string()))
}

fn parse_bool(v: &str) -> LmsResult<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(malformed(format!("'{other}' is not a boolean"))),
    }
}

struct Meta(HashMap<String, String>);

impl Meta {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn parse<T: std::str::FromStr>(&self, key: &str) -> LmsResult<Option<T>> {
        self.get(key)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| malformed(format!("'{key}' value '{v}' is invalid")))
            })
            .transpose()
    }
}

impl PatternCodec for LedsCodec {
    fn format(&self) -> CodecFormat {
        CodecFormat::Leds
    }

    #[tracing::instrument(skip_all, fields(instructions = sequence.map_or(0, InstructionSequence::len)))]
    fn encode(
        &self,
        metadata: &PatternMetadata,
        sequence: Option<&InstructionSequence>,
        frames: Option<&[Frame]>,
    ) -> LmsResult<Vec<u8>> {
        if metadata.width == 0 || metadata.height == 0 {
            return Err(LmsError::validation("pattern width/height must be > 0"));
        }
        if let Some(f) = frames {
            check_frames(metadata, f)?;
        }

        let mut out = String::new();
        out.push_str(BANNER);
        out.push('\n');
        push_meta(&mut out, "Version", LEDS_VERSION);
        if let Some(name) = &self.name {
            if name.trim().is_empty() || name.trim() != name || name.contains(['\n', '\r']) {
                return Err(LmsError::validation(format!(
                    "pattern name '{name}' cannot be written to a LEDS Name line"
                )));
            }
            push_meta(&mut out, "Name", name);
        }
        push_meta(&mut out, "Width", metadata.width);
        push_meta(&mut out, "Height", metadata.height);
        push_meta(&mut out, "Frames", frames.map_or(metadata.frame_count as usize, <[Frame]>::len));
        push_meta(&mut out, "Format", "RGB32");
        if let Some(serpentine) = metadata.wiring.serpentine_flag() {
            push_meta(&mut out, "Serpentine", serpentine);
        }
        push_meta(&mut out, "Orientation", metadata.data_in_corner.legacy_orientation());
        push_meta(&mut out, "Color Order", metadata.color_order.as_str());
        push_meta(&mut out, "Wiring", metadata.wiring.as_str());
        push_meta(&mut out, "Data In Corner", metadata.data_in_corner.as_str());

        if let Some(seq) = sequence {
            push_meta(&mut out, "Instructions", seq.len());
        }
        let items = sequence.map(InstructionSequence::as_slice).unwrap_or_default();
        for (idx, pi) in items.iter().enumerate() {
            let n = idx + 1;
            for b in pi.bindings() {
                check_slot(&b.slot)?;
            }
            let inst = &pi.instruction;
            if inst.gap() != 0 {
                push_meta(&mut out, &format!("pattern{n}_gap"), inst.gap());
            }
            if !inst.params().is_empty() {
                let json = serde_json::to_string(inst.params())
                    .map_err(|e| LmsError::serde(e.to_string()))?;
                push_meta(&mut out, &format!("pattern{n}_params"), json);
            }
            if let Some(d) = inst.brightness_delta() {
                push_meta(&mut out, &format!("pattern{n}_brightness"), d);
            }
            let extras = InstructionBindings {
                source: BindingExtras::of(&pi.primary),
                layer2: pi.secondary.as_ref().and_then(BindingExtras::of),
                mask: pi.mask.as_ref().and_then(BindingExtras::of),
            };
            if extras.source.is_some() || extras.layer2.is_some() || extras.mask.is_some() {
                let json =
                    serde_json::to_string(&extras).map_err(|e| LmsError::serde(e.to_string()))?;
                push_meta(&mut out, &format!("pattern{n}_bindings"), json);
            }
        }
        for (idx, pi) in items.iter().enumerate() {
            let (src, code, layer2, mask, repeat) = pi.to_legacy_tuple();
            let _ = writeln!(
                out,
                "Pattern{}: {src}, {code}, {layer2}, {mask}, {repeat}",
                idx + 1
            );
        }

        out.push_str("Data:\n");
        match frames {
            Some(frames) => {
                for f in frames {
                    out.push_str(&write_frame_row(f));
                    out.push('\n');
                }
            }
            None => {
                out.push_str(NO_FRAMES);
                out.push('\n');
            }
        }
        Ok(out.into_bytes())
    }

    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    fn decode(&self, bytes: &[u8], _hint: &InferenceHint) -> LmsResult<Decoded> {
        let text = std::str::from_utf8(bytes).map_err(|_| malformed("payload is not UTF-8 text"))?;

        let mut meta = HashMap::new();
        let mut instruction_lines = Vec::new();
        let mut data_rows = Vec::new();
        let mut in_data = false;
        let mut frames_omitted = false;
        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if in_data {
                if line == NO_FRAMES {
                    frames_omitted = true;
                } else if !line.starts_with('#') {
                    data_rows.push((line_no, line));
                }
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if let Some((k, v)) = parse_meta_line(comment) {
                    meta.insert(k, v);
                }
                continue;
            }
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("data:") {
                in_data = true;
            } else if lower.starts_with("pattern") {
                instruction_lines.push((line_no, line));
            } else {
                return Err(malformed(format!("line {line_no}: unexpected content")));
            }
        }
        let meta = Meta(meta);

        let version = meta.parse::<u32>("version")?.unwrap_or(LEDS_VERSION);
        if version == 0 {
            return Err(malformed("version 0"));
        }
        if version > LEDS_VERSION {
            return Err(CodecError::UnsupportedVersion {
                format: "leds",
                found: version,
                max: LEDS_VERSION,
            }
            .into());
        }

        let width = meta
            .parse::<u32>("width")?
            .filter(|w| *w > 0)
            .ok_or_else(|| malformed("missing or zero Width"))?;
        let height = meta
            .parse::<u32>("height")?
            .filter(|h| *h > 0)
            .ok_or_else(|| malformed("missing or zero Height"))?;
        let color_order = meta
            .get("color order")
            .map(ColorOrder::parse)
            .transpose()
            .map_err(|e| malformed(e.to_string()))?
            .unwrap_or_default();
        let wiring = match (meta.get("wiring"), meta.get("serpentine")) {
            (Some(w), _) => WiringMode::parse(w).map_err(|e| malformed(e.to_string()))?,
            (None, Some(s)) if parse_bool(s)? => WiringMode::Serpentine,
            (None, Some(_)) => WiringMode::RowMajor,
            (None, None) => WiringMode::Unknown,
        };
        let data_in_corner = match (meta.get("data in corner"), meta.get("orientation")) {
            (Some(c), _) => DataInCorner::parse(c).map_err(|e| malformed(e.to_string()))?,
            (None, Some(o)) => DataInCorner::from_legacy_orientation(o),
            (None, None) => DataInCorner::Unknown,
        };

        let declared_frames = meta.parse::<u32>("frames")?;
        let led_count = width as usize * height as usize;
        let (frame_count, frames) = if data_rows.is_empty() {
            // A bare `Data:` section with nothing declared is an empty frame list.
            if in_data && !frames_omitted && declared_frames.unwrap_or(0) == 0 {
                (0, Some(Vec::new()))
            } else {
                (declared_frames.unwrap_or(0), None)
            }
        } else {
            let frames = data_rows
                .iter()
                .map(|&(n, l)| parse_frame_row(l, led_count, "leds", n))
                .collect::<LmsResult<Vec<_>>>()?;
            if let Some(d) = declared_frames
                && d as usize != frames.len()
            {
                return Err(malformed(format!(
                    "Frames declares {d} but Data holds {} rows",
                    frames.len()
                )));
            }
            (frames.len() as u32, Some(frames))
        };

        let declared_instructions = meta.parse::<usize>("instructions")?;
        if let Some(n) = declared_instructions
            && n != instruction_lines.len()
        {
            return Err(malformed(format!(
                "Instructions declares {n} but the file holds {} instruction lines",
                instruction_lines.len()
            )));
        }
        let sequence = if instruction_lines.is_empty() && declared_instructions.is_none() {
            None
        } else {
            Some(
                instruction_lines
                    .iter()
                    .enumerate()
                    .map(|(idx, &(line_no, line))| parse_instruction(idx + 1, line_no, line, &meta))
                    .collect::<LmsResult<InstructionSequence>>()?,
            )
        };

        Ok(Decoded {
            metadata: PatternMetadata {
                width,
                height,
                frame_count,
                color_order,
                wiring,
                data_in_corner,
            },
            sequence,
            frames,
            name: meta.get("name").map(str::to_string),
        })
    }
}

fn parse_instruction(n: usize, line_no: usize, line: &str, meta: &Meta) -> LmsResult<PatternInstruction> {
    let (_, payload) = line
        .split_once(':')
        .ok_or_else(|| malformed(format!("line {line_no}: instruction line has no ':'")))?;
    let parts: Vec<&str> = payload.split(',').map(str::trim).collect();
    let &[source, code, layer2, mask, repeat] = parts.as_slice() else {
        return Err(malformed(format!(
            "line {line_no}: expected 'Source, code, Layer2, Mask, Repeat'"
        )));
    };
    let primary = LayerBinding::from_legacy_token(source)
        .ok_or_else(|| malformed(format!("line {line_no}: source slot cannot be NULL")))?;
    let action = ActionCode::parse(code)?;
    let repeat: u32 = repeat
        .parse()
        .map_err(|_| malformed(format!("line {line_no}: invalid repeat '{repeat}'")))?;

    let key = |suffix: &str| format!("pattern{n}_{suffix}");
    let gap = meta.parse::<u32>(&key("gap"))?.unwrap_or(0);
    let mut params = match meta.get(&key("params")) {
        Some(json) => serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(json)
            .map_err(|e| malformed(format!("{}: {e}", key("params"))))?,
        None => serde_json::Map::new(),
    };
    // Legacy rotate lines carry no parameters and mean a single clockwise turn.
    if action == ActionCode::Rotate90 && !params.contains_key("turns") {
        params.insert("turns".to_string(), serde_json::Value::from(1));
    }

    let mut instruction = Instruction::new(action, params, repeat, gap)?;
    if let Some(d) = meta.parse::<i16>(&key("brightness"))? {
        instruction = instruction.with_brightness_delta(d);
    }

    let mut pi = PatternInstruction {
        primary,
        instruction,
        secondary: LayerBinding::from_legacy_token(layer2),
        mask: LayerBinding::from_legacy_token(mask),
    };
    if let Some(json) = meta.get(&key("bindings")) {
        let extras: InstructionBindings = serde_json::from_str(json)
            .map_err(|e| malformed(format!("{}: {e}", key("bindings"))))?;
        if let Some(x) = extras.source {
            x.apply(&mut pi.primary);
        }
        for (extra, binding, what) in [
            (extras.layer2, &mut pi.secondary, "layer2"),
            (extras.mask, &mut pi.mask, "mask"),
        ] {
            match (extra, binding.as_mut()) {
                (Some(x), Some(b)) => x.apply(b),
                (Some(_), None) => {
                    return Err(malformed(format!(
                        "{}: {what} details given for a NULL slot",
                        key("bindings")
                    )));
                }
                (None, _) => {}
            }
        }
    }
    Ok(pi)
}

#[cfg(test)]
#[path = "../../tests/unit/codec/leds.rs"]
mod tests;
