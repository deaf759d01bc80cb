use crate::foundation::{
    core::{DEFAULT_FRAME_DURATION_MS, Frame, Rgb},
    error::{LmsError, LmsResult},
};

/// `RRGGBB RRGGBB ... @<ms>`
pub(crate) fn write_frame_row(frame: &Frame) -> String {
    let mut row = frame
        .pixels
        .iter()
        .map(|p| p.to_hex())
        .collect::<Vec<_>>()
        .join(" ");
    row.push_str(&format!(" @{}", frame.duration_ms));
    row
}

/// Parse one frame row with exactly `led_count` pixels and an optional `@<ms>` token.
pub(crate) fn parse_frame_row(
    line: &str,
    led_count: usize,
    format: &'static str,
    line_no: usize,
) -> LmsResult<Frame> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    let mut duration_ms = DEFAULT_FRAME_DURATION_MS;
    if let Some(last) = tokens.last()
        && let Some(ms) = last.strip_prefix('@')
    {
        duration_ms = ms.parse().map_err(|_| {
            LmsError::malformed(format, format!("line {line_no}: bad duration '{last}'"))
        })?;
        tokens.pop();
    }
    if tokens.len() != led_count {
        return Err(LmsError::malformed(
            format,
            format!(
                "line {line_no}: expected {led_count} pixels, found {}",
                tokens.len()
            ),
        ));
    }
    let pixels = tokens
        .into_iter()
        .map(|t| {
            Rgb::from_hex(t).map_err(|_| {
                LmsError::malformed(format, format!("line {line_no}: bad pixel '{t}'"))
            })
        })
        .collect::<LmsResult<Vec<_>>>()?;
    Ok(Frame::new(pixels, duration_ms))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/rows.rs"]
mod tests;
