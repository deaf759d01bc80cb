use crate::{
    foundation::{
        core::{Frame, Rgb},
        error::{LmsError, LmsResult},
        math::Rng64,
    },
    instruction::{
        action::{ActionCode, ActionParams},
        model::{Instruction, PatternInstruction},
        sequence::InstructionSequence,
    },
    pattern::model::{Pattern, validate_frames},
    simulate::{
        config::{GapPolicy, SimulationConfig},
        grid::{self, GridShape},
        text,
    },
};

/// Preview `sequence` against `pattern` with default settings.
///
/// See [`simulate_with`].
pub fn simulate(pattern: &Pattern, sequence: &InstructionSequence) -> LmsResult<Vec<Frame>> {
    simulate_with(pattern, sequence, &SimulationConfig::default())
}

/// Reproduce on-device playback of `sequence` without touching `pattern`.
///
/// Each instruction emits `repeat` frames, each transforming the previous output,
/// followed by `gap` duplicates under [`GapPolicy::DuplicateLast`]. The run is
/// all-or-nothing: bindings and the output size are checked before any pixel work,
/// and any failure returns an error with no frames.
#[tracing::instrument(
    skip(pattern, sequence, config),
    fields(instructions = sequence.len(), leds = pattern.led_count())
)]
pub fn simulate_with(
    pattern: &Pattern,
    sequence: &InstructionSequence,
    config: &SimulationConfig,
) -> LmsResult<Vec<Frame>> {
    config.validate()?;
    validate_frames(&pattern.metadata, &pattern.frames)?;
    let requested = preflight(sequence, config)?;
    let plans = resolve_bindings(pattern, sequence)?;

    let shape = GridShape::new(pattern.metadata.width, pattern.metadata.height);
    let mut out = Vec::with_capacity(requested as usize);
    for (index, plan) in plans.iter().enumerate() {
        tracing::trace!(
            index,
            action = %plan.item.instruction.action(),
            repeat = plan.item.instruction.repeat(),
            gap = plan.item.instruction.gap(),
            "simulate instruction"
        );
        run_instruction(shape, pattern, plan, config.gap_policy, &mut out);
    }
    tracing::debug!(frames = out.len(), "preview simulated");
    Ok(out)
}

/// Exact output size of a preview, or `PreviewTooLarge` when it exceeds the bound.
pub fn preflight(sequence: &InstructionSequence, config: &SimulationConfig) -> LmsResult<u64> {
    let requested = sequence
        .planned_frame_count(config.gap_policy)
        .unwrap_or(u64::MAX);
    if requested > config.max_frames {
        return Err(LmsError::PreviewTooLarge {
            requested,
            limit: config.max_frames,
        });
    }
    Ok(requested)
}

struct ResolvedInstruction<'a> {
    item: &'a PatternInstruction,
    primary: usize,
    secondary: Option<usize>,
    mask: Option<usize>,
}

fn resolve_bindings<'a>(
    pattern: &Pattern,
    sequence: &'a InstructionSequence,
) -> LmsResult<Vec<ResolvedInstruction<'a>>> {
    let n = pattern.frames.len();
    sequence
        .iter()
        .map(|item| {
            Ok(ResolvedInstruction {
                item,
                primary: item.primary.resolve(n)?,
                secondary: item.secondary.as_ref().map(|b| b.resolve(n)).transpose()?,
                mask: item.mask.as_ref().map(|b| b.resolve(n)).transpose()?,
            })
        })
        .collect()
}

fn run_instruction(
    shape: GridShape,
    pattern: &Pattern,
    plan: &ResolvedInstruction<'_>,
    policy: GapPolicy,
    out: &mut Vec<Frame>,
) {
    let inst = &plan.item.instruction;
    let base = &pattern.frames[plan.primary];
    let secondary = plan.secondary.map(|i| pattern.frames[i].pixels.as_slice());
    let mask = plan.mask.map(|i| pattern.frames[i].pixels.as_slice());
    let mut rng = Rng64::new(match inst.typed_params() {
        ActionParams::Randomize(p) => p.seed,
        _ => 0,
    });

    let mut current = base.pixels.clone();
    for step in 0..inst.repeat() {
        let ctx = StepCtx {
            shape,
            step,
            base: &base.pixels,
            secondary,
        };
        let next = apply_step(inst, &ctx, &current, &mut rng);
        current = match mask {
            Some(m) => grid::apply_mask(&base.pixels, next, m),
            None => next,
        };
        out.push(Frame::new(current.clone(), base.duration_ms));
        if policy == GapPolicy::DuplicateLast {
            for _ in 0..inst.gap() {
                out.push(Frame::new(current.clone(), base.duration_ms));
            }
        }
    }
}

struct StepCtx<'a> {
    shape: GridShape,
    /// 0-based repeat index.
    step: u32,
    /// Primary buffer before the instruction ran.
    base: &'a [Rgb],
    secondary: Option<&'a [Rgb]>,
}

/// One firmware execution of `inst`.
///
/// Moves, rotation, mirroring, inversion, brightness and randomize act on the
/// previous output. Scroll and fade are positional: they redraw from the primary
/// buffer at the offset or amount for `step`.
fn apply_step(inst: &Instruction, ctx: &StepCtx<'_>, current: &[Rgb], rng: &mut Rng64) -> Vec<Rgb> {
    let shape = ctx.shape;
    match inst.typed_params() {
        ActionParams::Rotate(p) => grid::rotate_quarter(shape, current, p.normalized()),
        ActionParams::Brightness(_) => {
            grid::scale_brightness(current, inst.effective_brightness_delta())
        }
        ActionParams::ScrollText(p) => {
            let mut px = ctx.base.to_vec();
            let x = text::scroll_offset(shape.width, p.speed, ctx.step);
            text::draw_text(shape, &mut px, &p.text, x, p.color);
            px
        }
        ActionParams::Fade(p) => {
            let t = fade_amount(p.strength, ctx.step, inst.repeat());
            match ctx.secondary {
                Some(target) => grid::blend(ctx.base, target, t),
                None => grid::darken(ctx.base, t),
            }
        }
        ActionParams::Randomize(p) => {
            let noise: Vec<Rgb> = (0..current.len())
                .map(|_| Rgb::new(rng.next_u8(), rng.next_u8(), rng.next_u8()))
                .collect();
            grid::blend(current, &noise, p.strength)
        }
        ActionParams::None => match inst.action() {
            ActionCode::MoveLeft1 => grid::shift_wrap(shape, current, -1, 0),
            ActionCode::MoveRight1 => grid::shift_wrap(shape, current, 1, 0),
            ActionCode::MoveUp1 => grid::shift_wrap(shape, current, 0, -1),
            ActionCode::MoveDown1 => grid::shift_wrap(shape, current, 0, 1),
            ActionCode::MirrorH => grid::mirror_h(shape, current),
            ActionCode::MirrorV => grid::mirror_v(shape, current),
            ActionCode::Invert => grid::invert(current),
            _ => current.to_vec(),
        },
    }
}

/// Linear ramp reaching `strength` on the last repeat.
fn fade_amount(strength: u8, step: u32, repeat: u32) -> u8 {
    let t = u64::from(strength) * (u64::from(step) + 1) / u64::from(repeat.max(1));
    t.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/simulate/simulator.rs"]
mod tests;
