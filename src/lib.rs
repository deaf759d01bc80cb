//! Playback-time automation for LED matrix patterns.
//!
//! A pattern is a stack of RGB frames. Instead of baking every animation into
//! frames, an editor attaches an ordered queue of firmware actions (shift, rotate,
//! mirror, scroll text, fade, ...) that the device executes at playback time.
//!
//! # Pipeline overview
//!
//! 1. **Edit**: build an [`InstructionSequence`] of [`PatternInstruction`]s. Every
//!    instruction is validated when constructed.
//! 2. **Preview**: [`simulate`] reproduces device playback as a new frame list,
//!    bounded by [`SimulationConfig::max_frames`]. The source pattern is never touched.
//! 3. **Finalize**: [`finalize`] attaches the queue to the [`Pattern`];
//!    [`PreviewOverlay`] lets the caller keep or discard simulated frames.
//! 4. **Export**: a [`PatternCodec`] writes packed binary, Intel HEX, DAT or LEDS.
//!    Only LEDS stores the queue; headerless payloads rely on [`InferenceHint`].
//!
//! The library is synchronous and does no file IO apart from [`LmsConfig::load`].
#![forbid(unsafe_code)]

mod codec;
mod config;
mod finalize;
mod foundation;
mod instruction;
mod pattern;
mod simulate;

pub use codec::binary::{BinaryCodec, BinaryLayout, LEDM_MAGIC, LEDM_MAX_VERSION, LEDM_VERSION};
pub use codec::dat::DatCodec;
pub use codec::hex::{HexCodec, HexOptions};
pub use codec::infer::{
    Aspect, COMMON_LED_COUNTS, InferenceHint, InferredLayout, PixelPacking, choose_packing,
    infer_dimensions, infer_layout, infer_led_count,
};
pub use codec::leds::{LEDS_VERSION, LedsCodec};
pub use codec::{CodecFormat, Decoded, PatternCodec, create_codec, create_codec_with, detect_format};
pub use config::LmsConfig;
pub use finalize::{PreviewOverlay, finalize, reopen_queue};
pub use foundation::core::{DEFAULT_FRAME_DURATION_MS, Frame, Rgb};
pub use foundation::error::{
    CodecError, LmsError, LmsResult, MAX_PREVIEW_FRAMES_HARD, ValidationError,
};
pub use foundation::math::frames_digest;
pub use instruction::action::{
    ActionCode, ActionParams, BrightnessParams, FadeParams, RandomizeParams, RotateParams,
    ScrollTextParams, parse_action_params,
};
pub use instruction::model::{Instruction, LayerBinding, LegacyTuple, NULL_SLOT, PatternInstruction};
pub use instruction::sequence::{InstructionSequence, SequenceChange, SequenceSummary};
pub use pattern::model::{
    ColorOrder, DataInCorner, Pattern, PatternMetadata, WiringMode, validate_frames,
};
pub use simulate::config::{DEFAULT_MAX_PREVIEW_FRAMES, GapPolicy, SimulationConfig};
pub use simulate::simulator::{preflight, simulate, simulate_with};
