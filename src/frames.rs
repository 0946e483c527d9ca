//! Frame resolver - selects which source-timeline frames an animation exports
//!
//! An animation states its frame policy in one of three ways, checked in
//! priority order:
//!
//! 1. an explicit list of frame indices, returned unchanged;
//! 2. an "every Nth frame" step, giving `0, n, 2n, ...` below the source frame count;
//! 3. an evenly spaced fallback of `frames_per_direction` samples.
//!
//! The result is a pure function of the inputs. Its length becomes the
//! manifest's `framesPerDirection`.
//!
//! # Examples
//!
//! ```
//! use skinsheet::frames::resolve_frames;
//!
//! assert_eq!(resolve_frames(&[2, 5, 9], Some(3), 4, 20).unwrap(), vec![2, 5, 9]);
//! assert_eq!(resolve_frames(&[], Some(3), 4, 10).unwrap(), vec![0, 3, 6, 9]);
//! assert_eq!(resolve_frames(&[], None, 4, 20).unwrap(), vec![0, 5, 10, 15]);
//! ```

use thiserror::Error;

/// Error for frame selections that cannot be resolved.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The source clip has no frames
    #[error("source clip has no frames")]
    NoSourceFrames,
    /// Evenly spaced sampling asked for zero frames
    #[error("frames per direction must be positive")]
    ZeroFramesPerDirection,
    /// "Every Nth frame" step of zero
    #[error("every-nth step must be at least 1")]
    ZeroStep,
    /// An explicit index falls outside the source clip
    #[error("frame index {index} out of range (clip has {total} frames)")]
    OutOfRange { index: u32, total: u32 },
    /// Clip length or rate is negative or not finite
    #[error("invalid clip timing: {length}s at {rate} fps")]
    InvalidClip { length: f32, rate: f32 },
}

/// How an animation chooses its frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePolicy<'a> {
    /// Caller-authored frame list
    Explicit(&'a [u32]),
    /// Every Nth source frame starting at 0
    EveryNth(u32),
    /// `count` samples spread evenly over the clip
    Evenly(u32),
}

impl<'a> FramePolicy<'a> {
    /// Pick the policy that applies to the given inputs.
    pub fn select(explicit: &'a [u32], every_nth: Option<u32>, frames_per_direction: u32) -> Self {
        if !explicit.is_empty() {
            FramePolicy::Explicit(explicit)
        } else if let Some(step) = every_nth {
            FramePolicy::EveryNth(step)
        } else {
            FramePolicy::Evenly(frames_per_direction)
        }
    }

    /// Short name for progress output.
    pub fn describe(&self) -> &'static str {
        match self {
            FramePolicy::Explicit(_) => "explicit",
            FramePolicy::EveryNth(_) => "every-nth",
            FramePolicy::Evenly(_) => "evenly spaced",
        }
    }

    /// Produce the ordered source-frame indices for this policy.
    pub fn resolve(&self, total_source_frames: u32) -> Result<Vec<u32>, FrameError> {
        match *self {
            FramePolicy::Explicit(frames) => Ok(frames.to_vec()),
            FramePolicy::EveryNth(step) => {
                if step == 0 {
                    return Err(FrameError::ZeroStep);
                }
                if total_source_frames == 0 {
                    return Err(FrameError::NoSourceFrames);
                }
                Ok((0..total_source_frames).step_by(step as usize).collect())
            }
            FramePolicy::Evenly(count) => {
                if count == 0 {
                    return Err(FrameError::ZeroFramesPerDirection);
                }
                if total_source_frames == 0 {
                    return Err(FrameError::NoSourceFrames);
                }
                let last = total_source_frames - 1;
                Ok((0..count)
                    .map(|i| {
                        let pos = i as f64 * total_source_frames as f64 / count as f64;
                        (pos.round_ties_even() as u32).min(last)
                    })
                    .collect())
            }
        }
    }
}

/// Resolve the frames an animation exports.
///
/// See the module docs for the priority order. Explicit indices are returned
/// as given; use [`validate_frames`] to range-check them.
pub fn resolve_frames(
    explicit: &[u32],
    every_nth: Option<u32>,
    frames_per_direction: u32,
    total_source_frames: u32,
) -> Result<Vec<u32>, FrameError> {
    FramePolicy::select(explicit, every_nth, frames_per_direction).resolve(total_source_frames)
}

/// Number of frames in a clip: `round(length * rate)`.
pub fn source_frame_count(clip_length: f32, frame_rate: f32) -> Result<u32, FrameError> {
    if !clip_length.is_finite() || !frame_rate.is_finite() || clip_length < 0.0 || frame_rate < 0.0
    {
        return Err(FrameError::InvalidClip { length: clip_length, rate: frame_rate });
    }
    Ok((clip_length as f64 * frame_rate as f64).round_ties_even() as u32)
}

/// Time in seconds at which a source frame is sampled.
pub fn frame_time(source_frame: u32, total_source_frames: u32, clip_length: f32) -> f32 {
    if total_source_frames == 0 {
        return 0.0;
    }
    source_frame as f32 / total_source_frames as f32 * clip_length
}

/// Check that every index lies inside `[0, total_source_frames)`.
pub fn validate_frames(frames: &[u32], total_source_frames: u32) -> Result<(), FrameError> {
    match frames.iter().find(|&&f| f >= total_source_frames) {
        Some(&index) => Err(FrameError::OutOfRange { index, total: total_source_frames }),
        None => Ok(()),
    }
}
