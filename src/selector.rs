//! Stream selection policy
//!
//! Pure decision logic choosing which stream descriptor(s) to fetch for a
//! requested quality. No I/O; the job pipeline feeds it the descriptor set
//! the provider resolved.

use crate::error::JobError;
use crate::provider::StreamDescriptor;
use crate::types::Quality;

/// Outcome of stream selection
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSelection {
    /// A single combined stream; no merge step needed
    Progressive(StreamDescriptor),
    /// Separate elementary streams that must be muxed
    MuxPair {
        /// The video-only stream to fetch
        video: StreamDescriptor,
        /// The audio-only stream to fetch
        audio: StreamDescriptor,
    },
}

impl StreamSelection {
    /// Whether this selection requires the merge step
    pub fn needs_merge(&self) -> bool {
        matches!(self, StreamSelection::MuxPair { .. })
    }
}

/// Choose the stream(s) to fetch for a requested quality
///
/// Policy:
/// 1. A progressive descriptor whose resolution matches the target label
///    exactly is selected alone.
/// 2. Otherwise the best video-only descriptor: exact resolution match,
///    falling back to the highest available resolution.
/// 3. Audio is the first audio-only descriptor in set order.
/// 4. No usable video or audio descriptor fails with `NoSuitableStream`.
///
/// `Quality::Highest` is resolved to the highest video resolution the set
/// offers before the policy above applies. Ties keep the earliest
/// descriptor, so the result is deterministic for a given set.
pub fn select_streams(
    quality: &Quality,
    descriptors: &[StreamDescriptor],
) -> Result<StreamSelection, JobError> {
    let target = match quality {
        Quality::Resolution(label) => label.clone(),
        Quality::Highest => descriptors
            .iter()
            .filter(|d| !d.is_audio_only())
            .filter_map(|d| d.resolution.clone())
            // min_by_key of the reversed rank keeps the earliest label on ties
            .min_by_key(|label| std::cmp::Reverse(resolution_rank(label)))
            .ok_or(JobError::NoSuitableStream)?,
    };

    if let Some(progressive) = descriptors
        .iter()
        .find(|d| d.is_progressive() && d.resolution.as_deref() == Some(target.as_str()))
    {
        return Ok(StreamSelection::Progressive(progressive.clone()));
    }

    let video = descriptors
        .iter()
        .find(|d| d.is_video_only() && d.resolution.as_deref() == Some(target.as_str()))
        .or_else(|| {
            descriptors
                .iter()
                .filter(|d| d.is_video_only())
                .min_by_key(|d| std::cmp::Reverse(d.resolution.as_deref().map_or(0, resolution_rank)))
        })
        .ok_or(JobError::NoSuitableStream)?;

    let audio = descriptors
        .iter()
        .find(|d| d.is_audio_only())
        .ok_or(JobError::NoSuitableStream)?;

    Ok(StreamSelection::MuxPair {
        video: video.clone(),
        audio: audio.clone(),
    })
}

/// Numeric rank of a resolution label ("720p" -> 720)
///
/// Labels without a leading number rank 0.
fn resolution_rank(label: &str) -> u32 {
    label
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}
