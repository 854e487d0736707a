//! Silence segmenter - turns silence detections into keep ranges
//!
//! Input comes from the media engine's analysis pass (silencedetect) already
//! in temporal order; the segmenter computes the complement: the spans worth
//! keeping. Out-of-order detections indicate an upstream engine anomaly and
//! are surfaced as an error rather than silently re-sorted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SegmentationError;

/// One detected silence interval, in seconds from stream start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceInterval {
    pub start: f64,
    pub end: f64,
}

/// A contiguous time range retained after silence removal.
///
/// Invariant: `0 <= start < end <= total duration`, and any list of segments
/// produced here is sorted by start and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeepSegment {
    pub start: f64,
    pub end: f64,
}

impl KeepSegment {
    /// Length of the segment in seconds
    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// Compute the ordered keep segments for `total` seconds of media.
///
/// Walks the detections in order, emitting the positive-length span between
/// consecutive silences, plus the trailing span after the last one. Zero
/// detections yield a single segment covering the whole input; zero-length
/// detections contribute nothing.
pub fn keep_segments(
    detections: &[SilenceInterval],
    total: f64,
) -> Result<Vec<KeepSegment>, SegmentationError> {
    if total <= 0.0 || !total.is_finite() {
        return Err(SegmentationError::InvalidDuration { duration: total });
    }

    let mut segments = Vec::with_capacity(detections.len() + 1);
    let mut cursor = 0.0_f64;

    for (index, detection) in detections.iter().enumerate() {
        if detection.end < detection.start {
            return Err(SegmentationError::NegativeInterval {
                index,
                start: detection.start,
                end: detection.end,
            });
        }
        if detection.start < cursor {
            return Err(SegmentationError::OutOfOrder {
                index,
                start: detection.start,
                previous_end: cursor,
            });
        }
        // a zero-length detection removes nothing and must not cut a segment
        if detection.end == detection.start {
            continue;
        }

        if detection.start > cursor {
            segments.push(KeepSegment {
                start: cursor,
                end: detection.start.min(total),
            });
        }
        cursor = detection.end.min(total);
    }

    if cursor < total {
        segments.push(KeepSegment {
            start: cursor,
            end: total,
        });
    }

    debug!(
        detections = detections.len(),
        segments = segments.len(),
        "computed keep segments"
    );
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: f64, end: f64) -> SilenceInterval {
        SilenceInterval { start, end }
    }

    #[test]
    fn no_detections_keep_everything() {
        let segments = keep_segments(&[], 10.0).unwrap();
        assert_eq!(
            segments,
            vec![KeepSegment {
                start: 0.0,
                end: 10.0
            }]
        );
    }

    #[test]
    fn gaps_between_silences_become_segments() {
        let segments = keep_segments(&[interval(2.0, 4.0), interval(6.0, 8.0)], 10.0).unwrap();
        assert_eq!(
            segments,
            vec![
                KeepSegment {
                    start: 0.0,
                    end: 2.0
                },
                KeepSegment {
                    start: 4.0,
                    end: 6.0
                },
                KeepSegment {
                    start: 8.0,
                    end: 10.0
                },
            ]
        );
    }

    #[test]
    fn leading_silence_drops_the_head() {
        let segments = keep_segments(&[interval(0.0, 3.0)], 10.0).unwrap();
        assert_eq!(
            segments,
            vec![KeepSegment {
                start: 3.0,
                end: 10.0
            }]
        );
    }

    #[test]
    fn trailing_silence_drops_the_tail() {
        let segments = keep_segments(&[interval(7.0, 10.0)], 10.0).unwrap();
        assert_eq!(
            segments,
            vec![KeepSegment {
                start: 0.0,
                end: 7.0
            }]
        );
    }

    #[test]
    fn zero_length_detection_never_cuts_a_segment() {
        let segments = keep_segments(&[interval(5.0, 5.0)], 10.0).unwrap();
        assert_eq!(
            segments,
            vec![KeepSegment {
                start: 0.0,
                end: 10.0
            }]
        );
    }

    #[test]
    fn fully_silent_input_keeps_nothing() {
        let segments = keep_segments(&[interval(0.0, 10.0)], 10.0).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn out_of_order_detections_are_rejected() {
        let err = keep_segments(&[interval(6.0, 8.0), interval(2.0, 4.0)], 10.0).unwrap_err();
        assert_eq!(
            err,
            SegmentationError::OutOfOrder {
                index: 1,
                start: 2.0,
                previous_end: 8.0
            }
        );
    }

    #[test]
    fn backwards_interval_is_rejected() {
        let err = keep_segments(&[interval(4.0, 2.0)], 10.0).unwrap_err();
        assert!(matches!(err, SegmentationError::NegativeInterval { index: 0, .. }));
    }

    #[test]
    fn detection_past_total_is_clamped() {
        let segments = keep_segments(&[interval(8.0, 12.0)], 10.0).unwrap();
        assert_eq!(
            segments,
            vec![KeepSegment {
                start: 0.0,
                end: 8.0
            }]
        );
    }
}
