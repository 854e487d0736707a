//! Parsing of the engine's silencedetect analysis output
//!
//! The detector logs to stderr in the form:
//! `[silencedetect @ 0x...] silence_start: 2.112`
//! `[silencedetect @ 0x...] silence_end: 4.484 | silence_duration: 2.372`
//! Intervals arrive in temporal order; a trailing `silence_start` with no
//! matching end means the input stays silent to the end of the stream.

use tracing::warn;

use crate::segmenter::SilenceInterval;

/// Extract silence intervals from a silencedetect log.
///
/// `total_duration` closes an unterminated final interval.
pub fn parse_silence_log(log: &str, total_duration: f64) -> Vec<SilenceInterval> {
    let mut intervals = Vec::new();
    let mut pending_start: Option<f64> = None;

    for line in log.lines() {
        if let Some(value) = field_value(line, "silence_start:") {
            if pending_start.is_some() {
                warn!(line, "silence_start without matching end, keeping the earlier one");
            } else {
                pending_start = Some(value);
            }
        } else if let Some(value) = field_value(line, "silence_end:") {
            match pending_start.take() {
                Some(start) => intervals.push(SilenceInterval { start, end: value }),
                None => warn!(line, "silence_end without matching start, ignored"),
            }
        }
    }

    if let Some(start) = pending_start {
        // silent through end of stream
        if start < total_duration {
            intervals.push(SilenceInterval {
                start,
                end: total_duration,
            });
        }
    }

    intervals
}

fn field_value(line: &str, marker: &str) -> Option<f64> {
    let idx = line.find(marker)?;
    line[idx + marker.len()..]
        .split_whitespace()
        .next()?
        .parse::<f64>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
[silencedetect @ 0x7f] silence_start: 2.112
[silencedetect @ 0x7f] silence_end: 4.484 | silence_duration: 2.372
frame=  100 fps=0.0 q=-0.0 size=N/A
[silencedetect @ 0x7f] silence_start: 6.0
[silencedetect @ 0x7f] silence_end: 8.25 | silence_duration: 2.25
";

    #[test]
    fn parses_paired_intervals_in_order() {
        let intervals = parse_silence_log(LOG, 10.0);
        assert_eq!(
            intervals,
            vec![
                SilenceInterval {
                    start: 2.112,
                    end: 4.484
                },
                SilenceInterval {
                    start: 6.0,
                    end: 8.25
                },
            ]
        );
    }

    #[test]
    fn unterminated_trailing_silence_closes_at_total_duration() {
        let log = "[silencedetect @ 0x7f] silence_start: 7.5\n";
        let intervals = parse_silence_log(log, 10.0);
        assert_eq!(
            intervals,
            vec![SilenceInterval {
                start: 7.5,
                end: 10.0
            }]
        );
    }

    #[test]
    fn noise_lines_are_ignored() {
        let intervals = parse_silence_log("frame= 1 fps=0.0\nnothing here\n", 10.0);
        assert!(intervals.is_empty());
    }
}
