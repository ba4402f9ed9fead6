//! Waveform thumbnail: the per-file amplitude summary the UI draws once.

use crate::source::SourceAudio;

/// Number of bars in the thumbnail.
pub const WAVEFORM_BUCKETS: usize = 200;

/// Summarize channel 0 into `WAVEFORM_BUCKETS` buckets of mean absolute
/// amplitude, each normalized against the peak bucket. Computed once per
/// loaded file.
pub fn waveform_summary(source: &SourceAudio) -> Vec<f32> {
    summarize(source.channel(0))
}

fn summarize(data: &[f32]) -> Vec<f32> {
    let block = (data.len() / WAVEFORM_BUCKETS).max(1);
    let mut buckets = Vec::with_capacity(WAVEFORM_BUCKETS);
    for i in 0..WAVEFORM_BUCKETS {
        let start = i * block;
        if start >= data.len() {
            buckets.push(0.0);
            continue;
        }
        let end = (start + block).min(data.len());
        let sum: f32 = data[start..end].iter().map(|s| s.abs()).sum();
        buckets.push(sum / (end - start) as f32);
    }

    let peak = buckets.iter().cloned().fold(0.0f32, f32::max);
    if peak > 0.0 {
        for bucket in &mut buckets {
            *bucket /= peak;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(data: Vec<f32>) -> SourceAudio {
        SourceAudio::new(vec![data], 44100).unwrap()
    }

    #[test]
    fn always_two_hundred_buckets() {
        for frames in [5, 199, 200, 1000, 44100] {
            let s = source((0..frames).map(|i| (i as f32 * 0.1).sin()).collect());
            assert_eq!(waveform_summary(&s).len(), WAVEFORM_BUCKETS);
        }
    }

    #[test]
    fn constant_signal_normalizes_to_ones() {
        let s = source(vec![0.3; 2000]);
        let summary = waveform_summary(&s);
        for &b in &summary {
            assert!((b - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn silence_stays_zero() {
        let s = source(vec![0.0; 2000]);
        let summary = waveform_summary(&s);
        assert!(summary.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn peak_bucket_is_one_and_sign_is_ignored() {
        let mut data = vec![0.1f32; 2000];
        for s in &mut data[1000..1010] {
            *s = -0.9;
        }
        let summary = waveform_summary(&source(data));
        let peak = summary.iter().cloned().fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(summary.iter().all(|&b| b >= 0.0 && b <= 1.0));
    }
}
