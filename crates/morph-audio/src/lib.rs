use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use morph_core::{MorphError, Result};

/// A loaded recording: mono samples in [-1, 1] plus the container's
/// sample rate, carried through the pipeline unchanged.
#[derive(Debug, Clone)]
pub struct Recording {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
}

impl Recording {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn wav_error(err: hound::Error) -> MorphError {
    match err {
        hound::Error::IoError(io) => MorphError::Io(io),
        other => MorphError::Audio(other.to_string()),
    }
}

/// Reads a WAV file into a mono `Recording`.
///
/// Integer PCM up to 32 bits and 32-bit float are accepted; multichannel
/// audio is averaged down to mono. Samples are clamped to [-1, 1].
pub fn load_recording(path: &Path) -> Result<Recording> {
    let mut reader = WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let raw: Vec<f64> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()
            .map_err(wav_error)?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = (1_i64 << (bits - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(wav_error)?
        }
        (format, bits) => {
            return Err(MorphError::Audio(format!(
                "unsupported wav encoding: {format:?} at {bits} bits"
            )))
        }
    };

    let mono: Vec<f64> = if channels == 1 {
        raw
    } else {
        raw.chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / channels as f64)
            .collect()
    };

    Ok(Recording {
        samples: mono.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect(),
        sample_rate: spec.sample_rate,
    })
}

/// Writes a mono 16-bit PCM WAV at the recording's sample rate.
pub fn save_recording(path: &Path, recording: &Recording) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: recording.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for &sample in &recording.samples {
        let quantized = (sample.clamp(-1.0, 1.0) * f64::from(i16::MAX)).round() as i16;
        writer.write_sample(quantized).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("morph-audio-{}-{name}", std::process::id()))
    }

    #[test]
    fn write_then_read_round_trips_within_quantization() {
        let path = temp_path("roundtrip.wav");
        let original = Recording {
            samples: (0..64)
                .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 16.0).sin() * 0.8)
                .collect(),
            sample_rate: 16_000,
        };
        save_recording(&path, &original).unwrap();
        let loaded = load_recording(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.sample_rate, 16_000);
        assert_eq!(loaded.len(), original.len());
        for (a, b) in loaded.samples.iter().zip(&original.samples) {
            assert!((a - b).abs() < 1.0 / 16_000.0, "{a} vs {b}");
        }
    }

    #[test]
    fn stereo_input_is_averaged_to_mono() {
        let path = temp_path("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..8 {
            writer.write_sample(i16::MAX / 2).unwrap();
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        let loaded = load_recording(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.len(), 8);
        for s in &loaded.samples {
            assert!((s - 0.25).abs() < 1e-3);
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_recording(Path::new("/nonexistent/morph.wav")).unwrap_err();
        assert!(matches!(err, MorphError::Io(_)));
    }
}
