//! WAV file round trips through real temporary files.

use cadena_core::SampleBuffer;
use cadena_core::chain::{Chain, PeriodSink, Source};
use cadena_core::info::ChainInfo;
use cadena_io::{WavCapture, WavFormat, WavSpec, read_wav, read_wav_info, write_wav};
use cadena_modules::SquareOscillator;

fn temp_wav(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    (dir, path)
}

#[test]
fn float_round_trip_is_close() {
    let (_dir, path) = temp_wav("float.wav");
    let original = SampleBuffer::from_interleaved(
        &[0.0, 0.5, -0.5, 0.25, -0.25, 1.0, -1.0, 0.125],
        2,
        48_000.0,
    );
    write_wav(&path, &original, WavSpec::for_buffer(&original)).unwrap();

    let loaded = read_wav(&path).unwrap();
    assert_eq!(loaded.channels(), 2);
    assert_eq!(loaded.channel_capacity(), 4);
    assert!((loaded.sample_rate() - 48_000.0).abs() < f64::EPSILON);
    for (a, b) in loaded.iter_interleaved().zip(original.iter_interleaved()) {
        // f64 -> f32 -> f64 costs precision, nothing more.
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn pcm16_round_trip_within_quantization() {
    let (_dir, path) = temp_wav("pcm.wav");
    let original = SampleBuffer::from_interleaved(&[0.0, 0.5, -0.5, 0.9, -0.9, 0.1], 1, 44_100.0);
    let spec = WavSpec {
        bits_per_sample: 16,
        ..WavSpec::for_buffer(&original)
    };
    write_wav(&path, &original, spec).unwrap();

    let loaded = read_wav(&path).unwrap();
    for (a, b) in loaded.iter_interleaved().zip(original.iter_interleaved()) {
        assert!((a - b).abs() < 1.0 / 32_000.0);
    }
}

#[test]
fn pcm32_normalization_keeps_sign() {
    let (_dir, path) = temp_wav("pcm32.wav");
    // Our writer emits float at 32 bits, but files from elsewhere can be
    // 32-bit integer PCM.
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    writer.write_sample(1i32 << 30).unwrap();
    writer.write_sample(-(1i32 << 30)).unwrap();
    writer.finalize().unwrap();

    let loaded = read_wav(&path).unwrap();
    assert!((loaded.get(0, 0) - 0.5).abs() < 1e-9);
    assert!((loaded.get(0, 1) + 0.5).abs() < 1e-9);
}

#[test]
fn info_reports_header_without_loading() {
    let (_dir, path) = temp_wav("info.wav");
    let buf = SampleBuffer::new(441, 2, 44_100.0);
    write_wav(&path, &buf, WavSpec::for_buffer(&buf)).unwrap();

    let info = read_wav_info(&path).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 44_100);
    assert_eq!(info.num_frames, 441);
    assert_eq!(info.format, WavFormat::IeeeFloat);
    assert!((info.duration_secs - 0.01).abs() < 1e-9);
}

#[test]
fn capture_records_a_running_chain() {
    let (_dir, path) = temp_wav("capture.wav");
    let chain = Chain::new(WavCapture::new(), Source::new(SquareOscillator::new(100.0)));
    let mut sink = PeriodSink::with_chain_info(chain, ChainInfo::new(44_100.0, 32, 1));
    sink.meta_info_sync().unwrap();
    sink.meta_start().unwrap();
    for _ in 0..4 {
        sink.meta_process().unwrap();
        sink.take_output().unwrap();
    }
    sink.meta_stop().unwrap();

    let capture = sink.backward().module();
    assert_eq!(capture.frames(), 128);
    capture.save(&path).unwrap();

    let loaded = read_wav(&path).unwrap();
    assert_eq!(loaded.channel_capacity(), 128);
    assert!(loaded.iter_sequential().all(|&s| s.abs() > 0.99));
}

#[test]
fn missing_file_is_a_wav_error() {
    let err = read_wav("/nonexistent/not-there.wav").unwrap_err();
    assert!(matches!(err, cadena_io::Error::Wav(_)));
}
