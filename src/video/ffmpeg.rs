//! ffmpeg-backed frame source
//!
//! Stream geometry and frame rate come from `ffprobe`; frames are decoded by an
//! `ffmpeg` child process writing raw RGB24 to a pipe, one fixed-size frame at
//! a time.

use crate::error::{Result, SyncError};
use crate::types::VideoFrame;
use crate::video::sampler::FrameSource;
use log::{debug, warn};
use std::ffi::OsString;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

/// Stream properties read with ffprobe
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// Parse an ffprobe rate such as `30000/1001` or `30`
pub fn parse_frame_rate(rate: &str) -> f64 {
    if let Some((num, den)) = rate.split_once('/') {
        let num: f64 = num.trim().parse().unwrap_or(0.0);
        let den: f64 = den.trim().parse().unwrap_or(0.0);
        if den != 0.0 {
            return num / den;
        }
        return 0.0;
    }
    rate.trim().parse().unwrap_or(0.0)
}

/// Read the first video stream's properties from ffprobe JSON output
pub fn parse_probe_output(json: &[u8]) -> Result<StreamInfo> {
    let value: serde_json::Value = serde_json::from_slice(json)
        .map_err(|e| SyncError::External(format!("ffprobe returned invalid JSON: {}", e)))?;

    let stream = value["streams"]
        .as_array()
        .and_then(|s| s.first())
        .ok_or_else(|| SyncError::InvalidSource("no video stream found".to_string()))?;

    let width = stream["width"].as_u64().unwrap_or(0) as u32;
    let height = stream["height"].as_u64().unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err(SyncError::InvalidSource(format!(
            "video stream reports {}x{} frames",
            width, height
        )));
    }

    // r_frame_rate is the container's nominal rate; avg_frame_rate is the fallback
    let frame_rate = ["r_frame_rate", "avg_frame_rate"]
        .iter()
        .filter_map(|key| stream[*key].as_str())
        .map(parse_frame_rate)
        .find(|fps| *fps > 0.0)
        .unwrap_or(0.0);

    Ok(StreamInfo {
        width,
        height,
        frame_rate,
    })
}

/// Run ffprobe against `video`
pub fn probe(ffprobe_path: &str, video: &Path) -> Result<StreamInfo> {
    let output = Command::new(ffprobe_path)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate",
            "-print_format",
            "json",
        ])
        .arg(video)
        .output()
        .map_err(|e| SyncError::External(format!("Failed to execute {}: {}", ffprobe_path, e)))?;

    if !output.status.success() {
        return Err(SyncError::External(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    parse_probe_output(&output.stdout)
}

/// Arguments that decode `video` to packed RGB24 on stdout
///
/// Autorotation is disabled so frames keep the coded width and height ffprobe
/// reports.
pub fn decode_args(video: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(video.as_os_str().to_os_string());
    args.extend(
        ["-f", "rawvideo", "-pix_fmt", "rgb24", "-"]
            .iter()
            .map(OsString::from),
    );
    args
}

/// Frames decoded by an ffmpeg child process
pub struct FfmpegSource {
    info: StreamInfo,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    finished: bool,
}

impl FfmpegSource {
    /// Open `video` with the ffmpeg/ffprobe binaries found at the given paths
    pub fn open(video: &Path, ffmpeg_path: &str, ffprobe_path: &str) -> Result<Self> {
        if !video.is_file() {
            return Err(SyncError::NotFound(video.to_path_buf()));
        }

        let info = probe(ffprobe_path, video)?;
        debug!(
            "Opened {:?}: {}x{} @ {:.3} fps",
            video, info.width, info.height, info.frame_rate
        );

        let mut child = Command::new(ffmpeg_path)
            .args(decode_args(video))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SyncError::External(format!("Failed to execute {}: {}", ffmpeg_path, e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SyncError::External("ffmpeg stdout was not captured".to_string()))?;

        // Drained concurrently; a full stderr pipe would stall ffmpeg
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        Ok(Self {
            info,
            child,
            stdout: BufReader::new(stdout),
            stderr,
            finished: false,
        })
    }

    /// Reap the decoder once stdout is exhausted; a failed exit becomes `External`
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait()?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(SyncError::External(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            debug!("ffmpeg: {}", stderr.trim());
        }
        Ok(())
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }
}

impl FrameSource for FfmpegSource {
    fn frame_rate(&self) -> f64 {
        self.info.frame_rate
    }

    fn read_next(&mut self) -> Result<Option<VideoFrame>> {
        if self.finished {
            return Ok(None);
        }

        let frame_len = VideoFrame::byte_len(self.info.width, self.info.height);
        let mut data = vec![0u8; frame_len];
        let mut filled = 0;

        while filled < frame_len {
            let n = self.stdout.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled < frame_len {
            self.finish()?;
            if filled > 0 {
                warn!(
                    "Dropping truncated final frame ({} of {} bytes)",
                    filled, frame_len
                );
            }
            return Ok(None);
        }

        Ok(Some(VideoFrame {
            width: self.info.width,
            height: self.info.height,
            data,
        }))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // ffmpeg may still be writing if sampling stopped early
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30"), 30.0);
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("0/0"), 0.0);
        assert_eq!(parse_frame_rate("n/a"), 0.0);
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{"streams":[{"width":3840,"height":2160,
            "r_frame_rate":"30000/1001","avg_frame_rate":"30000/1001"}]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (3840, 2160));
        assert!((info.frame_rate - 29.97).abs() < 0.001);
    }

    #[test]
    fn test_probe_falls_back_to_average_rate() {
        let json =
            br#"{"streams":[{"width":2,"height":2,"r_frame_rate":"0/0","avg_frame_rate":"25/1"}]}"#;
        assert_eq!(parse_probe_output(json).unwrap().frame_rate, 25.0);
    }

    #[test]
    fn test_probe_without_stream_is_invalid_source() {
        assert!(matches!(
            parse_probe_output(br#"{"streams":[]}"#),
            Err(SyncError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_open_missing_video_is_not_found() {
        let result =
            FfmpegSource::open(Path::new("/nonexistent/DJI_0001.MP4"), "ffmpeg", "ffprobe");
        assert!(matches!(result, Err(SyncError::NotFound(_))));
    }

    #[test]
    fn test_decode_args_disable_autorotation() {
        let args = decode_args(Path::new("DJI_0001.MP4"));
        let noautorotate = args.iter().position(|a| a == "-noautorotate").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(noautorotate < input);
        assert_eq!(args[input + 1], "DJI_0001.MP4");
        assert_eq!(args.last().unwrap(), "-");
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Stand-in ffprobe reporting a 2x2 stream at 30 fps
    #[cfg(unix)]
    fn fake_ffprobe(dir: &Path) -> String {
        write_script(
            dir,
            "ffprobe",
            r#"echo '{"streams":[{"width":2,"height":2,"r_frame_rate":"30/1"}]}'"#,
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_decoder_failure_surfaces_as_external_error() {
        use crate::video::FrameSampler;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let video = temp_dir.path().join("DJI_0001.MP4");
        std::fs::write(&video, b"corrupt").unwrap();
        let ffprobe = fake_ffprobe(temp_dir.path());
        let ffmpeg = write_script(
            temp_dir.path(),
            "ffmpeg",
            "echo 'Invalid data found when processing input' >&2; exit 1",
        );

        let mut source = FfmpegSource::open(&video, &ffmpeg, &ffprobe).unwrap();
        let out = temp_dir.path().join("frames");
        match FrameSampler::default().sample(&mut source, &out) {
            Err(SyncError::External(message)) => {
                assert!(message.contains("Invalid data found"), "message was {message}");
            }
            other => panic!("expected an external error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_decoder_success_yields_whole_frames() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let video = temp_dir.path().join("DJI_0001.MP4");
        std::fs::write(&video, b"placeholder").unwrap();
        let ffprobe = fake_ffprobe(temp_dir.path());
        // Two 2x2 RGB frames plus 5 stray bytes
        let ffmpeg = write_script(temp_dir.path(), "ffmpeg", "head -c 29 /dev/zero");

        let mut source = FfmpegSource::open(&video, &ffmpeg, &ffprobe).unwrap();
        assert_eq!(source.frame_rate(), 30.0);
        assert_eq!(source.read_next().unwrap().unwrap().data.len(), 12);
        assert_eq!(source.read_next().unwrap().unwrap().data.len(), 12);
        assert!(source.read_next().unwrap().is_none());
        assert!(source.read_next().unwrap().is_none());
    }
}
