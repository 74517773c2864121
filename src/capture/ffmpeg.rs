use std::io::{Read, Write as _};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::capture::recorder::{EncodingProfile, Recorder, RecorderConfig, RecorderFactory};
use crate::foundation::error::{KineError, KineResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// Recorder that streams raw frames into a system `ffmpeg` and collects the encoded container
/// from its stdout.
pub struct FfmpegRecorder {
    cfg: RecorderConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
}

impl FfmpegRecorder {
    pub fn spawn(cfg: RecorderConfig) -> KineResult<Self> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KineError::validation("recorder width/height must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(KineError::validation(
                "recorder width/height must be even (required for 4:2:0 output)",
            ));
        }

        let profile = cfg.profile;
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
        ]);
        if let Some(audio) = cfg.audio.as_deref() {
            cmd.arg("-i").arg(audio);
            cmd.args(["-map", "0:v", "-map", "1:a?", "-c:a", profile.audio_codec()]);
        } else {
            cmd.arg("-an");
        }
        cmd.args(["-c:v", profile.codec(), "-pix_fmt", profile.pix_fmt()]);
        match profile {
            EncodingProfile::Vp8Alpha | EncodingProfile::Vp8 => {
                cmd.args(["-auto-alt-ref", "0", "-b:v", "4M"]);
            }
            EncodingProfile::Vp9Alpha | EncodingProfile::Vp9 => {
                cmd.args(["-b:v", "0", "-crf", "32", "-row-mt", "1"]);
            }
            EncodingProfile::H264 => {
                cmd.args(["-movflags", "frag_keyframe+empty_moov+default_base_moof"]);
            }
        }
        cmd.args(["-f", profile.container(), "pipe:1"]);

        let mut child = cmd.spawn().map_err(|e| {
            KineError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KineError::capture("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| KineError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| KineError::capture("failed to open ffmpeg stderr (unexpected)"))?;

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&chunks);
        let stdout_drain = std::thread::spawn(move || {
            let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                if let Ok(mut chunks) = sink.lock() {
                    chunks.push(buf[..n].to_vec());
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(profile = %profile, width = cfg.width, height = cfg.height, "ffmpeg recorder spawned");
        Ok(Self {
            scratch: vec![0u8; cfg.width as usize * cfg.height as usize * 4],
            cfg,
            child: Some(child),
            stdin: Some(stdin),
            chunks,
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
        })
    }
}

impl Recorder for FfmpegRecorder {
    fn push_frame(&mut self, frame: &FrameRGBA) -> KineResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(KineError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(KineError::capture(
                "frame.data size mismatch with width*height*4",
            ));
        }

        if self.cfg.profile.supports_alpha() {
            unpremultiply_into(&mut self.scratch, &frame.data, frame.premultiplied);
        } else {
            let m = self.cfg.matte;
            flatten_over_matte(&mut self.scratch, &frame.data, frame.premultiplied, [m.r, m.g, m.b]);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(KineError::capture("ffmpeg recorder is already stopped"));
        };
        stdin
            .write_all(&self.scratch)
            .map_err(|e| KineError::capture(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    fn stop(&mut self) -> KineResult<Vec<Vec<u8>>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| KineError::finalize("ffmpeg recorder already stopped"))?;

        let status = child
            .wait()
            .map_err(|e| KineError::finalize(format!("failed to wait for ffmpeg to finish: {e}")))?;
        if let Some(handle) = self.stdout_drain.take() {
            handle
                .join()
                .map_err(|_| KineError::finalize("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| KineError::finalize(format!("ffmpeg stdout read failed: {e}")))?;
        }
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| KineError::finalize("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| KineError::finalize(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            return Err(KineError::finalize(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }

        let mut chunks = self
            .chunks
            .lock()
            .map_err(|_| KineError::finalize("ffmpeg output buffer poisoned"))?;
        Ok(std::mem::take(&mut *chunks))
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Factory that checks which encoders the local `ffmpeg` build provides.
#[derive(Clone, Debug, Default)]
pub struct FfmpegRecorderFactory {
    encoders: Option<String>,
}

impl FfmpegRecorderFactory {
    /// Query `ffmpeg -encoders` once.
    pub fn detect() -> Self {
        let encoders = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).into_owned());
        if encoders.is_none() {
            tracing::warn!("ffmpeg not found on PATH; export is unavailable");
        }
        Self { encoders }
    }
}

impl RecorderFactory for FfmpegRecorderFactory {
    fn probe(&self) -> KineResult<()> {
        if self.encoders.is_none() {
            return Err(KineError::capture(
                "no capture method available: ffmpeg was not found on PATH",
            ));
        }
        Ok(())
    }

    fn is_supported(&self, profile: EncodingProfile) -> bool {
        let Some(list) = self.encoders.as_deref() else {
            return false;
        };
        list.lines()
            .filter_map(|l| l.split_whitespace().nth(1))
            .any(|name| name == profile.codec())
    }

    fn create(&self, cfg: &RecorderConfig) -> KineResult<Box<dyn Recorder>> {
        Ok(Box::new(FfmpegRecorder::spawn(cfg.clone())?))
    }
}

/// Write the artifact bytes to `path`, creating parent directories.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> KineResult<()> {
    use anyhow::Context as _;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

fn unpremultiply_into(dst: &mut [u8], src: &[u8], src_is_premul: bool) {
    dst.copy_from_slice(src);
    if !src_is_premul {
        return;
    }
    for px in dst.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn flatten_over_matte(dst: &mut [u8], src: &[u8], src_is_premul: bool, matte: [u8; 3]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for i in 0..3 {
            let c = if src_is_premul {
                u16::from(s[i])
            } else {
                mul_div255_u16(u16::from(s[i]), a)
            };
            d[i] = (c + mul_div255_u16(u16::from(matte[i]), inv)).min(255) as u8;
        }
        d[3] = 255;
    }
}
