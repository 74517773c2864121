//! Seams to external services: script generation and transcription.
//!
//! Only the data contracts live here. The crate ships a file-backed transcriber; generation
//! backends are supplied by the embedding application.

use std::path::{Path, PathBuf};

use crate::config::{RenderRequest, ScriptSource};
use crate::foundation::error::{KineError, KineResult};
use crate::markup::script::{ensure_emphasis, parse_script};
use crate::markup::token::StyledToken;
use crate::timeline::model::TranscriptSegment;

/// Requested script length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPreset {
    Short,
    #[default]
    Medium,
    Long,
}

/// Prompt sent to a script generator.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScriptRequest {
    pub prompt: String,
    pub tone: String,
    pub length: LengthPreset,
    pub language: String,
}

/// Produces a script (possibly containing markup) from a prompt.
pub trait ScriptGenerator {
    fn generate(&self, request: &ScriptRequest) -> KineResult<String>;
}

/// Transcription result.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Check segment ordering and bounds.
    pub fn validate(&self) -> KineResult<()> {
        for s in &self.segments {
            if !(s.start.is_finite() && s.end.is_finite()) || s.start < 0.0 || s.start >= s.end {
                return Err(KineError::input(format!(
                    "transcript segment '{}' has invalid bounds {}..{}",
                    s.text, s.start, s.end
                )));
            }
        }
        if self.segments.windows(2).any(|w| w[1].start < w[0].start) {
            return Err(KineError::input("transcript segments are not ordered by start"));
        }
        Ok(())
    }
}

/// Turns audio into a transcript.
pub trait Transcriber {
    fn transcribe(&self, audio: &[u8], mime_type: &str) -> KineResult<Transcript>;
}

/// Transcriber backed by a JSON sidecar written by an earlier transcription run.
#[derive(Clone, Debug)]
pub struct TranscriptFile {
    pub path: PathBuf,
}

impl TranscriptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Transcriber for TranscriptFile {
    fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> KineResult<Transcript> {
        let f = std::fs::File::open(&self.path).map_err(|e| {
            KineError::input(format!(
                "failed to open transcript '{}': {e}",
                self.path.display()
            ))
        })?;
        let t: Transcript = serde_json::from_reader(std::io::BufReader::new(f)).map_err(|e| {
            KineError::input(format!(
                "failed to parse transcript '{}': {e}",
                self.path.display()
            ))
        })?;
        t.validate()?;
        Ok(t)
    }
}

/// Generate a script and make sure it carries at least one emphasized word.
pub fn prepare_generated_script(
    generator: &dyn ScriptGenerator,
    request: &ScriptRequest,
    seed: u64,
) -> KineResult<Vec<StyledToken>> {
    let text = generator.generate(request)?;
    let tokens = ensure_emphasis(parse_script(&text), seed);
    if tokens.is_empty() {
        return Err(KineError::input("script generator returned an empty script"));
    }
    Ok(tokens)
}

/// Words and optional timing for one session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScriptInput {
    pub tokens: Vec<StyledToken>,
    pub segments: Vec<TranscriptSegment>,
}

impl ScriptInput {
    /// Parse a plain script without timing.
    pub fn from_text(text: &str) -> KineResult<Self> {
        let tokens = parse_script(text);
        if tokens.is_empty() {
            return Err(KineError::input("script is empty"));
        }
        Ok(Self {
            tokens,
            segments: Vec::new(),
        })
    }
}

fn audio_mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "oga" | "opus") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("m4a" | "mp4" | "aac") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Resolve the script and timing for `request`.
///
/// Text mode tolerates a failing transcriber (the session simply runs untimed). Literal mode
/// requires both an audio track and a usable transcript; anything else is an input error.
pub fn resolve_script(
    request: &RenderRequest,
    transcriber: Option<&dyn Transcriber>,
) -> KineResult<ScriptInput> {
    let sidecar = request.transcript.as_ref().map(TranscriptFile::new);
    let transcriber = transcriber.or(sidecar.as_ref().map(|t| t as &dyn Transcriber));

    let transcribe = |audio: &Path| -> KineResult<Transcript> {
        let Some(t) = transcriber else {
            return Err(KineError::input("no transcriber configured"));
        };
        let bytes = std::fs::read(audio).map_err(|e| {
            KineError::input(format!("failed to read audio '{}': {e}", audio.display()))
        })?;
        t.transcribe(&bytes, audio_mime_type(audio))
    };

    match &request.script {
        ScriptSource::Text { text } => {
            let mut input = ScriptInput::from_text(text)?;
            if let (Some(audio), Some(_)) = (request.audio.as_deref(), transcriber) {
                match transcribe(audio) {
                    Ok(t) => input.segments = t.segments,
                    Err(e) => {
                        tracing::warn!(error = %e, "transcription failed; rendering without timestamps")
                    }
                }
            }
            Ok(input)
        }
        ScriptSource::Transcript => {
            let audio = request
                .audio
                .as_deref()
                .ok_or_else(|| KineError::input("literal mode requires an audio track"))?;
            let transcript = transcribe(audio).map_err(|e| {
                KineError::input(format!("transcription failed: {}", e.user_message()))
            })?;
            let tokens = parse_script(&transcript.text);
            if tokens.is_empty() {
                return Err(KineError::input("transcript contains no words"));
            }
            Ok(ScriptInput {
                tokens,
                segments: transcript.segments,
            })
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/collab/resolve.rs"]
mod tests;
