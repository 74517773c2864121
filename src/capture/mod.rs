pub(crate) mod clock;
pub(crate) mod ffmpeg;
pub(crate) mod recorder;
pub(crate) mod session;
