//! Fire-and-forget sound effects. The core only names the cue; playback and
//! channels belong to whoever drains them.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Shot,
    /// Used instead of `Shot` for weapons firing faster than
    /// `FAST_SHOT_INTERVAL`.
    FastShot,
    Hit,
}

/// Fire intervals (seconds) below this use the fast shot sound.
pub const FAST_SHOT_INTERVAL: f32 = 0.14;

pub trait SoundSink {
    fn play_sfx(&mut self, cue: SoundCue);
}

/// Queue cues for the front end to drain after the frame.
impl SoundSink for Vec<SoundCue> {
    fn play_sfx(&mut self, cue: SoundCue) {
        self.push(cue);
    }
}

pub fn shot_cue(fire_interval: f32) -> SoundCue {
    if fire_interval >= FAST_SHOT_INTERVAL {
        SoundCue::Shot
    } else {
        SoundCue::FastShot
    }
}
