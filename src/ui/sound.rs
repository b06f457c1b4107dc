/// Procedural chiptune effects played through rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time and kept
/// in an `AssetTable<SoundId, _>`. Playback is fire-and-forget
/// (non-blocking) via rodio's Sink, scaled by the volume slider.
///
/// Without the "sound" feature a silent stub with the same API is
/// compiled instead.

use crate::sim::assets::SoundId;
use crate::sim::event::GameEvent;

/// Which effect, if any, a tick event should trigger.
pub fn sound_for(event: &GameEvent) -> Option<SoundId> {
    match event {
        GameEvent::Jumped => Some(SoundId::Jump),
        GameEvent::Landed => Some(SoundId::Land),
        GameEvent::Pushed { .. } => Some(SoundId::Push),
        GameEvent::Collected { .. } => Some(SoundId::Collect),
        GameEvent::Won { .. } => Some(SoundId::Win),
        GameEvent::Lost { .. } => Some(SoundId::Lose),
        GameEvent::ButtonClicked | GameEvent::Saved => Some(SoundId::Click),
        GameEvent::StageChanged { .. } | GameEvent::Message(_) => None,
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::sound_for;
    use crate::sim::assets::{AssetTable, SoundId};
    use crate::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        effects: AssetTable<SoundId, Arc<Vec<u8>>>,
        volume: f32,
    }

    impl SoundEngine {
        pub fn new(volume: f64) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            let effects = AssetTable::load_all(&SoundId::ALL, |id| Arc::new(make_wav(&generate(id))));

            Some(SoundEngine {
                _stream: stream,
                handle,
                effects,
                volume: volume as f32,
            })
        }

        pub fn set_volume(&mut self, volume: f64) {
            self.volume = volume.clamp(0.0, 1.0) as f32;
        }

        pub fn play(&self, id: SoundId) {
            if self.volume <= 0.0 {
                return;
            }
            let wav = Cursor::new(self.effects.get(id).as_ref().clone());
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(wav) {
                    sink.set_volume(self.volume);
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_events(&self, events: &[GameEvent]) {
            for id in events.iter().filter_map(sound_for) {
                self.play(id);
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn generate(id: SoundId) -> Vec<f32> {
        match id {
            SoundId::Jump => gen_sweep(300.0, 700.0, 0.12, 0.25),
            SoundId::Land => gen_thud(),
            SoundId::Push => gen_sweep(500.0, 150.0, 0.18, 0.3),
            SoundId::Collect => gen_pickup(),
            SoundId::Win => gen_fanfare(),
            SoundId::Lose => gen_lose(),
            SoundId::Click => gen_blip(880.0, 0.03, 0.2),
        }
    }

    fn tone(t: f32, freq: f32) -> f32 {
        (t * freq * std::f32::consts::TAU).sin()
    }

    fn sample_count(seconds: f32) -> usize {
        (SAMPLE_RATE as f32 * seconds) as usize
    }

    /// One note at `freq` for `seconds`; `shape` maps (time, progress) to a sample.
    fn note(seconds: f32, mut shape: impl FnMut(f32, f32) -> f32) -> impl Iterator<Item = f32> {
        let n = sample_count(seconds);
        (0..n).map(move |i| shape(i as f32 / SAMPLE_RATE as f32, i as f32 / n as f32))
    }

    fn gen_blip(freq: f32, seconds: f32, gain: f32) -> Vec<f32> {
        note(seconds, |t, p| tone(t, freq) * (1.0 - p) * gain).collect()
    }

    /// Linear pitch sweep; rising for jumps, falling for a push.
    fn gen_sweep(from: f32, to: f32, seconds: f32, gain: f32) -> Vec<f32> {
        let mut phase = 0.0_f32;
        note(seconds, |_, p| {
            phase += (from + (to - from) * p) / SAMPLE_RATE as f32;
            (phase * std::f32::consts::TAU).sin() * (1.0 - p).powf(0.6) * gain
        })
        .collect()
    }

    /// Landing: a low thump tinted with xorshift noise.
    fn gen_thud() -> Vec<f32> {
        let mut state: u32 = 0x9e37_79b9;
        note(0.06, |t, p| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = state as f32 / u32::MAX as f32 * 2.0 - 1.0;
            (tone(t, 90.0) * 0.7 + noise * 0.3) * (1.0 - p) * 0.3
        })
        .collect()
    }

    /// Coin: C6, E6, G6 with a third harmonic for a brighter edge.
    fn gen_pickup() -> Vec<f32> {
        [1047.0_f32, 1319.0, 1568.0]
            .iter()
            .flat_map(|&f| {
                note(0.045, move |t, p| {
                    (tone(t, f) * 0.7 + tone(t, f * 3.0) * 0.3) * (1.0 - p.sqrt()) * 0.25
                })
            })
            .collect()
    }

    /// Goal reached: C5, E5, G5 then a held C6.
    fn gen_fanfare() -> Vec<f32> {
        [(523.0_f32, 0.1_f32), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)]
            .iter()
            .flat_map(|&(f, secs)| {
                note(secs, move |t, p| {
                    let wave = tone(t, f) * 0.6 + tone(t, f * 2.0) * 0.3 + tone(t, f * 3.0) * 0.1;
                    wave * (1.0 - p * 0.6) * 0.3
                })
            })
            .collect()
    }

    /// Fell out of the level: four falling notes, the last quarter faded.
    fn gen_lose() -> Vec<f32> {
        let mut samples: Vec<f32> = [440.0_f32, 370.0, 311.0, 261.0]
            .iter()
            .flat_map(|&f| note(0.12, move |t, p| tone(t, f) * (1.0 - p * 0.3) * 0.3))
            .collect();
        let fade = samples.len() / 4;
        let start = samples.len() - fade;
        for (k, s) in samples[start..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const HEADER_LEN: u32 = 44;
        let data_len = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity((HEADER_LEN + data_len) as usize);
        let mut chunk = |tag: &[u8], body: &[u8]| {
            buf.extend_from_slice(tag);
            buf.extend_from_slice(body);
        };
        chunk(b"RIFF", &(HEADER_LEN - 8 + data_len).to_le_bytes());
        chunk(b"WAVE", &[]);

        let mut fmt = Vec::with_capacity(20);
        fmt.extend_from_slice(&16u32.to_le_bytes());
        fmt.extend_from_slice(&1u16.to_le_bytes()); // PCM
        fmt.extend_from_slice(&1u16.to_le_bytes()); // mono
        fmt.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        fmt.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        fmt.extend_from_slice(&2u16.to_le_bytes());
        fmt.extend_from_slice(&16u16.to_le_bytes());
        chunk(b"fmt ", &fmt);
        chunk(b"data", &data_len.to_le_bytes());

        buf.extend(
            samples
                .iter()
                .flat_map(|s| ((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes()),
        );
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_encodes_a_wav() {
            for id in SoundId::ALL {
                let samples = generate(id);
                assert!(!samples.is_empty(), "{id:?} is silent");
                let wav = make_wav(&samples);
                assert_eq!(&wav[0..4], b"RIFF");
                assert_eq!(&wav[8..12], b"WAVE");
                assert_eq!(wav.len(), 44 + samples.len() * 2);
            }
        }
    }
}

// ── Silent stub ──

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_volume: f64) -> Option<Self> { Some(SoundEngine) }
    pub fn set_volume(&mut self, _volume: f64) {}
    pub fn play(&self, _id: SoundId) {}
    pub fn play_events(&self, _events: &[GameEvent]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gameplay_events_have_effects() {
        assert_eq!(sound_for(&GameEvent::Jumped), Some(SoundId::Jump));
        assert_eq!(sound_for(&GameEvent::Pushed { enemy: 2 }), Some(SoundId::Push));
        assert_eq!(sound_for(&GameEvent::Won { level: 0 }), Some(SoundId::Win));
        assert_eq!(sound_for(&GameEvent::ButtonClicked), Some(SoundId::Click));
    }

    #[test]
    fn bookkeeping_events_are_silent() {
        use crate::sim::stage::StageId;
        let change = GameEvent::StageChanged { from: StageId::MainMenu, to: StageId::Playing };
        assert_eq!(sound_for(&change), None);
        assert_eq!(sound_for(&GameEvent::Message("x".into())), None);
    }
}
