use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use path_defence_core::AudioCue;
use path_defence_system_wave_loop::AudioSink;
use tracing::{debug, trace};

#[derive(Debug)]
enum Message {
    Play(AudioCue),
    Volume { sfx: f32, music: f32 },
}

/// Audio sink that hands cues to a background worker thread.
///
/// The terminal build has no mixer; the worker logs each audible cue and
/// counts it, so playback never blocks the simulation.
#[derive(Debug)]
pub(crate) struct AudioWorker {
    sender: Sender<Message>,
    handle: JoinHandle<u32>,
}

impl AudioWorker {
    /// Starts the worker thread.
    pub(crate) fn spawn() -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("audio".to_owned())
            .spawn(move || run(receiver))
            .context("failed to start the audio thread")?;
        Ok(Self { sender, handle })
    }

    /// Stops the worker once every queued cue has been handled and returns
    /// the number of audible cues it played.
    pub(crate) fn shutdown(self) -> Result<u32> {
        drop(self.sender);
        self.handle
            .join()
            .map_err(|_| anyhow!("audio thread panicked"))
    }

    fn send(&self, message: Message) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| anyhow!("audio thread is no longer running"))
    }
}

impl AudioSink for AudioWorker {
    fn play(&mut self, cue: AudioCue) -> Result<()> {
        self.send(Message::Play(cue))
    }

    fn set_volume(&mut self, sfx: f32, music: f32) -> Result<()> {
        self.send(Message::Volume {
            sfx: sfx.clamp(0.0, 1.0),
            music: music.clamp(0.0, 1.0),
        })
    }
}

fn run(receiver: Receiver<Message>) -> u32 {
    let mut sfx_volume = 1.0_f32;
    let mut music_volume = 1.0_f32;
    let mut played = 0;
    for message in receiver {
        match message {
            Message::Volume { sfx, music } => {
                sfx_volume = sfx;
                music_volume = music;
                debug!(sfx, music, "volume changed");
            }
            Message::Play(cue) => {
                let volume = match cue {
                    AudioCue::Music => music_volume,
                    _ => sfx_volume,
                };
                if volume > 0.0 {
                    trace!(cue = cue.key(), volume, "cue played");
                    played += 1;
                }
            }
        }
    }
    played
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::TowerKind;

    #[test]
    fn worker_counts_audible_cues() {
        let mut audio = AudioWorker::spawn().expect("audio thread starts");
        audio.play(AudioCue::Music).expect("worker running");
        audio.play(AudioCue::Build).expect("worker running");
        audio.set_volume(0.0, 0.5).expect("worker running");
        audio
            .play(AudioCue::Shoot(TowerKind::Laser))
            .expect("worker running");
        audio.play(AudioCue::Music).expect("worker running");

        assert_eq!(audio.shutdown().expect("worker joins"), 3);
    }

    #[test]
    fn muted_worker_plays_nothing() {
        let mut audio = AudioWorker::spawn().expect("audio thread starts");
        audio.set_volume(0.0, 0.0).expect("worker running");
        for cue in [AudioCue::Music, AudioCue::Death, AudioCue::LoseLife] {
            audio.play(cue).expect("worker running");
        }
        assert_eq!(audio.shutdown().expect("worker joins"), 0);
    }
}
