//! Keyframe animation: sampled channels, per-node tracks and the mixer that
//! advances a clip over time.
//!
//! A glTF clip is stored as one [`AnimationTrack`] per targeted node, with
//! separate translation, rotation and scale channels. Sampling a track wraps
//! the playhead around the clip duration, so clips loop seamlessly.

use cgmath::{InnerSpace, VectorSpace};
use instant::Duration;

use crate::data_structures::instance::Instance;

/// Values a keyframe channel can blend between.
pub trait Interpolate: Copy {
    fn interpolate(a: Self, b: Self, amount: f32) -> Self;
}

impl Interpolate for cgmath::Vector3<f32> {
    fn interpolate(a: Self, b: Self, amount: f32) -> Self {
        a.lerp(b, amount)
    }
}

impl Interpolate for cgmath::Quaternion<f32> {
    fn interpolate(a: Self, b: Self, amount: f32) -> Self {
        // Flip to the same hemisphere so the blend takes the short way round.
        let b = if a.dot(b) < 0.0 { -b } else { b };
        a.nlerp(b, amount)
    }
}

/// One sampled keyframe channel: timestamps in seconds plus a value per
/// timestamp.
#[derive(Clone, Debug)]
pub struct Channel<T: Interpolate> {
    pub timestamps: Vec<f32>,
    pub values: Vec<T>,
}

impl<T: Interpolate> Channel<T> {
    /// Sample at `time` seconds. Clamps outside the keyframe range and
    /// interpolates linearly inside it.
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.values.is_empty() || self.timestamps.len() != self.values.len() {
            return None;
        }
        let after = self.timestamps.partition_point(|&ts| ts <= time);
        if after == 0 {
            return self.values.first().copied();
        }
        if after == self.timestamps.len() {
            return self.values.last().copied();
        }
        let (t0, t1) = (self.timestamps[after - 1], self.timestamps[after]);
        let span = t1 - t0;
        let amount = if span > 0.0 { (time - t0) / span } else { 0.0 };
        Some(T::interpolate(
            self.values[after - 1],
            self.values[after],
            amount,
        ))
    }

    fn end(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }
}

/// All channels of one clip that target one scene node.
#[derive(Clone, Debug)]
pub struct AnimationTrack {
    pub name: String,
    pub translation: Option<Channel<cgmath::Vector3<f32>>>,
    pub rotation: Option<Channel<cgmath::Quaternion<f32>>>,
    pub scale: Option<Channel<cgmath::Vector3<f32>>>,
}

impl AnimationTrack {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            translation: None,
            rotation: None,
            scale: None,
        }
    }

    /// Clip length in seconds, the end of the longest channel.
    pub fn duration(&self) -> f32 {
        let t = self.translation.as_ref().map(Channel::end).unwrap_or(0.0);
        let r = self.rotation.as_ref().map(Channel::end).unwrap_or(0.0);
        let s = self.scale.as_ref().map(Channel::end).unwrap_or(0.0);
        t.max(r).max(s)
    }

    /// The node's pose at `time` seconds, looping over the clip duration.
    /// Components without a channel fall back to the rest pose.
    pub fn sample(&self, time: f32, rest: &Instance) -> Instance {
        let duration = self.duration();
        let time = if duration > 0.0 {
            time.rem_euclid(duration)
        } else {
            0.0
        };
        Instance {
            position: self
                .translation
                .as_ref()
                .and_then(|c| c.sample(time))
                .unwrap_or(rest.position),
            rotation: self
                .rotation
                .as_ref()
                .and_then(|c| c.sample(time))
                .unwrap_or(rest.rotation),
            scale: self
                .scale
                .as_ref()
                .and_then(|c| c.sample(time))
                .unwrap_or(rest.scale),
        }
    }
}

/// Playback state for one clip: which clip plays and how far along it is.
#[derive(Clone, Debug)]
pub struct Mixer {
    clip: String,
    elapsed: f32,
}

impl Mixer {
    pub fn play(clip: &str) -> Self {
        Self {
            clip: clip.to_string(),
            elapsed: 0.0,
        }
    }

    pub fn update(&mut self, dt: Duration) {
        self.elapsed += dt.as_secs_f32();
    }

    pub fn clip(&self) -> &str {
        &self.clip
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{One, Vector3};

    fn step_channel() -> Channel<Vector3<f32>> {
        Channel {
            timestamps: vec![0.0, 1.0, 2.0],
            values: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(1.0, 2.0, 0.0),
            ],
        }
    }

    #[test]
    fn channel_interpolates_between_keyframes() {
        let channel = step_channel();
        let mid = channel.sample(0.5).unwrap();
        assert!((mid.x - 0.5).abs() < 1e-6);
        assert_eq!(mid.y, 0.0);
    }

    #[test]
    fn channel_clamps_outside_range() {
        let channel = step_channel();
        assert_eq!(channel.sample(-1.0).unwrap(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(channel.sample(5.0).unwrap(), Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn track_loops_over_duration() {
        let track = AnimationTrack {
            translation: Some(step_channel()),
            ..AnimationTrack::new("walk")
        };
        let rest = Instance::default();
        let a = track.sample(0.5, &rest);
        let b = track.sample(2.5, &rest);
        assert!((a.position.x - b.position.x).abs() < 1e-6);
        assert!((a.position.y - b.position.y).abs() < 1e-6);
    }

    #[test]
    fn track_falls_back_to_rest_pose() {
        let track = AnimationTrack {
            translation: Some(step_channel()),
            ..AnimationTrack::new("walk")
        };
        let rest = Instance {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: Vector3::new(3.0, 3.0, 3.0),
        };
        let sampled = track.sample(0.5, &rest);
        assert_eq!(sampled.scale, rest.scale);
        assert_eq!(sampled.rotation, rest.rotation);
    }

    #[test]
    fn mixer_accumulates_time() {
        let mut mixer = Mixer::play("walk");
        mixer.update(Duration::from_millis(500));
        mixer.update(Duration::from_millis(250));
        assert!((mixer.elapsed() - 0.75).abs() < 1e-6);
        assert_eq!(mixer.clip(), "walk");
    }
}
