// Braille cells give us a 2x4 subpixel grid per terminal cell; all scene
// coordinates are in subpixels.
pub(crate) const SUBCELL_W: u32 = 2;
pub(crate) const SUBCELL_H: u32 = 4;

/// Elapsed-time cap per frame, so a suspended terminal does not make the
/// scene lurch when it wakes up.
pub(crate) const DT_CAP_MS: f32 = 33.0;

pub(crate) const BLOB_COUNT: usize = 8;
// Blob velocities are sampled in "canvas units"; this converts them to
// subpixels per millisecond.
pub(crate) const BLOB_DRIFT: f32 = 0.024;

pub(crate) const METEOR_LIFE_MS: (f32, f32) = (500.0, 900.0);
pub(crate) const METEOR_SPAWN_DELAY_MS: (f32, f32) = (1500.0, 6000.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Surface {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    /// Width in subpixels.
    pub(crate) w: f32,
    /// Height in subpixels.
    pub(crate) h: f32,
}

impl Surface {
    pub(crate) fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            w: (cols as u32 * SUBCELL_W) as f32,
            h: (rows as u32 * SUBCELL_H) as f32,
        }
    }

    pub(crate) fn area(&self) -> f32 {
        self.w * self.h
    }
}

#[derive(Clone, Copy)]
pub(crate) struct StarLayer {
    /// Subpixels of surface area per star; bigger means sparser.
    pub(crate) density: f32,
    pub(crate) speed: f32,
    pub(crate) size: [f32; 2],
    pub(crate) alpha: [f32; 2],
}

// Three parallax layers, back to front: the far layer is dense, slow and
// dim; the near layer sparse, fast and bright. Densities divide a doubled
// cell grid evenly so counts scale exactly with area.
pub(crate) const LAYERS: [StarLayer; 3] = [
    StarLayer {
        density: 400.0,
        speed: 0.03,
        size: [0.6, 1.2],
        alpha: [0.35, 0.6],
    },
    StarLayer {
        density: 640.0,
        speed: 0.06,
        size: [0.9, 1.8],
        alpha: [0.45, 0.8],
    },
    StarLayer {
        density: 960.0,
        speed: 0.12,
        size: [1.4, 2.6],
        alpha: [0.5, 0.95],
    },
];

#[derive(Clone, Copy, Debug)]
pub(crate) struct Star {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) r: f32,
    /// Base opacity; twinkle modulates around it.
    pub(crate) alpha: f32,
    /// Twinkle rate in radians per millisecond.
    pub(crate) twinkle_rate: f32,
    pub(crate) twinkle_phase: f32,
    /// Horizontal drift factor from the owning layer.
    pub(crate) speed: f32,
    pub(crate) layer: usize,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Blob {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) r: f32,
    /// Hue in degrees, restricted to a blue band at build time.
    pub(crate) hue: f32,
    /// Saturation in percent.
    pub(crate) sat: f32,
    pub(crate) alpha: f32,
    pub(crate) dx: f32,
    pub(crate) dy: f32,
    /// Pulse rate in radians per millisecond.
    pub(crate) pulse: f32,
    pub(crate) phase: f32,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Meteor {
    pub(crate) x: f32,
    pub(crate) y: f32,
    /// Velocity in subpixels per millisecond.
    pub(crate) vx: f32,
    pub(crate) vy: f32,
    pub(crate) born_ms: f32,
    pub(crate) life_ms: f32,
    /// Trail length in subpixels.
    pub(crate) len: f32,
    pub(crate) width: f32,
}

impl Meteor {
    /// Remaining-lifespan fraction: 1 at birth, 0 at expiry, floored at 0.
    pub(crate) fn life_ratio(&self, now_ms: f32) -> f32 {
        (1.0 - (now_ms - self.born_ms) / self.life_ms).max(0.0)
    }
}

/// Repeating meteor-spawn deadline. Plain data checked once per tick, so
/// spawning can be started and stopped instead of living in an untracked
/// timer chain.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SpawnTimer {
    next_at_ms: Option<f32>,
}

impl SpawnTimer {
    pub(crate) fn arm(&mut self, now_ms: f32, delay_ms: f32) {
        self.next_at_ms = Some(now_ms + delay_ms);
    }

    pub(crate) fn cancel(&mut self) {
        self.next_at_ms = None;
    }

    pub(crate) fn armed(&self) -> bool {
        self.next_at_ms.is_some()
    }

    pub(crate) fn due(&self, now_ms: f32) -> bool {
        self.deadline().is_some_and(|t| now_ms >= t)
    }

    pub(crate) fn deadline(&self) -> Option<f32> {
        self.next_at_ms
    }
}

/// The whole simulation: one owned object handed to update and draw code,
/// nothing global.
pub(crate) struct Sky {
    pub(crate) surface: Surface,
    pub(crate) stars: Vec<Star>,
    pub(crate) blobs: Vec<Blob>,
    pub(crate) meteors: Vec<Meteor>,
    pub(crate) spawner: SpawnTimer,
    pub(crate) now_ms: f32,
    pub(crate) last_ms: Option<f32>,
}

impl Sky {
    pub(crate) fn new(cols: u16, rows: u16) -> Self {
        Self {
            surface: Surface::new(cols, rows),
            stars: Vec::new(),
            blobs: Vec::new(),
            meteors: Vec::new(),
            spawner: SpawnTimer::default(),
            now_ms: 0.0,
            last_ms: None,
        }
    }
}
