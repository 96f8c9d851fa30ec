use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Compteur FPS par fenêtre glissante. Zéro allocation après init.
///
/// # Example
/// ```
/// use ca_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(60);
/// counter.tick();
/// let fps = counter.fps();
/// assert!(fps >= 0.0);
/// ```
pub struct FpsCounter {
    /// Timestamps des dernières N frames.
    timestamps: VecDeque<Instant>,
    /// Taille de la fenêtre (nombre de frames à moyenner).
    window: usize,
    /// FPS calculé, mis à jour à chaque tick.
    fps: f64,
}

impl FpsCounter {
    /// Create a new FPS counter with the given averaging window size.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window: window.max(2),
            fps: 0.0,
        }
    }

    /// Appeler une fois par frame, APRÈS le rendu.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if let (Some(&first), true) = (self.timestamps.front(), self.timestamps.len() >= 2) {
            let secs = now.duration_since(first).as_secs_f64();
            if secs > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / secs;
            }
        }
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// Horloge de cadence : `wait` dort jusqu'à l'échéance de la frame suivante.
///
/// Sert à limiter l'affichage des images fixes, qui sinon seraient
/// reconverties aussi vite que possible.
pub struct FrameClock {
    period: Duration,
    last: Option<Instant>,
}

impl FrameClock {
    /// Clock ticking `fps` times per second (clamped to 1..=240).
    #[must_use]
    pub fn new(fps: f64) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / fps.clamp(1.0, 240.0)),
            last: None,
        }
    }

    /// Frame period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until one period has elapsed since the previous call.
    /// The first call returns immediately.
    pub fn wait(&mut self) {
        if let Some(last) = self.last
            && let Some(remaining) = self.period.checked_sub(last.elapsed())
        {
            std::thread::sleep(remaining);
        }
        self.last = Some(Instant::now());
    }
}
