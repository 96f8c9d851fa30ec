use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use std::io::Read;
use std::process::Child;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use ca_core::frame::FrameBuffer;
use ca_core::resize::fit_width;
use ca_core::traits::{Source, SourceKind};

use crate::ffmpeg::{self, FfmpegInput};

/// Capacité du canal frames (thread ffmpeg → boucle de conversion).
const CHANNEL_CAPACITY: usize = 3;

/// Taille du pool de frames pré-allouées.
/// Doit être > capacité du canal + 1 (frame en cours de conversion) pour
/// garantir un slot libre sans allocation.
const POOL_SIZE: usize = 6;

/// Délai max d'un envoi avant de revérifier le drapeau d'arrêt.
const SEND_POLL: Duration = Duration::from_millis(100);

/// Source vidéo ou caméra décodée par un thread ffmpeg dédié.
///
/// `next_frame` bloque jusqu'à la frame suivante ; `None` quand ffmpeg
/// atteint la fin du flux ou que sa lecture échoue.
///
/// # Example
/// ```no_run
/// use ca_source::ffmpeg::FfmpegInput;
/// use ca_source::video::VideoSource;
/// use std::path::PathBuf;
/// let source = VideoSource::open(FfmpegInput::File(PathBuf::from("clip.mp4")), Some(640), true).unwrap();
/// ```
pub struct VideoSource {
    frames: Receiver<Arc<FrameBuffer>>,
    stop: Arc<AtomicBool>,
    // Possédé ici pour que le drop puisse tuer ffmpeg avant le join
    child: Option<Child>,
    handle: Option<thread::JoinHandle<()>>,
    size: (u32, u32),
    fps: Option<f64>,
}

impl VideoSource {
    /// Probe `input`, then start decoding on a background thread.
    ///
    /// `max_width` downscales wide streams inside ffmpeg. `paced` sleeps
    /// between frames to follow the file's native rate (interactive
    /// playback); cameras are always paced by the device.
    ///
    /// # Errors
    /// Returns an error if ffprobe/ffmpeg cannot be started or the input
    /// has no video stream.
    pub fn open(input: FfmpegInput, max_width: Option<u32>, paced: bool) -> Result<Self> {
        let info = ffmpeg::probe(&input)?;
        let (width, height) = fit_width(info.width, info.height, max_width);
        let mut child = ffmpeg::spawn_rgba_pipe(&input, width, height)?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("stdout ffmpeg indisponible");
        };

        let period = (paced && !input.is_live())
            .then_some(info.fps)
            .flatten()
            .map(|fps| Duration::from_secs_f64(1.0 / fps.clamp(1.0, 240.0)));

        let source = Self::start(Some(child), stdout, (width, height), period, info.fps)?;
        log::info!(
            "VideoSource: {} → {width}x{height}",
            input.describe()
        );
        Ok(source)
    }

    /// Start the decode thread on `reader`, a raw RGBA stream of `size`.
    ///
    /// `child`, when given, is the process feeding `reader`; it is killed
    /// and reaped on drop.
    fn start<R>(
        mut child: Option<Child>,
        reader: R,
        size: (u32, u32),
        period: Option<Duration>,
        fps: Option<f64>,
    ) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = flume::bounded(CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let worker = DecodeWorker {
            reader,
            width: size.0,
            height: size.1,
            period,
            stop: Arc::clone(&stop),
        };
        let spawned = thread::Builder::new()
            .name("ca-video".to_string())
            .spawn(move || worker.run(&tx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                if let Some(child) = child.as_mut() {
                    let _ = child.kill();
                    let _ = child.wait();
                }
                return Err(e).context("Impossible de spawner le thread vidéo");
            }
        };
        Ok(Self {
            frames: rx,
            stop,
            child,
            handle: Some(handle),
            size,
            fps,
        })
    }
}

impl Source for VideoSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        self.frames.recv().ok()
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Stream
    }

    fn frame_rate(&self) -> Option<f64> {
        self.fps
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // Tuer ffmpeg ferme le pipe : une lecture bloquée rend EOF
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
        }
        // Vider le canal débloque un envoi en attente
        while self.frames.try_recv().is_ok() {}
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("Thread vidéo: panique à l'arrêt");
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

/// État possédé par le thread de décodage.
struct DecodeWorker<R> {
    reader: R,
    width: u32,
    height: u32,
    period: Option<Duration>,
    stop: Arc<AtomicBool>,
}

impl<R: Read> DecodeWorker<R> {
    fn run(mut self, tx: &Sender<Arc<FrameBuffer>>) {
        let mut pool: Vec<Arc<FrameBuffer>> = (0..POOL_SIZE)
            .map(|_| Arc::new(FrameBuffer::new(self.width, self.height)))
            .collect();
        let mut last_frame = Instant::now();
        let mut count: u64 = 0;

        while !self.stop.load(Ordering::Relaxed) {
            if let Some(period) = self.period {
                if let Some(remaining) = period.checked_sub(last_frame.elapsed()) {
                    thread::sleep(remaining);
                }
                last_frame = Instant::now();
            }

            let idx = find_or_create_slot(&mut pool, self.width, self.height);
            // Arc::get_mut réussit ssi strong_count == 1 (garanti par find_or_create_slot)
            let Some(fb) = Arc::get_mut(&mut pool[idx]) else {
                break;
            };
            match read_exact_or_eof(&mut self.reader, &mut fb.data) {
                Ok(true) => {}
                Ok(false) => {
                    log::info!("Thread vidéo: fin du flux après {count} frames");
                    break;
                }
                Err(e) => {
                    log::warn!("Thread vidéo: erreur lecture pipe: {e}");
                    break;
                }
            }

            if !self.send(tx, Arc::clone(&pool[idx])) {
                break;
            }
            count += 1;
        }

        log::debug!("Thread vidéo terminé proprement.");
    }

    /// Envoi bloquant, interruptible par le drapeau d'arrêt.
    /// Retourne false si la boucle doit s'arrêter.
    fn send(&self, tx: &Sender<Arc<FrameBuffer>>, mut frame: Arc<FrameBuffer>) -> bool {
        loop {
            match tx.send_timeout(frame, SEND_POLL) {
                Ok(()) => return true,
                Err(flume::SendTimeoutError::Disconnected(_)) => return false,
                Err(flume::SendTimeoutError::Timeout(f)) => {
                    if self.stop.load(Ordering::Relaxed) {
                        return false;
                    }
                    frame = f;
                }
            }
        }
    }
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false), // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Trouve ou crée un slot libre dans le pool.
///
/// Invariant : retourne un index `i` tel que `Arc::strong_count(&pool[i]) == 1`.
/// Si tous les slots sont pris, alloue un nouveau slot (cas exceptionnel).
fn find_or_create_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        i
    } else {
        pool.push(Arc::new(FrameBuffer::new(w, h)));
        pool.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_exact_reports_eof_on_partial_frame() {
        let mut reader = Cursor::new(vec![1u8; 10]);
        let mut buf = [0u8; 8];
        assert!(read_exact_or_eof(&mut reader, &mut buf).unwrap());
        assert!(!read_exact_or_eof(&mut reader, &mut buf).unwrap());
    }

    #[test]
    fn decodes_whole_frames_until_eof() {
        // deux frames 2x1 RGBA puis une frame tronquée
        let mut bytes = vec![10u8; 8];
        bytes.extend_from_slice(&[20; 8]);
        bytes.extend_from_slice(&[30; 3]);
        let mut source = VideoSource::start(None, Cursor::new(bytes), (2, 1), None, Some(25.0)).unwrap();
        assert_eq!(source.native_size(), (2, 1));
        assert_eq!(source.frame_rate(), Some(25.0));
        let first = source.next_frame().unwrap();
        assert_eq!(first.rgb(1, 0), [10, 10, 10]);
        drop(first);
        assert_eq!(source.next_frame().unwrap().rgb(0, 0), [20, 20, 20]);
        assert!(source.next_frame().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn drop_kills_a_silent_producer() {
        use std::process::{Command, Stdio};

        let Ok(mut child) = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::piped())
            .spawn()
        else {
            return;
        };
        let stdout = child.stdout.take().unwrap();
        let source = VideoSource::start(Some(child), stdout, (4, 4), None, None).unwrap();
        let started = Instant::now();
        drop(source);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn pool_reuses_released_slots() {
        let mut pool: Vec<Arc<FrameBuffer>> =
            (0..2).map(|_| Arc::new(FrameBuffer::new(1, 1))).collect();
        let held = Arc::clone(&pool[0]);
        assert_eq!(find_or_create_slot(&mut pool, 1, 1), 1);
        let held_too = Arc::clone(&pool[1]);
        assert_eq!(find_or_create_slot(&mut pool, 1, 1), 2);
        drop(held);
        drop(held_too);
        assert_eq!(find_or_create_slot(&mut pool, 1, 1), 0);
    }
}
