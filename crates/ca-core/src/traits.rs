use std::path::PathBuf;
use std::sync::Arc;

use crate::error::CoreError;
use crate::frame::FrameBuffer;

/// Nature d'une source : image fixe ou flux.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Une seule image, renvoyée à chaque appel.
    Still,
    /// Vidéo ou caméra : une nouvelle frame par appel, jusqu'à épuisement.
    Stream,
}

/// Fournit des frames visuelles au pipeline.
///
/// Implémenté par : `ImageSource`, `VideoSource` (fichier ou caméra).
///
/// # Example
/// ```
/// use ca_core::traits::{Source, SourceKind};
/// use ca_core::frame::FrameBuffer;
/// use std::sync::Arc;
///
/// struct DummySource;
/// impl Source for DummySource {
///     fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn kind(&self) -> SourceKind { SourceKind::Stream }
/// }
/// ```
pub trait Source {
    /// Retourne la prochaine frame.
    ///
    /// `None` = fin de flux. Une erreur de lecture est signalée de la même
    /// façon : le pipeline ne fait pas la différence et ne réessaie pas.
    /// L'appelant ne doit pas conserver la frame au-delà d'une passe.
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>>;

    /// Dimensions des frames produites.
    fn native_size(&self) -> (u32, u32);

    /// Image fixe ou flux.
    fn kind(&self) -> SourceKind;

    /// Cadence native, si connue.
    fn frame_rate(&self) -> Option<f64> {
        None
    }
}

/// État transmis à l'affichage avec chaque frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentInfo {
    /// Numéro de la frame (0 = première).
    pub frame_index: u64,
    /// Un enregistrement vidéo est en cours.
    pub recording: bool,
}

/// Affiche les frames converties.
pub trait Display {
    /// Présente le canvas converti et la prévisualisation de la source.
    ///
    /// Fire-and-forget : les erreurs d'affichage sont journalisées par
    /// l'implémentation, jamais remontées.
    fn present(&mut self, canvas: &FrameBuffer, preview: &FrameBuffer, info: PresentInfo);
}

/// Commandes interactives de l'utilisateur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    /// Quitter la session.
    Quit,
    /// Écrire le canvas courant en image.
    Snapshot,
    /// Démarrer/arrêter l'enregistrement vidéo.
    ToggleRecording,
}

/// Surface de contrôle (clavier, signal…), interrogée une fois par itération.
pub trait Controls {
    /// Retourne le prochain évènement en attente, sans bloquer.
    fn poll(&mut self) -> Option<ControlEvent>;
}

/// Écrit les frames finies sur disque.
pub trait Exporter {
    /// Ajoute le canvas au flux vidéo d'enregistrement.
    ///
    /// # Errors
    /// Returns an error if the encoder cannot be started or written to.
    fn write_frame(&mut self, canvas: &FrameBuffer) -> anyhow::Result<()>;

    /// Écrit le canvas comme image fixe et retourne son chemin.
    ///
    /// # Errors
    /// Returns an error if the image cannot be encoded or written.
    fn write_image(&mut self, canvas: &FrameBuffer) -> anyhow::Result<PathBuf>;

    /// Finalise les flux ouverts.
    ///
    /// # Errors
    /// Returns an error if the encoder reports a failure on close.
    fn finish(&mut self) -> anyhow::Result<()>;
}

/// Rend un glyphe en image (stamp), appelé uniquement à la construction
/// du cache de stamps.
///
/// `Sync` : le cache est construit en parallèle.
pub trait GlyphRenderer: Sync {
    /// Dimensions (largeur, hauteur) de tous les stamps produits.
    fn glyph_size(&self) -> (u32, u32);

    /// Rend `ch` dans la couleur `rgb`. Pixels hors glyphe : alpha = 0.
    ///
    /// # Errors
    /// Returns [`CoreError::ResourceUnavailable`] if the glyph cannot be
    /// rendered.
    fn render_glyph(&self, ch: char, rgb: [u8; 3]) -> Result<FrameBuffer, CoreError>;
}
