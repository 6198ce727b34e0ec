//! Gallery coordinator.
//!
//! Keeps track of the thumbnails a gallery renders and opens the lightbox on
//! one of them. Activation is asynchronous: the thumbnail is measured first,
//! because the opening transition needs a valid starting rectangle.
//!
//! Concurrent activations are last-write-wins. Each call takes a generation
//! number; a call whose measurement completes after a newer call started is
//! rejected with [`GalleryError::Superseded`] and notifies nobody.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GalleryError, GalleryResult};
use crate::event::{normalize_dimensions, MeasuredRect, Measurements, Size};

/// An image shown in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Image URI.
    pub uri: String,
    /// Intrinsic width.
    pub width: f64,
    /// Intrinsic height.
    pub height: f64,
}

impl GalleryImage {
    /// Create an image entry.
    #[must_use]
    pub fn new(uri: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            uri: uri.into(),
            width,
            height,
        }
    }

    /// Intrinsic size.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Measurement service for one rendered thumbnail.
#[async_trait]
pub trait MeasureView: Send + Sync {
    /// Current on-screen rectangle, or `None` when the view is gone.
    async fn measure(&self) -> Option<MeasuredRect>;
}

/// A fixed rectangle measures as itself.
#[async_trait]
impl MeasureView for MeasuredRect {
    async fn measure(&self) -> Option<MeasuredRect> {
        Some(*self)
    }
}

/// A registered thumbnail as seen by listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    /// Position in the gallery.
    pub index: usize,
    /// The image.
    pub item: GalleryImage,
    /// Filled in by a successful activation.
    pub measurements: Option<Measurements>,
}

/// Handle returned by [`GalleryCoordinator::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

type Listener = Arc<dyn Fn(&GalleryEntry) + Send + Sync>;
type ShowHook = Arc<dyn Fn(Option<&GalleryCoordinator>) + Send + Sync>;

struct Registered {
    view: Arc<dyn MeasureView>,
    entry: GalleryEntry,
}

#[derive(Default)]
struct State {
    images: HashMap<usize, Registered>,
    current_index: Option<usize>,
    listeners: Vec<(ListenerId, Listener)>,
}

struct Inner {
    state: RwLock<State>,
    generation: AtomicU64,
    total_count: usize,
    window_width: f64,
    show: Option<ShowHook>,
}

/// Tracks gallery thumbnails and activates one of them for the lightbox.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct GalleryCoordinator {
    inner: Arc<Inner>,
}

impl fmt::Debug for GalleryCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("GalleryCoordinator")
            .field("total_count", &self.inner.total_count)
            .field("registered", &state.images.len())
            .field("current_index", &state.current_index)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl GalleryCoordinator {
    /// Create a coordinator for `total_count` items laid out against a
    /// window `window_width` wide.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::InvalidDimensions`] if the width is not
    /// positive.
    pub fn new(total_count: usize, window_width: f64) -> GalleryResult<Self> {
        Self::build(total_count, window_width, None)
    }

    /// Like [`new`](Self::new), with a hook the overlay uses to show
    /// (`Some`) or hide (`None`) the lightbox.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::InvalidDimensions`] if the width is not
    /// positive.
    pub fn with_show_hook(
        total_count: usize,
        window_width: f64,
        show: impl Fn(Option<&GalleryCoordinator>) + Send + Sync + 'static,
    ) -> GalleryResult<Self> {
        Self::build(total_count, window_width, Some(Arc::new(show)))
    }

    fn build(total_count: usize, window_width: f64, show: Option<ShowHook>) -> GalleryResult<Self> {
        GalleryError::check_dimensions("window", window_width, 1.0)?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: RwLock::new(State::default()),
                generation: AtomicU64::new(0),
                total_count,
                window_width,
                show,
            }),
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the thumbnail at `index`, replacing any previous one and
    /// clearing its measurements.
    pub fn add_image(&self, index: usize, item: GalleryImage, view: Arc<dyn MeasureView>) {
        tracing::debug!(index, uri = %item.uri, "gallery image registered");
        let entry = GalleryEntry {
            index,
            item,
            measurements: None,
        };
        self.write().images.insert(index, Registered { view, entry });
    }

    /// Activate `index`: measure the thumbnail, store its measurements, then
    /// notify listeners.
    ///
    /// # Errors
    ///
    /// - [`GalleryError::ItemNotRegistered`] for an unknown index.
    /// - [`GalleryError::MeasurementUnavailable`] when the view is gone.
    /// - [`GalleryError::DegenerateMeasurement`] when the view is not laid
    ///   out.
    /// - [`GalleryError::Superseded`] when a newer activation started while
    ///   this one was measuring.
    pub async fn set_active_index(&self, index: usize) -> GalleryResult<GalleryEntry> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (view, item) = {
            let mut state = self.write();
            state.current_index = Some(index);
            let registered = state
                .images
                .get(&index)
                .ok_or(GalleryError::ItemNotRegistered(index))?;
            (Arc::clone(&registered.view), registered.entry.item.clone())
        };

        let rect = view.measure().await.ok_or_else(|| {
            tracing::warn!(index, "gallery item could not be measured");
            GalleryError::MeasurementUnavailable {
                index,
                reason: "view is not mounted".into(),
            }
        })?;
        if rect.is_degenerate() {
            tracing::warn!(index, "gallery item measured as zero-sized");
            return Err(GalleryError::DegenerateMeasurement { index });
        }

        let target = normalize_dimensions(item.size(), self.inner.window_width)?;
        let measurements = Measurements {
            x: rect.page_x,
            y: rect.page_y,
            width: rect.width,
            height: rect.height,
            target_width: target.width,
            target_height: target.height,
        };

        let (entry, listeners) = {
            let mut state = self.write();
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                tracing::warn!(index, "gallery activation superseded");
                return Err(GalleryError::Superseded { index });
            }
            let registered = state
                .images
                .get_mut(&index)
                .ok_or(GalleryError::ItemNotRegistered(index))?;
            registered.entry.measurements = Some(measurements);
            let entry = registered.entry.clone();
            let listeners: Vec<Listener> = state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (entry, listeners)
        };

        tracing::info!(index, listeners = listeners.len(), "gallery item activated");
        for listener in &listeners {
            listener(&entry);
        }
        Ok(entry)
    }

    /// Activate `index` and ask the overlay to show the lightbox.
    ///
    /// # Errors
    ///
    /// Same as [`set_active_index`](Self::set_active_index); the overlay is
    /// not shown on failure.
    pub async fn on_show(&self, index: usize) -> GalleryResult<GalleryEntry> {
        let entry = self.set_active_index(index).await?;
        if let Some(show) = &self.inner.show {
            show(Some(self));
        }
        Ok(entry)
    }

    /// Hide the lightbox, drop every listener and clear the active index.
    ///
    /// Activations still measuring are superseded.
    pub fn on_close(&self) {
        if let Some(show) = &self.inner.show {
            show(None);
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.write();
        state.listeners.clear();
        state.current_index = None;
        tracing::info!("gallery closed");
    }

    /// Subscribe to activations.
    pub fn add_listener(&self, listener: impl Fn(&GalleryEntry) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId::new();
        self.write().listeners.push((id, Arc::new(listener)));
        id
    }

    /// Unsubscribe. Returns `false` if `id` was not subscribed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.write();
        let before = state.listeners.len();
        state.listeners.retain(|(l, _)| *l != id);
        state.listeners.len() != before
    }

    /// Forget every thumbnail, listener and the active index.
    pub fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        *self.write() = State::default();
    }

    /// Number of items the gallery shows.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.inner.total_count
    }

    /// Index of the active item.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.read().current_index
    }

    /// The active item, if one is active and registered.
    #[must_use]
    pub fn active_item(&self) -> Option<GalleryEntry> {
        let state = self.read();
        let index = state.current_index?;
        state.images.get(&index).map(|r| r.entry.clone())
    }

    /// Number of registered thumbnails.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.read().images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    fn rect(width: f64, height: f64) -> MeasuredRect {
        MeasuredRect {
            x: 0.0,
            y: 0.0,
            width,
            height,
            page_x: 16.0,
            page_y: 220.0,
        }
    }

    struct Slow {
        delay: Duration,
        rect: MeasuredRect,
    }

    #[async_trait]
    impl MeasureView for Slow {
        async fn measure(&self) -> Option<MeasuredRect> {
            tokio::time::sleep(self.delay).await;
            Some(self.rect)
        }
    }

    struct Unmounted;

    #[async_trait]
    impl MeasureView for Unmounted {
        async fn measure(&self) -> Option<MeasuredRect> {
            None
        }
    }

    fn gallery() -> GalleryCoordinator {
        let g = GalleryCoordinator::new(3, 375.0).unwrap();
        g.add_image(0, GalleryImage::new("a.jpg", 400.0, 300.0), Arc::new(rect(100.0, 75.0)));
        g.add_image(1, GalleryImage::new("b.jpg", 300.0, 600.0), Arc::new(rect(0.0, 0.0)));
        g
    }

    #[test]
    fn test_rejects_zero_window() {
        assert!(matches!(
            GalleryCoordinator::new(1, 0.0),
            Err(GalleryError::InvalidDimensions { .. })
        ));
    }

    #[tokio::test]
    async fn test_activation_measures_then_notifies() {
        let g = gallery();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        g.add_listener(move |e| sink.lock().unwrap().push(e.clone()));

        let entry = g.set_active_index(0).await.unwrap();
        let m = entry.measurements.unwrap();
        assert!((m.x - 16.0).abs() < f64::EPSILON);
        assert!((m.y - 220.0).abs() < f64::EPSILON);
        assert!((m.target_width - 375.0).abs() < f64::EPSILON);
        assert!((m.target_height - 281.25).abs() < 1e-9);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].index, 0);
        assert_eq!(g.active_item().unwrap().measurements, Some(m));
    }

    #[tokio::test]
    async fn test_degenerate_rect_rejected_without_notifying() {
        let g = gallery();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        g.add_listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let err = g.set_active_index(1).await.unwrap_err();
        assert!(matches!(err, GalleryError::DegenerateMeasurement { index: 1 }));
        assert!(err.is_recoverable());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(g.set_active_index(0).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_unmounted() {
        let g = gallery();
        assert!(matches!(
            g.set_active_index(7).await,
            Err(GalleryError::ItemNotRegistered(7))
        ));
        g.add_image(2, GalleryImage::new("c.jpg", 10.0, 10.0), Arc::new(Unmounted));
        assert!(matches!(
            g.set_active_index(2).await,
            Err(GalleryError::MeasurementUnavailable { index: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_latest_activation_wins() {
        let g = GalleryCoordinator::new(2, 375.0).unwrap();
        g.add_image(
            0,
            GalleryImage::new("slow.jpg", 400.0, 300.0),
            Arc::new(Slow {
                delay: Duration::from_millis(50),
                rect: rect(10.0, 10.0),
            }),
        );
        g.add_image(
            1,
            GalleryImage::new("fast.jpg", 400.0, 300.0),
            Arc::new(Slow {
                delay: Duration::from_millis(5),
                rect: rect(20.0, 20.0),
            }),
        );
        let notified = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notified);
        g.add_listener(move |e| sink.lock().unwrap().push(e.index));

        let (first, second) = tokio::join!(g.set_active_index(0), g.set_active_index(1));
        assert!(matches!(first, Err(GalleryError::Superseded { index: 0 })));
        assert_eq!(second.unwrap().index, 1);
        assert_eq!(*notified.lock().unwrap(), vec![1]);
        assert_eq!(g.current_index(), Some(1));
    }

    #[tokio::test]
    async fn test_show_and_close() {
        let shown = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&shown);
        let g = GalleryCoordinator::with_show_hook(1, 375.0, move |g| {
            sink.lock().unwrap().push(g.and_then(GalleryCoordinator::current_index));
        })
        .unwrap();
        g.add_image(0, GalleryImage::new("a.jpg", 400.0, 300.0), Arc::new(rect(50.0, 50.0)));
        let id = g.add_listener(|_| {});

        g.on_show(0).await.unwrap();
        g.on_close();
        assert_eq!(*shown.lock().unwrap(), vec![Some(0), None]);
        assert_eq!(g.current_index(), None);
        assert!(g.active_item().is_none());
        assert!(!g.remove_listener(id));
    }

    #[tokio::test]
    async fn test_remove_listener_and_reset() {
        let g = gallery();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let id = g.add_listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(g.remove_listener(id));
        g.set_active_index(0).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        g.reset();
        assert_eq!(g.registered(), 0);
        assert_eq!(g.total_count(), 3);
    }
}
