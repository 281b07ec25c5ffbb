use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread,
};

use glam::{Vec2, Vec4};

use crate::Result;

/// Handle to a texture registered with an [`AssetStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(usize);

impl TextureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Decoded RGBA8 image.
#[derive(Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Texture {
    /// Builds a texture from tightly packed RGBA rows. Returns `None` when the
    /// buffer does not match the dimensions.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if len == 0 || bytes.len() != len {
            return None;
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour texture, handy as a stand-in for tests and previews.
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        let pixels = image.pixels().map(|px| px.0).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest-neighbour lookup with repeat wrapping. `v = 0` is the bottom row.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let u = uv.x.rem_euclid(1.0);
        let v = 1.0 - uv.y.rem_euclid(1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        let [r, g, b, a] = self.pixels[(y * self.width + x) as usize];
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// What a shading stage sees for its texture slot.
#[derive(Debug, Clone, Copy)]
pub enum TextureBinding<'a> {
    /// The material does not use a texture.
    Unbound,
    /// The texture is still loading or failed to load.
    Unavailable,
    Ready(&'a Texture),
}

#[derive(Debug, Clone)]
enum TextureState {
    Pending,
    Ready(Arc<Texture>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureStatus {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug)]
struct TextureEntry {
    path: PathBuf,
    state: TextureState,
}

type LoadResult = (TextureId, std::result::Result<Texture, String>);

/// Registry for textures referenced by materials.
///
/// Requests decode on a background thread; [`AssetStore::poll`] collects the
/// results without blocking, so the frame loop never waits on disk.
#[derive(Debug)]
pub struct AssetStore {
    entries: Vec<TextureEntry>,
    by_path: HashMap<PathBuf, TextureId>,
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetStore {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            entries: Vec::new(),
            by_path: HashMap::new(),
            sender,
            receiver,
        }
    }

    /// Starts loading `path` unless it is already known, and returns its handle
    /// immediately.
    pub fn request_texture(&mut self, path: impl Into<PathBuf>) -> TextureId {
        let path = path.into();
        if let Some(id) = self.by_path.get(&path) {
            return *id;
        }

        let id = self.push_entry(path.clone(), TextureState::Pending);
        let sender = self.sender.clone();
        tracing::debug!(?path, "loading texture");
        thread::spawn(move || {
            let result = Texture::load(&path).map_err(|err| err.to_string());
            // the store may be gone by the time decoding finishes
            let _ = sender.send((id, result));
        });
        id
    }

    /// Registers an already decoded texture under `path`.
    pub fn register_texture(&mut self, path: impl Into<PathBuf>, texture: Texture) -> TextureId {
        let path = path.into();
        let state = TextureState::Ready(Arc::new(texture));
        match self.by_path.get(&path) {
            Some(id) => {
                self.entries[id.0].state = state;
                *id
            }
            None => self.push_entry(path, state),
        }
    }

    /// Applies finished loads. Returns how many textures changed state.
    pub fn poll(&mut self) -> usize {
        let mut resolved = 0;
        while let Ok((id, result)) = self.receiver.try_recv() {
            let Some(entry) = self.entries.get_mut(id.0) else {
                continue;
            };
            entry.state = match result {
                Ok(texture) => {
                    tracing::info!(path = ?entry.path, width = texture.width(), height = texture.height(), "texture ready");
                    TextureState::Ready(Arc::new(texture))
                }
                Err(reason) => {
                    tracing::warn!(path = ?entry.path, %reason, "texture failed to load, using fallback colour");
                    TextureState::Failed(reason)
                }
            };
            resolved += 1;
        }
        resolved
    }

    pub fn status(&self, id: TextureId) -> Option<TextureStatus> {
        self.entries.get(id.0).map(|entry| match &entry.state {
            TextureState::Pending => TextureStatus::Pending,
            TextureState::Ready(_) => TextureStatus::Ready,
            TextureState::Failed(reason) => TextureStatus::Failed(reason.clone()),
        })
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        match &self.entries.get(id.0)?.state {
            TextureState::Ready(texture) => Some(texture.as_ref()),
            _ => None,
        }
    }

    /// Resolves an optional material texture into the binding a shading stage
    /// consumes.
    pub fn binding(&self, id: Option<TextureId>) -> TextureBinding<'_> {
        match id {
            None => TextureBinding::Unbound,
            Some(id) => match self.texture(id) {
                Some(texture) => TextureBinding::Ready(texture),
                None => TextureBinding::Unavailable,
            },
        }
    }

    pub fn path(&self, id: TextureId) -> Option<&Path> {
        self.entries.get(id.0).map(|entry| entry.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every decoded texture. Handles stay valid and report `Pending`.
    pub fn release_all(&mut self) {
        for entry in &mut self.entries {
            entry.state = TextureState::Pending;
        }
    }

    fn push_entry(&mut self, path: PathBuf, state: TextureState) -> TextureId {
        let id = TextureId(self.entries.len());
        self.entries.push(TextureEntry {
            path: path.clone(),
            state,
        });
        self.by_path.insert(path, id);
        id
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use tempfile::tempdir;

    use super::*;

    fn wait_for(store: &mut AssetStore, id: TextureId) -> TextureStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            store.poll();
            let status = store.status(id).unwrap();
            if status != TextureStatus::Pending || Instant::now() > deadline {
                return status;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_files_fail_without_blocking() {
        let mut store = AssetStore::new();
        let id = store.request_texture("definitely/not/here.png");
        assert!(matches!(store.binding(Some(id)), TextureBinding::Unavailable));

        let status = wait_for(&mut store, id);
        assert!(matches!(status, TextureStatus::Failed(_)));
        assert!(matches!(store.binding(Some(id)), TextureBinding::Unavailable));
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("texture.png");
        let mut pixels = image::RgbaImage::new(2, 2);
        pixels.put_pixel(0, 1, image::Rgba([255, 0, 0, 255]));
        pixels.save(&path).unwrap();

        let mut store = AssetStore::new();
        let id = store.request_texture(&path);
        assert_eq!(wait_for(&mut store, id), TextureStatus::Ready);

        let texture = store.texture(id).unwrap();
        assert_eq!((texture.width(), texture.height()), (2, 2));
        // bottom-left texel
        assert_eq!(texture.sample(Vec2::new(0.1, 0.1)), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn repeated_requests_share_a_handle() {
        let mut store = AssetStore::new();
        let a = store.request_texture("same.png");
        let b = store.request_texture("same.png");
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn registered_textures_are_ready_immediately() {
        let mut store = AssetStore::new();
        let id = store.register_texture("mem", Texture::solid([0, 255, 0, 255]));
        match store.binding(Some(id)) {
            TextureBinding::Ready(texture) => {
                assert_eq!(texture.sample(Vec2::new(3.7, -0.2)), Vec4::new(0.0, 1.0, 0.0, 1.0));
            }
            other => panic!("unexpected binding {other:?}"),
        }
        assert!(matches!(store.binding(None), TextureBinding::Unbound));

        store.release_all();
        assert_eq!(store.status(id), Some(TextureStatus::Pending));
    }

    #[test]
    fn rejects_mismatched_buffers() {
        assert!(Texture::from_rgba8(2, 2, &[0; 15]).is_none());
        assert!(Texture::from_rgba8(0, 2, &[]).is_none());
        assert!(Texture::from_rgba8(1, 1, &[1, 2, 3, 4]).is_some());
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        assert!(Texture::from_rgba8(70_000, 70_000, &[]).is_none());
        assert!(Texture::from_rgba8(u32::MAX, u32::MAX, &[0; 16]).is_none());
    }
}
