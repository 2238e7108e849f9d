//! Asset loading. Natively assets are read from `./assets` (falling back to the
//! copy the build script places next to the build output); in the browser they
//! are fetched from `<origin>/assets`.

use std::collections::HashMap;

use anyhow::Context as _;

use crate::data_structures::texture::Texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

#[cfg(not(target_arch = "wasm32"))]
fn asset_path(file_name: &str) -> std::path::PathBuf {
    let local = std::path::Path::new("./").join("assets").join(file_name);
    if local.exists() {
        return local;
    }
    std::path::Path::new(env!("OUT_DIR"))
        .join("assets")
        .join(file_name)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = asset_path(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// Decodes a normal map fetched with [`load_binary`].
pub fn decode_normal_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    bytes: &[u8],
    file_name: &str,
) -> anyhow::Result<Texture> {
    Texture::from_bytes(device, queue, bytes, file_name)
}

#[derive(Debug)]
enum TextureSlot<T> {
    Pending,
    Ready(T),
    Failed,
}

/// Load state of the textures scenes ask for, by asset path.
///
/// A path is requested once. Its load either delivers a texture or fails;
/// failed paths are remembered and never requested again.
#[derive(Debug)]
pub struct TextureCache<T> {
    slots: HashMap<String, TextureSlot<T>>,
    requests: Vec<String>,
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

impl<T> TextureCache<T> {
    /// Queues `path` for loading unless it was seen before. Returns whether it was queued.
    pub fn request(&mut self, path: &str) -> bool {
        if self.slots.contains_key(path) {
            return false;
        }
        log::info!("requesting texture {}", path);
        self.slots.insert(path.to_string(), TextureSlot::Pending);
        self.requests.push(path.to_string());
        true
    }

    /// Paths queued since the last call.
    pub fn take_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.requests)
    }

    /// Records the outcome of a load. Returns whether a texture is now available.
    pub fn complete(&mut self, path: &str, result: anyhow::Result<T>) -> bool {
        let slot = match result {
            Ok(texture) => {
                log::info!("loaded texture {}", path);
                TextureSlot::Ready(texture)
            }
            Err(e) => {
                log::warn!("texture {} unavailable, keeping the default: {:#}", path, e);
                TextureSlot::Failed
            }
        };
        let ready = matches!(slot, TextureSlot::Ready(_));
        self.slots.insert(path.to_string(), slot);
        ready
    }

    pub fn get(&self, path: &str) -> Option<&T> {
        match self.slots.get(path)? {
            TextureSlot::Ready(texture) => Some(texture),
            TextureSlot::Pending | TextureSlot::Failed => None,
        }
    }

    /// Whether a binding made without the texture at `path` has to be rebuilt.
    pub fn needs_rebind(&self, path: Option<&str>, bound: bool) -> bool {
        !bound && path.and_then(|p| self.get(p)).is_some()
    }
}

#[cfg(test)]
mod cache_tests {
    use super::*;

    #[test]
    fn a_path_is_requested_once() {
        let mut cache = TextureCache::<u32>::default();
        assert!(cache.request("images/waterbump.png"));
        assert!(!cache.request("images/waterbump.png"));
        assert_eq!(cache.take_requests(), vec!["images/waterbump.png".to_string()]);
        assert!(cache.take_requests().is_empty());
        assert!(!cache.request("images/waterbump.png"));
        assert!(cache.take_requests().is_empty());
    }

    #[test]
    fn failed_load_is_not_retried() {
        let mut cache = TextureCache::<u32>::default();
        cache.request("missing.png");
        cache.take_requests();
        assert!(!cache.complete("missing.png", Err(anyhow::anyhow!("not found"))));
        assert_eq!(cache.get("missing.png"), None);
        assert!(!cache.request("missing.png"));
        assert!(cache.take_requests().is_empty());
        assert!(!cache.needs_rebind(Some("missing.png"), false));
    }

    #[test]
    fn ready_load_triggers_one_rebind() {
        let mut cache = TextureCache::<u32>::default();
        let path = Some("bump.png");
        cache.request("bump.png");
        assert_eq!(cache.get("bump.png"), None);
        assert!(!cache.needs_rebind(path, false));

        assert!(cache.complete("bump.png", Ok(7)));
        assert_eq!(cache.get("bump.png"), Some(&7));
        let mut bound = false;
        let mut rebinds = 0;
        for _ in 0..3 {
            if cache.needs_rebind(path, bound) {
                rebinds += 1;
                bound = cache.get("bump.png").is_some();
            }
        }
        assert_eq!(rebinds, 1);
    }

    #[test]
    fn materials_without_texture_never_rebind() {
        let cache = TextureCache::<u32>::default();
        assert!(!cache.needs_rebind(None, false));
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bundled_bump_map_loads() {
        let bytes = load_binary("images/waterbump.png").await.unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert!(img.width() > 0 && img.height() > 0);
    }

    #[tokio::test]
    async fn missing_asset_is_an_error() {
        assert!(load_binary("images/does-not-exist.png").await.is_err());
    }
}
