//! Floor-plan image loading.
//!
//! Loading is a single future, [`load_image`], that resolves to decoded RGBA pixels or a
//! [`FloorplanError`]. The view layer spawns it (tokio natively, `spawn_local` on the
//! web) and observes its progress as an [`ImageLoad`].

use crate::error::FloorplanError;
use eframe::egui;

/// File extensions accepted for floor-plan images.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Environment variable overriding where seeded plan images are read from.
pub const ASSETS_DIR_ENV: &str = "FLOORPLAN_ASSETS_DIR";

const DEFAULT_ASSETS_DIR: &str = "assets";

/// Where an image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Bytes already in memory (dropped onto the window or read in the browser)
    Bytes {
        /// File name, used for format checks and display
        name: String,
        /// Raw file contents
        bytes: Vec<u8>,
    },
    /// A file on disk
    #[cfg(not(target_arch = "wasm32"))]
    Path(std::path::PathBuf),
    /// An image bundled with a seeded plan, relative to the assets directory
    Asset(String),
}

impl ImageSource {
    /// Display name of the image.
    pub fn name(&self) -> String {
        match self {
            ImageSource::Bytes { name, .. } => name.clone(),
            #[cfg(not(target_arch = "wasm32"))]
            ImageSource::Path(path) => file_name(path),
            ImageSource::Asset(path) => path.clone(),
        }
    }
}

/// Why an image is being loaded, which decides how the state takes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// A new upload: resets the transform and starts calibration
    Upload,
    /// The image of an opened plan: keeps the plan's calibration
    Seed,
}

/// Progress of the current image load, as shown by the view.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageLoad {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Decoding in progress
    Loading {
        /// Name of the image being loaded
        name: String,
    },
    /// The image is decoded and uploaded as a texture
    Loaded {
        /// Name of the loaded image
        name: String,
    },
    /// Loading failed; the user can pick another file
    Failed(String),
}

impl ImageLoad {
    /// Returns true while a load is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, ImageLoad::Loading { .. })
    }
}

/// A decoded floor-plan image.
#[derive(Clone)]
pub struct DecodedImage {
    /// File name or asset path
    pub name: String,
    /// RGBA pixels ready to upload as a texture
    pub pixels: egui::ColorImage,
}

impl DecodedImage {
    /// Width and height in pixels.
    pub fn size(&self) -> [usize; 2] {
        self.pixels.size
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("name", &self.name)
            .field("size", &self.pixels.size)
            .finish()
    }
}

/// Checks that a file name has a supported image extension.
pub fn check_extension(name: &str) -> Result<(), FloorplanError> {
    let extension = std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(FloorplanError::UnsupportedFormat(name.to_string())),
    }
}

/// Decodes PNG or JPEG bytes into RGBA pixels.
pub fn decode_image(name: &str, bytes: &[u8]) -> Result<DecodedImage, FloorplanError> {
    check_extension(name)?;
    if bytes.is_empty() {
        return Err(FloorplanError::EmptyImage(name.to_string()));
    }
    let img = image::load_from_memory(bytes).map_err(|source| FloorplanError::Decode {
        name: name.to_string(),
        source,
    })?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    log::debug!("decoded {name}: {}x{}", size[0], size[1]);
    Ok(DecodedImage {
        name: name.to_string(),
        pixels: egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()),
    })
}

/// Directory seeded plan images are read from.
pub fn assets_dir() -> String {
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::env::var(ASSETS_DIR_ENV).unwrap_or_else(|_| DEFAULT_ASSETS_DIR.to_string())
    }

    #[cfg(target_arch = "wasm32")]
    {
        DEFAULT_ASSETS_DIR.to_string()
    }
}

/// Reads and decodes an image.
pub async fn load_image(source: ImageSource) -> Result<DecodedImage, FloorplanError> {
    let name = source.name();
    check_extension(&name)?;
    let bytes = match source {
        ImageSource::Bytes { bytes, .. } => bytes,
        #[cfg(not(target_arch = "wasm32"))]
        ImageSource::Path(path) => std::fs::read(&path).map_err(|e| FloorplanError::Read {
            name: name.clone(),
            reason: e.to_string(),
        })?,
        ImageSource::Asset(asset) => read_asset(&asset).await.map_err(|reason| {
            FloorplanError::Read {
                name: name.clone(),
                reason,
            }
        })?,
    };
    decode_image(&name, &bytes)
}

#[cfg(not(target_arch = "wasm32"))]
async fn read_asset(asset: &str) -> Result<Vec<u8>, String> {
    let path = std::path::Path::new(&assets_dir()).join(asset);
    std::fs::read(&path).map_err(|e| format!("{}: {e}", path.display()))
}

/// Fetches a bundled asset relative to the page (WASM only).
#[cfg(target_arch = "wasm32")]
async fn read_asset(asset: &str) -> Result<Vec<u8>, String> {
    use wasm_bindgen::JsCast;

    let url = format!("{}/{}", assets_dir(), asset);
    let window = web_sys::window().ok_or("No window found")?;
    let response = wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(|e| format!("Failed to fetch {url}: {e:?}"))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| "Fetch did not return a response".to_string())?;
    if !response.ok() {
        return Err(format!("Failed to fetch {url}: HTTP {}", response.status()));
    }
    let buffer = response
        .array_buffer()
        .map_err(|_| "Failed to read response body".to_string())?;
    let buffer = wasm_bindgen_futures::JsFuture::from(buffer)
        .await
        .map_err(|e| format!("Failed to read response body: {e:?}"))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(not(target_arch = "wasm32"))]
fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        assert!(check_extension("plan.PNG").is_ok());
        assert!(check_extension("plan.jpeg").is_ok());
        assert!(check_extension("dir/plan.Jpg").is_ok());
        assert!(matches!(
            check_extension("plan.gif"),
            Err(FloorplanError::UnsupportedFormat(_))
        ));
        assert!(check_extension("plan").is_err());
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode_image("plan.png", &png_bytes(4, 3)).unwrap();
        assert_eq!(decoded.size(), [4, 3]);
        assert_eq!(decoded.pixels.pixels[0], egui::Color32::from_rgb(200, 10, 10));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            decode_image("plan.png", &[]),
            Err(FloorplanError::EmptyImage(_))
        ));
        assert!(matches!(
            decode_image("plan.png", b"not an image"),
            Err(FloorplanError::Decode { .. })
        ));
    }

    #[test]
    fn test_load_image_from_bytes() {
        let source = ImageSource::Bytes {
            name: "dropped.png".into(),
            bytes: png_bytes(2, 2),
        };
        let decoded = futures::executor::block_on(load_image(source)).unwrap();
        assert_eq!(decoded.name, "dropped.png");
    }

    #[test]
    fn test_load_missing_file_reports_read_error() {
        let source = ImageSource::Path("/definitely/not/here.png".into());
        let result = futures::executor::block_on(load_image(source));
        assert!(matches!(result, Err(FloorplanError::Read { .. })));
    }

    #[test]
    fn test_image_load_state() {
        assert!(!ImageLoad::default().is_loading());
        assert!(ImageLoad::Loading { name: "a.png".into() }.is_loading());
    }
}
