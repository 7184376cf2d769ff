use crate::error::AssetError;
use crate::gpu::device::{SharedDevice, TextureId, try_borrow_device};
use crate::gpu::resource::GpuResource;
use crate::gpu::texture::{TextureDescriptor, TextureFormat, WrapMode};
use image::RgbaImage;
use log::info;
use std::path::Path;

/// Decodes an image file and uploads it as an RGBA texture with repeat wrapping.
pub fn load_texture(
    device: &SharedDevice,
    path: &Path,
) -> Result<GpuResource<TextureId>, AssetError> {
    let image = image::open(path)
        .map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    info!(
        "loaded texture {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    upload_rgba(device, &image)
}

pub fn upload_rgba(
    device: &SharedDevice,
    image: &RgbaImage,
) -> Result<GpuResource<TextureId>, AssetError> {
    let descriptor = TextureDescriptor {
        width: image.width(),
        height: image.height(),
        format: TextureFormat::Rgba8,
        wrap: WrapMode::Repeat,
    };
    let id = try_borrow_device(device)?.create_texture(&descriptor, image.as_raw())?;
    Ok(GpuResource::new(device, id))
}

/// Two-color checkerboard used when a texture file is not configured or fails to load.
pub fn checkerboard(
    device: &SharedDevice,
    size: u32,
    cells: u32,
    a: [u8; 3],
    b: [u8; 3],
) -> Result<GpuResource<TextureId>, AssetError> {
    let cell = (size / cells.max(1)).max(1);
    let image = RgbaImage::from_fn(size, size, |x, y| {
        let [r, g, bl] = if (x / cell + y / cell) % 2 == 0 { a } else { b };
        image::Rgba([r, g, bl, 255])
    });
    upload_rgba(device, &image)
}
