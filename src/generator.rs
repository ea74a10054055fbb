//! Error type, size validation and Bevy [`Image`] construction shared by the
//! plasma pipeline.

use bevy::{
    asset::RenderAssetUsages,
    image::{Image, ImageAddressMode, ImageFilterMode, ImageSampler, ImageSamplerDescriptor},
    render::render_resource::{Extent3d, TextureDimension, TextureFormat},
};

use crate::{color::Rgba8, palette::mip_chain};

/// Error returned by fallible pipeline operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlasmaError {
    /// Either `width` or `height` was zero.
    ZeroDimension { width: u32, height: u32 },
    /// One or both dimensions exceeded [`MAX_DIMENSION`].
    DimensionTooLarge { width: u32, height: u32, max: u32 },
    /// A palette size of zero, or one too large for a `u16` scalar field.
    InvalidPaletteSize { size: usize, max: usize },
    /// A palette was rendered from an empty stop list.
    EmptyPalette,
    /// Two palettes (or stop lists) of different lengths were blended.
    PaletteLengthMismatch { left: usize, right: usize },
    /// A caller-supplied buffer has the wrong number of elements.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// An option path did not name any known option.
    UnknownOption(String),
}

impl std::fmt::Display for PlasmaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlasmaError::ZeroDimension { width, height } => write!(
                f,
                "plasma dimensions must be non-zero (got {width}×{height})"
            ),
            PlasmaError::DimensionTooLarge { width, height, max } => write!(
                f,
                "plasma dimensions {width}×{height} exceed MAX_DIMENSION={max}"
            ),
            PlasmaError::InvalidPaletteSize { size, max } => {
                write!(f, "palette size {size} is outside 1..={max}")
            }
            PlasmaError::EmptyPalette => write!(f, "palette needs at least one stop"),
            PlasmaError::PaletteLengthMismatch { left, right } => write!(
                f,
                "cannot blend palettes of different lengths ({left} vs {right})"
            ),
            PlasmaError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "buffer holds {actual} elements, expected {expected}"
            ),
            PlasmaError::UnknownOption(path) => write!(f, "unknown option \"{path}\""),
        }
    }
}

impl std::error::Error for PlasmaError {}

/// Maximum allowed plasma dimension (per side).
///
/// The scalar field is regenerated synchronously inside one frame, so the
/// cap keeps a full regeneration within a few frames' budget.
pub const MAX_DIMENSION: u32 = 4096;

/// Dimension guard for the scalar field and frame buffers.
#[inline]
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), PlasmaError> {
    if width == 0 || height == 0 {
        return Err(PlasmaError::ZeroDimension { width, height });
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(PlasmaError::DimensionTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

/// Build the RGBA8 sRGB image the animated plasma is written into.
///
/// No mip chain: the frame is rewritten every tick and shown at native size.
pub fn frame_image(width: u32, height: u32) -> Image {
    let mut image = Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        vec![0; width as usize * height as usize * 4],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::ClampToEdge,
        address_mode_v: ImageAddressMode::ClampToEdge,
        mag_filter: ImageFilterMode::Linear,
        min_filter: ImageFilterMode::Linear,
        ..Default::default()
    });
    image
}

/// Build an `N × 1` lookup-table image from a palette, with a full 1-D mip
/// chain, for renderers that colourise the scalar field on the GPU.
///
/// The U axis repeats because palettes are cyclic.
pub fn palette_image(palette: &[Rgba8]) -> Image {
    let width = palette.len().max(1) as u32;
    let mut image = Image::new(
        Extent3d {
            width,
            height: 1,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        vec![0; width as usize * 4],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    write_palette_image(&mut image, palette);
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::ClampToEdge,
        mag_filter: ImageFilterMode::Nearest,
        min_filter: ImageFilterMode::Linear,
        mipmap_filter: ImageFilterMode::Linear,
        ..Default::default()
    });
    image
}

/// Replace the contents (and mip chain) of a palette image created by
/// [`palette_image`], widening or narrowing it to the palette length.
pub fn write_palette_image(image: &mut Image, palette: &[Rgba8]) {
    if palette.is_empty() {
        image.texture_descriptor.size.width = 1;
        image.texture_descriptor.mip_level_count = 1;
        image.data = Some(vec![0; 4]);
        return;
    }
    image.texture_descriptor.size.width = palette.len() as u32;
    let levels = mip_chain(palette);
    image.texture_descriptor.mip_level_count = levels.len() as u32;
    image.data = Some(levels.into_iter().flatten().flatten().collect());
}
