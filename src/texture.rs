//! Bevy integration: a component that owns a [`PlasmaEngine`] and repaints
//! its frame and palette images every `Update`.
//!
//! # Usage
//! ```rust,ignore
//! fn setup(mut commands: Commands, mut images: ResMut<Assets<Image>>) {
//!     let plasma = PlasmaTexture::new(PlasmaOptions::default(), 512, 512, &mut images)?;
//!     commands.spawn(Sprite::from_image(plasma.frame.clone()));
//!     commands.spawn(plasma);
//! }
//! ```

use bevy::{
    asset::{Assets, Handle},
    ecs::{
        component::Component,
        system::{Query, Res, ResMut},
    },
    image::Image,
    log::error,
    time::Time,
};

use crate::{
    engine::PlasmaEngine,
    generator::{PlasmaError, frame_image, palette_image, write_palette_image},
    options::PlasmaOptions,
};

/// An animated plasma rendered into two GPU images.
#[derive(Component)]
pub struct PlasmaTexture {
    pub engine: PlasmaEngine,
    /// `width × height` RGBA8 frame.
    pub frame: Handle<Image>,
    /// `N × 1` animated palette with its mip chain, for shader-side lookups.
    pub palette: Handle<Image>,
}

impl PlasmaTexture {
    /// Build the engine and allocate both images in `images`.
    pub fn new(
        options: PlasmaOptions,
        width: u32,
        height: u32,
        images: &mut Assets<Image>,
    ) -> Result<Self, PlasmaError> {
        let engine = PlasmaEngine::new(options, width, height)?;
        let palette = images.add(palette_image(engine.palette()));
        let frame = images.add(frame_image(width, height));
        Ok(Self {
            engine,
            frame,
            palette,
        })
    }

    /// Render the frame for `now` (seconds) into `image`, reallocating it
    /// first if the engine has been resized.
    pub fn paint_frame(&mut self, image: &mut Image, now: f64) -> Result<(), PlasmaError> {
        let (width, height) = (self.engine.width(), self.engine.height());
        if image.width() != width || image.height() != height {
            *image = frame_image(width, height);
        }
        let data = image
            .data
            .get_or_insert_with(|| vec![0; width as usize * height as usize * 4]);
        self.engine.render_frame_at(data, now)
    }

    /// Copy the palette shown by the last frame into `image`.
    pub fn paint_palette(&self, image: &mut Image) {
        write_palette_image(image, self.engine.palette());
    }
}

/// Bevy system: advance every [`PlasmaTexture`] to the current app time.
pub fn animate_plasma_textures(
    time: Res<Time>,
    mut plasmas: Query<&mut PlasmaTexture>,
    mut images: ResMut<Assets<Image>>,
) {
    let now = time.elapsed_secs_f64();
    for mut plasma in &mut plasmas {
        if let Some(mut image) = images.get_mut(&plasma.frame)
            && let Err(e) = plasma.paint_frame(&mut image, now)
        {
            error!("plasma frame skipped: {e}");
            continue;
        }
        if let Some(mut image) = images.get_mut(&plasma.palette) {
            plasma.paint_palette(&mut image);
        }
    }
}
