//! Scalar field × palette → RGBA8 pixels.

use rayon::prelude::*;

use crate::{color::Rgba8, generator::PlasmaError};

/// Colour for field values that fall outside the palette.
const OUT_OF_RANGE: Rgba8 = [0, 0, 0, 0];

fn check_target(target: &[u8], field: &[u16]) -> Result<(), PlasmaError> {
    let expected = field.len() * 4;
    if target.len() != expected {
        return Err(PlasmaError::BufferSizeMismatch {
            expected,
            actual: target.len(),
        });
    }
    Ok(())
}

/// Write `palette[field[i]]` into pixel `i` of `target` (RGBA8, row-major).
///
/// A plain lookup with no interpolation: the field must already hold valid
/// palette indices.  Any index past the end of the palette is written as
/// transparent black.
pub fn draw(target: &mut [u8], field: &[u16], palette: &[Rgba8]) -> Result<(), PlasmaError> {
    check_target(target, field)?;
    if palette.is_empty() {
        return Err(PlasmaError::EmptyPalette);
    }
    target
        .par_chunks_exact_mut(4)
        .zip(field.par_iter())
        .for_each(|(px, &index)| {
            px.copy_from_slice(palette.get(index as usize).unwrap_or(&OUT_OF_RANGE));
        });
    Ok(())
}

/// Debug view: map `field` straight onto a black → white ramp spanning
/// `[0, range)`, bypassing the palette.
pub fn draw_grayscale(target: &mut [u8], field: &[u16], range: usize) -> Result<(), PlasmaError> {
    check_target(target, field)?;
    let span = range.saturating_sub(1).max(1) as f64;
    target
        .par_chunks_exact_mut(4)
        .zip(field.par_iter())
        .for_each(|(px, &index)| {
            let v = ((index as f64 / span).clamp(0.0, 1.0) * 255.0).round() as u8;
            px.copy_from_slice(&[v, v, v, 255]);
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_each_pixel() {
        let palette = [[1, 2, 3, 255], [10, 20, 30, 255], [100, 0, 0, 128]];
        let field = [2u16, 0, 1, 2];
        let mut target = vec![0u8; 16];
        draw(&mut target, &field, &palette).unwrap();
        assert_eq!(
            target,
            [100, 0, 0, 128, 1, 2, 3, 255, 10, 20, 30, 255, 100, 0, 0, 128]
        );
    }

    #[test]
    fn out_of_range_index_is_transparent() {
        let mut target = vec![9u8; 4];
        draw(&mut target, &[5], &[[1, 1, 1, 1]]).unwrap();
        assert_eq!(target, [0, 0, 0, 0]);
    }

    #[test]
    fn grayscale_spans_black_to_white() {
        let mut target = vec![0u8; 12];
        draw_grayscale(&mut target, &[0, 2, 4], 5).unwrap();
        assert_eq!(target, [0, 0, 0, 255, 128, 128, 128, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let mut target = vec![0u8; 7];
        assert_eq!(
            draw(&mut target, &[0, 0], &[[0; 4]]),
            Err(PlasmaError::BufferSizeMismatch {
                expected: 8,
                actual: 7
            })
        );
        let mut target = vec![0u8; 8];
        assert_eq!(draw(&mut target, &[0, 0], &[]), Err(PlasmaError::EmptyPalette));
    }
}
