use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::{Array, Ix4};

/// Resizes a frame of any dimensions to `input_size`² and lays it out as a
/// planar NCHW float tensor, channels R,G,B each normalized to `[0, 1]`.
///
/// Returns the source dimensions alongside the tensor so callers can keep
/// them on the result even when detection later fails.
pub(crate) fn process_image(
    image: &DynamicImage,
    input_size: u32,
) -> (u32, u32, Array<f32, Ix4>) {
    let (img_width, img_height) = image.dimensions();

    let mut resizer = fast_image_resize::Resizer::new();
    let options = fast_image_resize::ResizeOptions {
        algorithm: fast_image_resize::ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ),
        ..Default::default()
    };

    let mut resized = DynamicImage::new(input_size, input_size, image.color());
    if let Err(err) = resizer.resize(image, &mut resized, &options) {
        log::warn!("fast_image_resize failed ({err}), falling back to imageops");
        resized = image::imageops::resize(image, input_size, input_size, FilterType::Triangle).into();
    }

    let size = input_size as usize;
    let mut input: Array<f32, Ix4> = Array::zeros((1, 3, size, size));
    for pixel in resized.pixels() {
        let x = pixel.0 as usize;
        let y = pixel.1 as usize;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, 0, y, x]] = r as f32 / 255.0;
        input[[0, 1, y, x]] = g as f32 / 255.0;
        input[[0, 2, y, x]] = b as f32 / 255.0;
    }

    (img_width, img_height, input)
}
