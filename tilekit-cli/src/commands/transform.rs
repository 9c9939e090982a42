//! `tilekit transform`: run a transformer chain over a local image.

use std::path::Path;

use tilekit::delegate::{DelegateContext, DelegateFactory, DelegateKit};
use tracing::info;

use crate::error::CliError;

pub fn run(input: &Path, output: &Path, definitions: &[String]) -> Result<(), CliError> {
    let kit = DelegateKit::from_definitions(
        definitions,
        &DelegateFactory::with_defaults(),
        &DelegateContext::default(),
    )?;

    let image = image::open(input)
        .map_err(|error| CliError::ImageRead {
            path: input.to_path_buf(),
            error,
        })?
        .to_rgba8();
    let (in_width, in_height) = image.dimensions();

    let result = kit.transform_image(image, None);
    info!(
        transformers = kit.transformer_count(),
        input = %input.display(),
        "Transform complete"
    );

    result.save(output).map_err(|error| CliError::ImageWrite {
        path: output.to_path_buf(),
        error,
    })?;

    println!(
        "{}x{} -> {}x{} through {} transformer(s)",
        in_width,
        in_height,
        result.width(),
        result.height(),
        kit.transformer_count()
    );
    println!("Saved: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_transform_resizes_and_clears_black() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]))
            .save(&input)
            .unwrap();

        let definitions = [
            "ResizeTransformer(32,32)".to_string(),
            "ColorToAlphaTransformer(0,0,0)".to_string(),
        ];
        run(&input, &output, &definitions).unwrap();

        let result = image::open(&output).unwrap().to_rgba8();
        assert_eq!(result.dimensions(), (32, 32));
        assert!(result.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_transform_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &dir.path().join("absent.png"),
            &dir.path().join("out.png"),
            &["ResizeTransformer(8,8)".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, CliError::ImageRead { .. }));
    }
}
