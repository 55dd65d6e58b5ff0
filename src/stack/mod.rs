pub use self::error::ImageStackError;
use crate::util::Util;
use futures::future;
use image::{imageops, ImageFormat, RgbaImage};
use reqwest::{Client, Url};
use std::io::Cursor;

mod error;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageStacker;

impl ImageStacker {
    pub fn new() -> Self {
        ImageStacker
    }

    /// Download every URL and fold the buffers into one PNG, first image at
    /// the bottom. Fails as a whole if any single download or decode fails.
    pub async fn stack(
        &self,
        urls: &[String],
        client: &Client,
    ) -> Result<Vec<u8>, ImageStackError> {
        let urls = urls
            .iter()
            .map(|url| Url::parse(url))
            .collect::<Result<Vec<_>, _>>()?;

        let buffers = Self::fetch_all(&urls, client).await?;
        Self::composite(&buffers)
    }

    async fn fetch_all(urls: &[Url], client: &Client) -> Result<Vec<Vec<u8>>, ImageStackError> {
        let mut downloads = Vec::new();

        for url in urls {
            downloads.push(Self::fetch_image(url, client));
        }

        // join_all yields results in input order, not completion order.
        future::join_all(downloads).await.into_iter().collect()
    }

    async fn fetch_image(url: &Url, client: &Client) -> Result<Vec<u8>, ImageStackError> {
        let response = client.get(url.clone()).send().await.map_err(|err| {
            log::error!("GET {} failed - {}", url.as_str(), err);
            ImageStackError::Http
        })?;

        Util::check_success(&response)?;

        if let Some(content_type) = Util::content_type(&response) {
            log::debug!("GET {} -> {content_type}", url.as_str());
        }

        Ok(response
            .bytes()
            .await
            .map_err(|_| ImageStackError::Http)?
            .as_ref()
            .to_vec())
    }

    fn composite(buffers: &[Vec<u8>]) -> Result<Vec<u8>, ImageStackError> {
        let (base, layers) = buffers.split_first().ok_or(ImageStackError::NoImages)?;

        // The first buffer is the canvas and decides the output dimensions.
        let mut canvas = Self::decode(base)?;

        for layer in layers {
            let layer = Self::decode(layer)?;
            imageops::overlay(&mut canvas, &layer, 0, 0);
        }

        let mut png = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| {
                log::error!("Failed to encode composited image: {}", err);
                ImageStackError::Encode
            })?;

        Ok(png)
    }

    fn decode(buffer: &[u8]) -> Result<RgbaImage, ImageStackError> {
        let image = image::load_from_memory(buffer).map_err(|err| {
            log::error!("Failed to decode image buffer: {}", err);
            ImageStackError::Decode
        })?;

        Ok(image.into_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(image: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn red_square(size: u32) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255]))
    }

    /// Opaque blue square covering the middle half, transparent elsewhere.
    fn blue_center(size: u32) -> RgbaImage {
        let lo = size / 4;
        let hi = size - size / 4;
        RgbaImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn composite_draws_layers_over_base() {
        let result =
            ImageStacker::composite(&[png(&red_square(100)), png(&blue_center(100))]).unwrap();
        let result = image::load_from_memory(&result).unwrap().into_rgba8();

        assert_eq!((100, 100), result.dimensions());
        assert_eq!(&Rgba([255, 0, 0, 255]), result.get_pixel(0, 0));
        assert_eq!(&Rgba([255, 0, 0, 255]), result.get_pixel(99, 99));
        assert_eq!(&Rgba([0, 0, 255, 255]), result.get_pixel(50, 50));
    }

    #[test]
    fn composite_is_order_sensitive() {
        let red = png(&red_square(100));
        let blue = png(&blue_center(100));

        let red_below = ImageStacker::composite(&[red.clone(), blue.clone()]).unwrap();
        let blue_below = ImageStacker::composite(&[blue, red]).unwrap();

        assert_ne!(red_below, blue_below);
    }

    #[test]
    fn single_image_is_reencoded_unchanged() {
        let source = red_square(64);

        let result = ImageStacker::composite(&[png(&source)]).unwrap();
        let decoded = image::load_from_memory(&result).unwrap().into_rgba8();

        assert_eq!(source.as_raw(), decoded.as_raw());
    }

    #[test]
    fn oversized_layer_is_clipped_to_canvas() {
        let result =
            ImageStacker::composite(&[png(&red_square(50)), png(&blue_center(100))]).unwrap();
        let result = image::load_from_memory(&result).unwrap().into_rgba8();

        assert_eq!((50, 50), result.dimensions());
        assert_eq!(&Rgba([255, 0, 0, 255]), result.get_pixel(10, 10));
        assert_eq!(&Rgba([0, 0, 255, 255]), result.get_pixel(40, 40));
    }

    #[test]
    fn transparent_layer_leaves_base_unchanged() {
        let clear = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 0]));

        let result = ImageStacker::composite(&[png(&red_square(32)), png(&clear)]).unwrap();
        let result = image::load_from_memory(&result).unwrap().into_rgba8();

        assert_eq!(red_square(32).as_raw(), result.as_raw());
    }

    #[test]
    fn composite_rejects_undecodable_buffer() {
        let result = ImageStacker::composite(&[b"not an image".to_vec()]);

        assert!(matches!(result, Err(ImageStackError::Decode)));
    }

    #[test]
    fn composite_without_buffers_fails() {
        assert!(matches!(
            ImageStacker::composite(&[]),
            Err(ImageStackError::NoImages)
        ));
    }

    #[tokio::test]
    async fn stack_rejects_invalid_url() {
        let result = ImageStacker::new()
            .stack(&["not a url".to_string()], &Client::new())
            .await;

        assert!(matches!(result, Err(ImageStackError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn stack_fails_on_unreachable_host() {
        // Bind to learn a free port, then drop the listener so the connection
        // is refused.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = ImageStacker::new()
            .stack(&[format!("http://{addr}/a.png")], &Client::new())
            .await;

        assert!(matches!(result, Err(ImageStackError::Http)));
    }
}
