use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageStackError {
    #[error("Http error")]
    Http,
    #[error("No image buffers to composite")]
    NoImages,
    #[error("Decoding a fetched image failed")]
    Decode,
    #[error("Encoding the composited image failed")]
    Encode,
    #[error("Invalid URL")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ImageStackError {
    fn from(_value: reqwest::Error) -> Self {
        Self::Http
    }
}
