use reqwest::header::CONTENT_TYPE;
use reqwest::Response;

use crate::stack::ImageStackError;

pub struct Util;

impl Util {
    pub fn check_success(response: &Response) -> Result<(), ImageStackError> {
        let status_code = response.status();

        if !status_code.is_success() {
            log::warn!("GET {} response: {status_code}", response.url());
            return Err(ImageStackError::Http);
        }

        Ok(())
    }

    pub fn content_type(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|content_type| content_type.to_str().ok())
    }
}
