// src/client/form.rs

//! Create/edit listing form state.
//!
//! The form runs the same `ListingInput` rules as the server before it
//! submits anything.

use tokio::sync::mpsc;
use validator::Validate;

use super::{
    ApiClient, ClientError,
    upload::{ImageFile, MAX_IMAGE_BYTES, UploadProgress, Uploader},
};
use crate::models::listing::{Listing, ListingInput, MAX_IMAGES};

pub const UPLOAD_FAILED: &str = "Image upload failed (2MB max per image)";

#[derive(Debug, Clone, Default)]
pub struct ListingForm {
    pub input: ListingInput,
    pub uploading: bool,
    pub image_error: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
}

impl ListingForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the form for editing an existing listing.
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            input: listing.to_input(),
            ..Self::default()
        }
    }

    /// Checks that `count` new files fit next to the images already attached.
    pub fn check_image_selection(&self, count: usize) -> Result<(), String> {
        if count == 0 {
            return Err("Please select at least one image".to_string());
        }
        if count + self.input.image_urls.len() > MAX_IMAGES {
            return Err(format!("Max {MAX_IMAGES} images allowed"));
        }
        Ok(())
    }

    /// Uploads `files` concurrently and appends the resulting URLs.
    ///
    /// URLs are merged only if every upload succeeds. On failure the images
    /// already attached are left as they were.
    pub async fn upload_images(
        &mut self,
        uploader: &Uploader,
        files: Vec<ImageFile>,
        progress: Option<mpsc::UnboundedSender<UploadProgress>>,
    ) -> Result<(), ClientError> {
        if let Err(message) = self.check_image_selection(files.len()) {
            self.image_error = Some(message.clone());
            return Err(ClientError::Validation(message));
        }
        if files.iter().any(|f| f.bytes.len() > MAX_IMAGE_BYTES) {
            self.image_error = Some(UPLOAD_FAILED.to_string());
            return Err(ClientError::Upload(UPLOAD_FAILED.to_string()));
        }

        self.uploading = true;
        self.image_error = None;
        let result = uploader.upload_all(files, progress).await;
        self.uploading = false;

        match result {
            Ok(urls) => {
                self.input.image_urls.extend(urls);
                Ok(())
            }
            Err(e) => {
                self.image_error = Some(UPLOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    pub fn remove_image(&mut self, index: usize) {
        if index < self.input.image_urls.len() {
            self.input.image_urls.remove(index);
        }
    }

    /// Client-side check before submitting, with the server's `ListingInput`
    /// rules. Sets `error` on failure.
    pub fn validate(&mut self) -> Result<(), ClientError> {
        if self.input.image_urls.is_empty() {
            return self.fail(ClientError::Validation(
                "You must upload at least one image".to_string(),
            ));
        }
        if let Err(e) = self.input.validate() {
            return self.fail(e.into());
        }
        Ok(())
    }

    pub async fn submit_create(&mut self, api: &ApiClient) -> Result<Listing, ClientError> {
        self.validate()?;
        self.loading = true;
        let result = api.create_listing(&self.input).await;
        self.finish(result)
    }

    pub async fn submit_update(&mut self, api: &ApiClient, id: i64) -> Result<Listing, ClientError> {
        self.validate()?;
        self.loading = true;
        let result = api.update_listing(id, &self.input).await;
        self.finish(result)
    }

    fn finish(&mut self, result: Result<Listing, ClientError>) -> Result<Listing, ClientError> {
        self.loading = false;
        match result {
            Ok(listing) => {
                self.error = None;
                Ok(listing)
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail<T>(&mut self, err: ClientError) -> Result<T, ClientError> {
        self.error = Some(err.message());
        Err(err)
    }
}
