use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Camera,
    Album,
}

/// What we ask the platform picker for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickRequest {
    pub source: ImageSource,
    pub count: usize,
    pub compressed: bool,
}

/// A transient local file handed back by the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub path: PathBuf,
    pub content_type: String,
}

impl ImageFile {
    /// Content type is inferred from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content_type = content_type_for(&path).to_string();
        Self { path, content_type }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".into())
    }
}

pub fn content_type_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Failure reported by the platform picker, carrying its raw message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PickerFailure {
    pub message: String,
}

impl PickerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The platform signals a dismissed picker only through its message.
    pub fn is_cancellation(&self) -> bool {
        self.message.to_ascii_lowercase().contains("cancel")
    }
}

#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn pick(&self, request: PickRequest) -> Result<Vec<ImageFile>, PickerFailure>;
}

#[derive(Clone)]
pub struct ImageAcquisition {
    picker: Arc<dyn ImagePicker>,
}

impl ImageAcquisition {
    pub fn new(picker: Arc<dyn ImagePicker>) -> Self {
        Self { picker }
    }

    /// Exactly one image per call. Cancellation comes back as
    /// [`ClientError::UserCancelled`], which callers must keep silent.
    pub async fn acquire(&self, source: ImageSource) -> Result<ImageFile, ClientError> {
        let request = PickRequest {
            source,
            count: 1,
            compressed: true,
        };
        match self.picker.pick(request).await {
            Ok(files) => {
                let Some(file) = files.into_iter().next() else {
                    warn!(?source, "picker returned no files");
                    return Err(ClientError::AcquisitionFailed("no image selected".into()));
                };
                debug!(?source, path = %file.path.display(), "image acquired");
                Ok(file)
            }
            Err(e) if e.is_cancellation() => {
                debug!(?source, "image selection cancelled");
                Err(ClientError::UserCancelled)
            }
            Err(e) => {
                warn!(?source, error = %e, "image selection failed");
                Err(ClientError::AcquisitionFailed(e.message))
            }
        }
    }
}


#[cfg(test)]
mod image_tests {
    use super::fake::FakePicker;
    use super::*;

    #[test]
    fn test_content_type_for() {
        use std::path::Path;
        assert_eq!(content_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("a.heic")), "image/heic");
        assert_eq!(content_type_for(Path::new("a.gif")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn picker_failure_cancellation_detection() {
        assert!(PickerFailure::new("chooseMedia:fail cancel").is_cancellation());
        assert!(PickerFailure::new("User Cancelled").is_cancellation());
        assert!(!PickerFailure::new("chooseMedia:fail no permission").is_cancellation());
    }

    #[tokio::test]
    async fn acquire_asks_for_one_compressed_image() {
        let picker = Arc::new(FakePicker::one("/tmp/food.jpg"));
        let acq = ImageAcquisition::new(picker.clone());

        let file = acq.acquire(ImageSource::Camera).await.unwrap();
        assert_eq!(file.path, PathBuf::from("/tmp/food.jpg"));
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.file_name(), "food.jpg");

        let requests = picker.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![PickRequest {
                source: ImageSource::Camera,
                count: 1,
                compressed: true
            }]
        );
    }

    #[tokio::test]
    async fn acquire_takes_first_of_many() {
        let picker = Arc::new(FakePicker::returning(Ok(vec![
            ImageFile::from_path("/tmp/1.png"),
            ImageFile::from_path("/tmp/2.png"),
        ])));
        let file = ImageAcquisition::new(picker).acquire(ImageSource::Album).await.unwrap();
        assert_eq!(file.path, PathBuf::from("/tmp/1.png"));
    }

    #[tokio::test]
    async fn acquire_maps_cancellation_and_failure() {
        let cancelled = FakePicker::returning(Err(PickerFailure::new("chooseMedia:fail cancel")));
        let err = ImageAcquisition::new(Arc::new(cancelled))
            .acquire(ImageSource::Album)
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::UserCancelled);

        let denied = FakePicker::returning(Err(PickerFailure::new("auth deny")));
        let err = ImageAcquisition::new(Arc::new(denied))
            .acquire(ImageSource::Camera)
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::AcquisitionFailed("auth deny".into()));

        let empty = FakePicker::returning(Ok(Vec::new()));
        let err = ImageAcquisition::new(Arc::new(empty))
            .acquire(ImageSource::Camera)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AcquisitionFailed(_)));
    }
}
