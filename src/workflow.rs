// Upload workflow: fetch a cat picture, make sure the destination folder
// exists, upload the picture, then upload a JSON file describing it.
//
// Steps run strictly one after the other. The first three are fatal on
// failure; the metadata upload is not, it only changes the report.

use std::fmt;
use tracing::{error, info, warn};

use crate::api::{AuthToken, CloudStorage, ImageSource};
use crate::error::UploadError;
use crate::metadata::UploadMetadata;
use crate::sanitize::sanitize_filename;

pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";
pub const METADATA_CONTENT_TYPE: &str = "application/json";

/// Trim `value` and reject it if nothing is left.
pub fn required(field: &'static str, value: &str) -> Result<String, UploadError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UploadError::EmptyInput { field });
    }
    Ok(value.to_string())
}

/// Everything a single run needs, validated once up front.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    caption: String,
    folder: String,
    token: AuthToken,
}

impl UploadRequest {
    pub fn new(caption: &str, folder: &str, token: &str) -> Result<Self, UploadError> {
        Ok(UploadRequest {
            caption: required("Caption", caption)?,
            folder: required("Folder name", folder)?,
            token: AuthToken::new(required("Token", token)?),
        })
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}

/// Emitted after each completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    ImageFetched { size_bytes: usize },
    FolderReady { folder: String },
    ImageUploaded { path: String },
    MetadataBuilt { size_bytes: usize },
    MetadataUploaded { path: String },
    /// The metadata upload failed; the image is still in place.
    MetadataSkipped { path: String, reason: String },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::ImageFetched { size_bytes } => write!(f, "Image fetched ({size_bytes} bytes)"),
            Progress::FolderReady { folder } => write!(f, "Folder '{folder}' is ready"),
            Progress::ImageUploaded { path } => write!(f, "File uploaded: {path}"),
            Progress::MetadataBuilt { size_bytes } => {
                write!(f, "Metadata prepared ({size_bytes} bytes)")
            }
            Progress::MetadataUploaded { path } => write!(f, "File uploaded: {path}"),
            Progress::MetadataSkipped { path, reason } => write!(
                f,
                "Info file {path} was not uploaded ({reason}), but the image is saved"
            ),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub folder: String,
    pub image_path: String,
    pub metadata_path: String,
    pub size_bytes: usize,
    pub metadata_uploaded: bool,
}

type ProgressFn = Box<dyn Fn(&Progress)>;

pub struct UploadWorkflow<I, S> {
    images: I,
    storage: S,
    on_progress: Option<ProgressFn>,
}

impl<I: ImageSource, S: CloudStorage> UploadWorkflow<I, S> {
    pub fn new(images: I, storage: S) -> Self {
        UploadWorkflow {
            images,
            storage,
            on_progress: None,
        }
    }

    /// Register a callback that receives every [`Progress`] event.
    pub fn on_progress(mut self, f: impl Fn(&Progress) + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    fn emit(&self, event: Progress) {
        info!("{event}");
        if let Some(f) = &self.on_progress {
            f(&event);
        }
    }

    /// Run every step for `request`. Any error returned happened before or
    /// during the image upload; a failed metadata upload is only reflected
    /// in [`UploadReport::metadata_uploaded`].
    pub fn run(&self, request: &UploadRequest) -> Result<UploadReport, UploadError> {
        let caption = request.caption();
        let folder = request.folder();
        let token = request.token();
        info!(caption, folder, "Processing caption");

        let image = self.images.fetch(caption)?;
        self.emit(Progress::ImageFetched {
            size_bytes: image.size_bytes(),
        });

        self.storage.ensure_folder(token, folder)?;
        self.emit(Progress::FolderReady {
            folder: folder.to_string(),
        });

        let name = sanitize_filename(caption);
        let image_filename = format!("{name}.jpg");
        let image_path = format!("{folder}/{image_filename}");
        let metadata_path = format!("{folder}/{name}_info.json");

        self.storage
            .upload_file(token, &image.bytes, &image_path, IMAGE_CONTENT_TYPE)?;
        self.emit(Progress::ImageUploaded {
            path: image_path.clone(),
        });

        let document = UploadMetadata::new(caption, &image_filename, image.size_bytes())
            .to_json_bytes()?;
        self.emit(Progress::MetadataBuilt {
            size_bytes: document.len(),
        });

        let metadata_uploaded = match self.storage.upload_file(
            token,
            &document,
            &metadata_path,
            METADATA_CONTENT_TYPE,
        ) {
            Ok(()) => {
                self.emit(Progress::MetadataUploaded {
                    path: metadata_path.clone(),
                });
                true
            }
            Err(err) => {
                warn!(error = %err, path = %metadata_path, "Metadata upload failed");
                self.emit(Progress::MetadataSkipped {
                    path: metadata_path.clone(),
                    reason: err.to_string(),
                });
                false
            }
        };

        Ok(UploadReport {
            folder: folder.to_string(),
            image_path,
            metadata_path,
            size_bytes: image.size_bytes(),
            metadata_uploaded,
        })
    }

    /// Boolean verdict of [`run`](Self::run); the error, if any, is logged.
    pub fn process(&self, request: &UploadRequest) -> bool {
        match self.run(request) {
            Ok(_) => true,
            Err(err) => {
                error!(error = %err, "Upload failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchedImage;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn status_error(action: &'static str, code: u16) -> UploadError {
        UploadError::Status {
            action,
            status: StatusCode::from_u16(code).unwrap(),
        }
    }

    struct FakeImages {
        status: u16,
        bytes: Vec<u8>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeImages {
        fn ok(len: usize) -> Self {
            FakeImages {
                status: 200,
                bytes: vec![0xFF; len],
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            FakeImages {
                status,
                bytes: Vec::new(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageSource for FakeImages {
        fn fetch(&self, caption: &str) -> Result<FetchedImage, UploadError> {
            self.calls.borrow_mut().push(caption.to_string());
            if self.status != 200 {
                return Err(status_error("fetch image", self.status));
            }
            Ok(FetchedImage {
                bytes: self.bytes.clone(),
            })
        }
    }

    /// Records every call; statuses decide what each operation answers.
    struct FakeStorage {
        folder_status: u16,
        image_status: u16,
        metadata_status: u16,
        calls: RefCell<Vec<String>>,
        uploads: RefCell<Vec<(String, String, Vec<u8>)>>,
    }

    impl FakeStorage {
        fn new(folder_status: u16, image_status: u16, metadata_status: u16) -> Self {
            FakeStorage {
                folder_status,
                image_status,
                metadata_status,
                calls: RefCell::new(Vec::new()),
                uploads: RefCell::new(Vec::new()),
            }
        }
    }

    impl CloudStorage for FakeStorage {
        fn ensure_folder(&self, token: &AuthToken, path: &str) -> Result<(), UploadError> {
            assert_eq!(token.expose(), "tok");
            self.calls.borrow_mut().push(format!("folder {path}"));
            match self.folder_status {
                201 | 409 => Ok(()),
                code => Err(status_error("create folder", code)),
            }
        }

        fn upload_file(
            &self,
            token: &AuthToken,
            bytes: &[u8],
            remote_path: &str,
            content_type: &str,
        ) -> Result<(), UploadError> {
            assert_eq!(token.expose(), "tok");
            self.calls.borrow_mut().push(format!("upload {remote_path}"));
            self.uploads.borrow_mut().push((
                remote_path.to_string(),
                content_type.to_string(),
                bytes.to_vec(),
            ));
            let code = if content_type == IMAGE_CONTENT_TYPE {
                self.image_status
            } else {
                self.metadata_status
            };
            if code == 201 {
                Ok(())
            } else {
                Err(status_error("upload file", code))
            }
        }
    }

    fn request(caption: &str) -> UploadRequest {
        UploadRequest::new(caption, "cats", "tok").unwrap()
    }

    #[test]
    fn request_trims_and_rejects_blank_fields() {
        let req = UploadRequest::new("  hi  ", " cats ", " tok ").unwrap();
        assert_eq!(req.caption(), "hi");
        assert_eq!(req.folder(), "cats");
        assert_eq!(req.token().expose(), "tok");

        let cases = [
            ("", "cats", "tok", "Caption"),
            ("hi", "   ", "tok", "Folder name"),
            ("hi", "cats", "\t", "Token"),
        ];
        for (caption, folder, token, expected) in cases {
            match UploadRequest::new(caption, folder, token) {
                Err(UploadError::EmptyInput { field }) => assert_eq!(field, expected),
                other => panic!("expected EmptyInput, got {other:?}"),
            }
        }
    }

    #[test]
    fn request_debug_hides_token() {
        let rendered = format!("{:?}", UploadRequest::new("hi", "cats", "hunter2").unwrap());
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn uploads_image_and_metadata() {
        let images = FakeImages::ok(42);
        let storage = FakeStorage::new(201, 201, 201);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let workflow = UploadWorkflow::new(&images, &storage)
            .on_progress(move |p| sink.borrow_mut().push(p.clone()));

        let report = workflow.run(&request("hello world")).unwrap();

        assert_eq!(
            report,
            UploadReport {
                folder: "cats".into(),
                image_path: "cats/hello_world.jpg".into(),
                metadata_path: "cats/hello_world_info.json".into(),
                size_bytes: 42,
                metadata_uploaded: true,
            }
        );
        assert_eq!(
            *storage.calls.borrow(),
            vec![
                "folder cats",
                "upload cats/hello_world.jpg",
                "upload cats/hello_world_info.json"
            ]
        );

        let uploads = storage.uploads.borrow();
        assert_eq!(uploads[0].1, "image/jpeg");
        assert_eq!(uploads[0].2.len(), 42);
        assert_eq!(uploads[1].1, "application/json");
        let meta: UploadMetadata = serde_json::from_slice(&uploads[1].2).unwrap();
        assert_eq!(meta, UploadMetadata::new("hello world", "hello_world.jpg", 42));

        let events = events.borrow();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], Progress::ImageFetched { size_bytes: 42 });
        assert!(matches!(events[4], Progress::MetadataUploaded { .. }));
    }

    #[test]
    fn existing_folder_is_fine() {
        let images = FakeImages::ok(1);
        let storage = FakeStorage::new(409, 201, 201);
        assert!(UploadWorkflow::new(&images, &storage).process(&request("hi")));
    }

    #[test]
    fn metadata_failure_is_not_fatal() {
        let images = FakeImages::ok(10);
        let storage = FakeStorage::new(201, 201, 500);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let workflow = UploadWorkflow::new(&images, &storage)
            .on_progress(move |p| sink.borrow_mut().push(p.clone()));

        let report = workflow.run(&request("a/b")).unwrap();

        assert!(!report.metadata_uploaded);
        assert_eq!(report.image_path, "cats/a_b.jpg");
        assert_eq!(report.metadata_path, "cats/a_b_info.json");
        let last = events.borrow().last().cloned().unwrap();
        assert!(matches!(last, Progress::MetadataSkipped { ref path, .. } if path == "cats/a_b_info.json"));
        assert!(last.to_string().contains("the image is saved"));
    }

    #[test]
    fn fetch_failure_touches_no_storage() {
        let images = FakeImages::failing(404);
        let storage = FakeStorage::new(201, 201, 201);
        let workflow = UploadWorkflow::new(&images, &storage);

        let err = workflow.run(&request("hi")).unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(images.calls.borrow().len(), 1);
        assert!(storage.calls.borrow().is_empty());
        assert!(!workflow.process(&request("hi")));
    }

    #[test]
    fn folder_failure_stops_before_upload() {
        let images = FakeImages::ok(3);
        let storage = FakeStorage::new(401, 201, 201);

        let err = UploadWorkflow::new(&images, &storage)
            .run(&request("hi"))
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(*storage.calls.borrow(), vec!["folder cats"]);
    }

    #[test]
    fn image_upload_failure_skips_metadata() {
        let images = FakeImages::ok(3);
        let storage = FakeStorage::new(201, 507, 201);

        let ok = UploadWorkflow::new(&images, &storage).process(&request("hi"));

        assert!(!ok);
        assert_eq!(*storage.calls.borrow(), vec!["folder cats", "upload cats/hi.jpg"]);
    }
}
