use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;
use shared::{AnalysisMode, ModeParseError};

pub const FILE_FIELD: &str = "file";
pub const MODE_FIELD: &str = "mode";
pub const SELECTION_FIELD: &str = "selection";

const MAX_TEXT_FIELD: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No image file in upload")]
    MissingFile,
    #[error("Unsupported image type: {0} (expected jpg, jpeg or png)")]
    UnsupportedType(String),
    #[error("Image too large: {size} bytes exceeds limit of {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error(transparent)]
    InvalidMode(#[from] ModeParseError),
    #[error("Malformed multipart upload: {0}")]
    Multipart(String),
}

/// Image bytes with the filename and MIME type the browser sent.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl UploadedImage {
    pub fn new(
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let inferred = mime_for_extension(&extension)
            .ok_or_else(|| UploadError::UnsupportedType(file_name.clone()))?;

        let mime_type = match mime_type {
            Some(mime) if extension_for_mime(mime).is_some() => mime.to_string(),
            _ => inferred.to_string(),
        };

        Ok(Self {
            bytes,
            file_name,
            mime_type,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Reads the analysis form: one `file` part plus optional `mode` and `selection` text fields.
pub async fn read_analysis_form(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<(AnalysisMode, UploadedImage), UploadError> {
    let mut mode = None;
    let mut selection = None;
    let mut image = None;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or_default()
                    .to_string();
                let mime_type = field.content_type().map(|m| m.essence_str().to_string());
                let bytes = read_field(&mut field, max_bytes).await?;
                image = Some(UploadedImage::new(bytes, file_name, mime_type.as_deref())?);
            }
            MODE_FIELD => mode = Some(read_text(&mut field).await?),
            SELECTION_FIELD => selection = Some(read_text(&mut field).await?),
            other => {
                log::debug!("Ignoring unexpected form field: {}", other);
                while field.try_next().await.map_err(multipart_error)?.is_some() {}
            }
        }
    }

    let image = image.ok_or(UploadError::MissingFile)?;
    let mode = AnalysisMode::from_form(mode.as_deref(), selection.as_deref())?;
    Ok((mode, image))
}

async fn read_field(field: &mut Field, max_bytes: usize) -> Result<Vec<u8>, UploadError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > max_bytes {
            return Err(UploadError::TooLarge {
                size: data.len() + chunk.len(),
                max: max_bytes,
            });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_text(field: &mut Field) -> Result<String, UploadError> {
    let bytes = read_field(field, MAX_TEXT_FIELD).await.map_err(|e| match e {
        UploadError::TooLarge { .. } => UploadError::Multipart("form field too long".into()),
        other => other,
    })?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

fn multipart_error(e: actix_multipart::MultipartError) -> UploadError {
    UploadError::Multipart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_jpeg_and_png() {
        let image = UploadedImage::new(vec![1, 2, 3], "photo.JPG", Some("image/jpeg")).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.size(), 3);

        let image = UploadedImage::new(vec![1], "scan.png", None).unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn falls_back_to_extension_mime() {
        let image =
            UploadedImage::new(vec![1], "photo.jpeg", Some("application/octet-stream")).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn supported_mime_without_extension_is_rejected() {
        for mime in ["image/jpeg", "image/png"] {
            assert!(matches!(
                UploadedImage::new(vec![1], "blob", Some(mime)),
                Err(UploadError::UnsupportedType(_))
            ));
        }
    }

    #[test]
    fn rejects_other_types_and_empty_files() {
        assert!(matches!(
            UploadedImage::new(vec![1], "anim.gif", Some("image/gif")),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            UploadedImage::new(vec![1], "noextension", Some("image/png")),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            UploadedImage::new(Vec::new(), "photo.png", None),
            Err(UploadError::MissingFile)
        ));
    }
}
