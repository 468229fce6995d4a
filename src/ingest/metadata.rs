use std::io::Cursor;

/// Capture metadata read from an image's embedded EXIF block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMetadata {
    /// `DateTimeOriginal` verbatim, or empty.
    pub taken_at: String,
    /// `"Make, Model"`, a single value if only one is present, or empty.
    pub camera_model: String,
}

/// Extract capture timestamp and camera identification from the raw file
/// bytes. Infallible: a missing EXIF block, missing tags, or corrupt tag
/// data all degrade to empty strings.
pub fn extract_capture_metadata(bytes: &[u8]) -> CaptureMetadata {
    let mut reader = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(_) => return CaptureMetadata::default(),
    };

    let taken_at = field_string(&exif, exif::Tag::DateTimeOriginal);
    let make = field_string(&exif, exif::Tag::Make);
    let model = field_string(&exif, exif::Tag::Model);

    CaptureMetadata {
        taken_at,
        camera_model: join_camera(&make, &model),
    }
}

fn field_string(exif: &exif::Exif, tag: exif::Tag) -> String {
    exif.get_field(tag, exif::In::PRIMARY)
        .map(|field| field.display_value().to_string().trim_matches('"').to_string())
        .unwrap_or_default()
}

/// Concatenate make and model with `", "` when both are present, otherwise
/// use whichever single value exists.
fn join_camera(make: &str, model: &str) -> String {
    match (make.is_empty(), model.is_empty()) {
        (false, false) => format!("{make}, {model}"),
        (false, true) => make.to_string(),
        (true, false) => model.to_string(),
        (true, true) => String::new(),
    }
}
