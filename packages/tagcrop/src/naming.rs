use std::path::Path;

/// Name of the `index`-th crop of `blob_name`: `_crop_<index>` goes before the extension of
/// the blob's base name, so `raw-images/photo.jpg` becomes `photo_crop_1.jpg`.
pub fn crop_name(blob_name: &str, index: usize) -> String {
    let path = Path::new(blob_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| blob_name.into());

    match path.extension() {
        Some(ext) => format!("{}_crop_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_crop_{}", stem, index),
    }
}
