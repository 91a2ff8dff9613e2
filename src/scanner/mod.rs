use crate::error::{PhotoScopeError, Result};
use photo_scope_common::FileHandle;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}

/// フォルダ直下の写真を列挙
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(PhotoScopeError::FileNotFound(folder.display().to_string()));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(images)
}

/// 引数のパスを写真ファイル一覧に展開
///
/// - ファイル: そのまま（形式の検証はバックエンドに任せる）
/// - フォルダ: 直下の jpg/jpeg/png
///
/// 引数の順序を保つ。
pub fn collect_photo_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let images = scan_folder(input)?;
            if images.is_empty() {
                return Err(PhotoScopeError::NoImagesFound(input.display().to_string()));
            }
            paths.extend(images);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            return Err(PhotoScopeError::FileNotFound(input.display().to_string()));
        }
    }

    Ok(paths)
}

/// ファイルを読み込んでハンドル化
pub fn load_file_handle(path: &Path) -> Result<FileHandle> {
    if !path.is_file() {
        return Err(PhotoScopeError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(FileHandle::with_guessed_mime(file_name, bytes))
}

pub fn load_file_handles(paths: &[PathBuf]) -> Result<Vec<FileHandle>> {
    paths.iter().map(|p| load_file_handle(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("png"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("pdf"));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_folder_with_images() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("c.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(temp_dir.path().join("a.JPG")).unwrap().write_all(b"dummy").unwrap();
        File::create(temp_dir.path().join("b.png")).unwrap().write_all(b"dummy").unwrap();
        File::create(temp_dir.path().join("readme.txt")).unwrap().write_all(b"text").unwrap();
        fs::create_dir(temp_dir.path().join("sub.jpg")).unwrap();

        let result = scan_folder(temp_dir.path()).unwrap();
        let names: Vec<_> = result
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.jpg"]);
    }

    #[test]
    fn test_collect_keeps_argument_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let folder = temp_dir.path().join("roof");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("r1.jpg"), b"x").unwrap();
        let single = temp_dir.path().join("z.heic");
        fs::write(&single, b"y").unwrap();

        let paths = collect_photo_paths(&[single.clone(), folder.clone()]).unwrap();
        assert_eq!(paths, vec![single, folder.join("r1.jpg")]);
    }

    #[test]
    fn test_collect_empty_folder_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = collect_photo_paths(&[temp_dir.path().to_path_buf()]);
        assert!(matches!(result, Err(PhotoScopeError::NoImagesFound(_))));
    }

    #[test]
    fn test_load_file_handle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("wall.jpeg");
        fs::write(&path, b"jpegbytes").unwrap();

        let handle = load_file_handle(&path).unwrap();
        assert_eq!(handle.file_name(), "wall.jpeg");
        assert_eq!(handle.mime_type(), "image/jpeg");
        assert_eq!(handle.bytes(), b"jpegbytes");
    }
}
