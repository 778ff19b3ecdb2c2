#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage};
use image_compressor_core::{Config, ImageCompressor};
use tempfile::TempDir;

/// A compressor rooted in a fresh temporary directory
pub struct TestEnv {
    pub dir: TempDir,
    pub compressor: ImageCompressor,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage_dir: dir.path().join("stored_images"),
            database_path: dir.path().join("images.db"),
            ..Default::default()
        };
        let compressor = ImageCompressor::new(config).unwrap();
        Self { dir, compressor }
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.dir.path().join("stored_images")
    }

    /// Sorted file names currently in the storage directory
    pub fn stored_file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.storage_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Write a small colour PNG
pub fn create_colour_png(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    RgbImage::from_fn(32, 24, |x, y| {
        Rgb([(x * 8) as u8, (y * 10) as u8, ((x + y) * 4) as u8])
    })
    .save(&path)
    .unwrap();
    path
}

/// Write a small single-channel PNG
pub fn create_gray_png(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    GrayImage::from_fn(16, 16, |x, y| Luma([((x + y) * 8) as u8]))
        .save(&path)
        .unwrap();
    path
}

/// Write a file that is not an image
pub fn create_text_file(dir: &Path, name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(b"NOT AN IMAGE").unwrap();
    path
}

/// Write a colour image of the given size, format taken from the extension
pub fn create_sized_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 9) as u8, 60]))
        .save(&path)
        .unwrap();
    path
}
