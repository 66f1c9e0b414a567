//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, Rgba, RgbaImage};
use lookout::application::ScanEngine;
use lookout::application::dto::ScanOptions;
use lookout::domain::repositories::{
    CipherError, FetchError, FetchedImage, ImageFetcher, PasswordCipher, RelayClient,
};
use lookout::domain::services::data_url;
use lookout::infrastructure::cipher::{AesGcmCipher, CipherOptions};
use lookout::infrastructure::dom::DomTree;
use lookout::infrastructure::relay::OverlayRecorder;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Renders `payload` as a QR symbol centred on a square white canvas
pub fn qr_image(payload: &str, canvas: u32) -> RgbaImage {
    let code = qrcode::QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let quiet = 4;
    let module_px = canvas / (modules + 2 * quiet);
    assert!(module_px >= 1, "canvas too small for {payload:?}");

    let symbol = (modules + 2 * quiet) * module_px;
    let origin = (canvas - symbol) / 2 + quiet * module_px;

    let mut img = RgbaImage::from_pixel(canvas, canvas, WHITE);
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let mx = i as u32 % modules;
        let my = i as u32 / modules;
        for dy in 0..module_px {
            for dx in 0..module_px {
                img.put_pixel(origin + mx * module_px + dx, origin + my * module_px + dy, BLACK);
            }
        }
    }
    img
}

pub fn blank_image(side: u32) -> RgbaImage {
    RgbaImage::from_pixel(side, side, WHITE)
}

pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A base64 block that passes the ciphertext heuristic
pub fn ciphertext_like(seed: u8) -> String {
    STANDARD.encode([seed; 48])
}

/// Relay stand-in serving canned images and recording badge updates
#[derive(Default)]
pub struct RecordingRelay {
    images: Mutex<HashMap<String, String>>,
    badges: Mutex<Vec<usize>>,
    fetches: AtomicUsize,
}

impl RecordingRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve_png(&self, url: &str, img: &RgbaImage) {
        self.images
            .lock()
            .insert(url.to_string(), data_url::encode("image/png", &png_bytes(img)));
    }

    pub fn badges(&self) -> Vec<usize> {
        self.badges.lock().clone()
    }

    pub fn last_badge(&self) -> Option<usize> {
        self.badges.lock().last().copied()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelayClient for RecordingRelay {
    async fn fetch_image(&self, url: &str) -> Option<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.images.lock().get(url).cloned()
    }

    fn update_badge(&self, count: usize) {
        self.badges.lock().push(count);
    }
}

/// Fetcher serving canned bytes by URL, 404 otherwise
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.pages.insert(url.to_string(), bytes);
        self
    }
}

#[async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        match self.pages.get(url) {
            Some(bytes) => Ok(FetchedImage {
                bytes: bytes.clone().into(),
                content_type: Some("image/png".to_string()),
            }),
            None => Err(FetchError::Status(404)),
        }
    }
}

/// Everything a scan engine test needs
pub struct EngineHarness {
    pub tree: Arc<DomTree>,
    pub relay: Arc<RecordingRelay>,
    pub overlays: Arc<OverlayRecorder>,
    pub engine: ScanEngine,
}

pub fn engine_harness() -> EngineHarness {
    let tree = Arc::new(DomTree::new());
    let relay = RecordingRelay::new();
    let overlays = Arc::new(OverlayRecorder::new());
    let engine = ScanEngine::new(
        tree.clone(),
        relay.clone(),
        overlays.clone(),
        &ScanOptions::default(),
    );
    EngineHarness {
        tree,
        relay,
        overlays,
        engine,
    }
}

pub fn fast_cipher() -> AesGcmCipher {
    AesGcmCipher::new(CipherOptions::lightweight()).unwrap()
}

/// Cipher wrapper counting calls
pub struct CountingCipher {
    inner: AesGcmCipher,
    pub decrypts: AtomicUsize,
    pub encrypts: AtomicUsize,
}

impl CountingCipher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: fast_cipher(),
            decrypts: AtomicUsize::new(0),
            encrypts: AtomicUsize::new(0),
        })
    }

    pub fn decrypt_count(&self) -> usize {
        self.decrypts.load(Ordering::SeqCst)
    }
}

impl PasswordCipher for CountingCipher {
    fn generate_key(&self) -> String {
        self.inner.generate_key()
    }

    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError> {
        self.encrypts.fetch_add(1, Ordering::SeqCst);
        self.inner.encrypt(plaintext, secret)
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String, CipherError> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        self.inner.decrypt(ciphertext, secret)
    }

    fn envelope_overhead(&self) -> usize {
        self.inner.envelope_overhead()
    }
}
