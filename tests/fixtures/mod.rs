//! Media fixtures for generation requests

/// A described media sample of a given size.
#[derive(Debug, Clone)]
pub struct MediaFixture {
    pub filename: &'static str,
    pub mime_type: &'static str,
    pub size_bytes: usize,
    pub description: &'static str,
}

pub const PORTRAIT_PNG: MediaFixture = MediaFixture {
    filename: "portrait.png",
    mime_type: "image/png",
    size_bytes: 2 * 1024,
    description: "2KB PNG portrait",
};

pub const VOICE_MP3: MediaFixture = MediaFixture {
    filename: "voice.mp3",
    mime_type: "audio/mpeg",
    size_bytes: 100 * 1024,
    description: "100KB MP3 voice clip",
};

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const ID3_HEADER: [u8; 10] = [b'I', b'D', b'3', 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

impl MediaFixture {
    /// Bytes with the right magic header, padded to `size_bytes`.
    pub fn bytes(&self) -> Vec<u8> {
        let header: &[u8] = if self.mime_type == "image/png" {
            &PNG_SIGNATURE
        } else {
            &ID3_HEADER
        };
        let mut data = header.to_vec();
        data.resize(self.size_bytes, 0x2A);
        data
    }
}
